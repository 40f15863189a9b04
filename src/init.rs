extern crate ffmpeg_next as ffmpeg;

use crate::error::Error;
use crate::ffi::init_logging;

/// Initialize global ffmpeg settings and redirect ffmpeg's own log output to `tracing` (under
/// the `ffmpeg` target).
///
/// Calling this is optional: videos open without it, but ffmpeg will then print its messages
/// to stderr directly.
pub fn init() -> Result<(), Error> {
    ffmpeg::init().map_err(Error::BackendError)?;

    init_logging();

    Ok(())
}
