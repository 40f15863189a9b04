extern crate ffmpeg_next as ffmpeg;

use ffmpeg::util::frame::video::Video as AvFrame;
use ffmpeg::Error;

use ffmpeg::ffi::*;

use crate::frame::{Frame, CHANNELS};

/// Converts a packed 24-bit video `AVFrame` (`RGB24` or `BGR24`) produced by ffmpeg to an
/// `ndarray`. Samples are copied as-is, so the channel order of the result is the channel order
/// of the frame.
///
/// # Arguments
///
/// * `frame` - Video frame to convert.
///
/// # Return value
///
/// A three-dimensional `ndarray` with dimensions `(H, W, C)` and type byte.
pub fn convert_frame_to_ndarray_packed24(frame: &mut AvFrame) -> Result<Frame, Error> {
    unsafe {
        let frame_ptr = frame.as_mut_ptr();
        let frame_width: i32 = (*frame_ptr).width;
        let frame_height: i32 = (*frame_ptr).height;
        let frame_format =
            std::mem::transmute::<std::ffi::c_int, AVPixelFormat>((*frame_ptr).format);
        if frame_format != AVPixelFormat::AV_PIX_FMT_RGB24
            && frame_format != AVPixelFormat::AV_PIX_FMT_BGR24
        {
            return Err(Error::InvalidData);
        }

        let mut frame_array =
            Frame::default((frame_height as usize, frame_width as usize, CHANNELS));

        let bytes_copied = av_image_copy_to_buffer(
            frame_array.as_mut_ptr(),
            frame_array.len() as i32,
            (*frame_ptr).data.as_ptr() as *const *const u8,
            (*frame_ptr).linesize.as_ptr(),
            frame_format,
            frame_width,
            frame_height,
            1,
        );

        if bytes_copied == frame_array.len() as i32 {
            Ok(frame_array)
        } else {
            Err(Error::from(bytes_copied))
        }
    }
}

/// Initialize the logging handler. This will redirect all ffmpeg logging to the Rust `tracing`
/// crate and any subscribers to it.
pub fn init_logging() {
    unsafe {
        av_log_set_callback(Some(log_callback));
    }
}

/// Whether an ffmpeg log message at `level_no` would be recorded by any `tracing` subscriber.
/// `AV_LOG_QUIET` and unknown levels never are.
fn event_would_log(level_no: std::ffi::c_int) -> bool {
    match level_no {
        AV_LOG_PANIC | AV_LOG_FATAL | AV_LOG_ERROR => {
            tracing::enabled!(target: "ffmpeg", tracing::Level::ERROR)
        }
        AV_LOG_WARNING => tracing::enabled!(target: "ffmpeg", tracing::Level::WARN),
        AV_LOG_INFO => tracing::enabled!(target: "ffmpeg", tracing::Level::INFO),
        // There is no "verbose" in `tracing`.
        AV_LOG_VERBOSE | AV_LOG_DEBUG => {
            tracing::enabled!(target: "ffmpeg", tracing::Level::DEBUG)
        }
        AV_LOG_TRACE => tracing::enabled!(target: "ffmpeg", tracing::Level::TRACE),
        _ => false,
    }
}

fn emit(level_no: std::ffi::c_int, line: &str) {
    match level_no {
        AV_LOG_PANIC | AV_LOG_FATAL | AV_LOG_ERROR => {
            tracing::error!(target: "ffmpeg", "{}", line)
        }
        AV_LOG_WARNING => tracing::warn!(target: "ffmpeg", "{}", line),
        AV_LOG_INFO => tracing::info!(target: "ffmpeg", "{}", line),
        AV_LOG_VERBOSE | AV_LOG_DEBUG => tracing::debug!(target: "ffmpeg", "{}", line),
        AV_LOG_TRACE => tracing::trace!(target: "ffmpeg", "{}", line),
        _ => {}
    }
}

/// C-style callback that receives all log messages from ffmpeg and re-emits them through
/// `tracing` under the `ffmpeg` target.
///
/// # Arguments
///
/// * `avcl` - Internal struct with log message data.
/// * `level_no` - Log message level integer.
/// * `fmt` - Log message format string.
/// * `vl` - Variable list with format string items.
unsafe extern "C" fn log_callback(
    avcl: *mut std::ffi::c_void,
    level_no: std::ffi::c_int,
    fmt: *const std::ffi::c_char,
    #[cfg(all(target_arch = "x86_64", target_family = "unix"))] vl: *mut __va_list_tag,
    #[cfg(not(all(target_arch = "x86_64", target_family = "unix")))] vl: va_list,
) {
    if !event_would_log(level_no) {
        return;
    }

    // 1024 bytes is what ffmpeg uses for its own log lines. Longer lines are truncated.
    let mut line = [0; 1024];
    let mut print_prefix: std::ffi::c_int = 1;
    let ret = av_log_format_line2(
        avcl,
        level_no,
        fmt,
        vl,
        line.as_mut_ptr(),
        line.len() as std::ffi::c_int,
        &mut print_prefix as *mut std::ffi::c_int,
    );
    if ret <= 0 {
        return;
    }

    let Ok(line) = std::ffi::CStr::from_ptr(line.as_ptr()).to_str() else {
        return;
    };
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    emit(level_no, line);
}
