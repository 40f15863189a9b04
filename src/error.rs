extern crate ffmpeg_next as ffmpeg;

use std::error;
use std::fmt;

use ffmpeg::Error as FfmpegError;

use crate::location::Location;

/// Represents video indexing errors. Some errors are generated by the ffmpeg backend, and are
/// wrapped in `BackendError`.
#[derive(Debug, Clone)]
pub enum Error {
    /// The video could not be opened.
    Open { source: Location, reason: String },
    /// A frame index outside of `[0, len)` was requested.
    Index { index: i64, len: usize },
    /// The frame at a valid index could not be decoded.
    Decode { index: usize, reason: String },
    /// Every decode failure of a slice read (see `BatchPolicy::CollectAll`).
    Batch(Vec<Error>),
    /// The video handle was closed.
    Closed,
    /// Slice step was zero.
    InvalidStep,
    ReadExhausted,
    MissingCodecParameters,
    BackendError(FfmpegError),
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Open { .. } => None,
            Error::Index { .. } => None,
            Error::Decode { .. } => None,
            Error::Batch(ref errors) => errors
                .first()
                .map(|err| err as &(dyn error::Error + 'static)),
            Error::Closed => None,
            Error::InvalidStep => None,
            Error::ReadExhausted => None,
            Error::MissingCodecParameters => None,
            Error::BackendError(ref internal) => Some(internal),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Open {
                ref source,
                ref reason,
            } => write!(f, "failed to open video {source}: {reason}"),
            Error::Index { index, len } => {
                write!(f, "index {index} is out of range of [0,{len})")
            }
            Error::Decode { index, ref reason } => {
                write!(f, "frame {index} is corrupted: {reason}")
            }
            Error::Batch(ref errors) => {
                write!(f, "{} frame(s) failed to decode", errors.len())?;
                for err in errors {
                    write!(f, "; {err}")?;
                }
                Ok(())
            }
            Error::Closed => write!(f, "video handle is closed"),
            Error::InvalidStep => write!(f, "slice step cannot be zero"),
            Error::ReadExhausted => write!(f, "stream exhausted"),
            Error::MissingCodecParameters => write!(f, "codec parameters missing"),
            Error::BackendError(ref internal) => internal.fmt(f),
        }
    }
}

impl From<FfmpegError> for Error {
    fn from(internal: FfmpegError) -> Error {
        Error::BackendError(internal)
    }
}
