//! Random-access, array-like indexing over video files.
//!
//! A [`Video`] behaves like a read-only array of shape `(frames, height, width, 3)`: frames are
//! addressed by index or slice and decoded on demand with ffmpeg, and are returned as RGB
//! [`ndarray`] arrays.
//!
//! ```ignore
//! video_index::init()?;
//!
//! let mut video = video_index::Video::new(std::path::Path::new("video.mp4"))?;
//! let last = video.frame(-1)?;
//! let every_other = video.slice(video_index::Slice::new(None, None, Some(2)))?;
//! video.close()?;
//! ```

mod decode;
mod error;
mod ffi;
mod frame;
mod init;
mod io;
mod location;
mod options;
mod selector;
mod source;
mod video;

pub use decode::FfmpegSource;
pub use error::Error;
pub use frame::{reverse_channels, ChannelOrder, Frame, Frames, CHANNELS};
pub use init::init;
pub use io::{Reader, ReaderBuilder};
pub use location::{Location, Url};
pub use options::Options;
pub use selector::{ResolvedSlice, Selector, Slice};
pub use source::{FrameSource, Metadata};
pub use video::{BatchPolicy, FrameIter, Selection, Video, VideoBuilder};
