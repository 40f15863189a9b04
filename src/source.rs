use crate::error::Error;
use crate::frame::{ChannelOrder, Frame};

type Result<T> = std::result::Result<T, Error>;

/// Static properties of a video, read once when it is opened.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Metadata {
    pub frame_count: usize,
    pub fps: f64,
    pub width: usize,
    pub height: usize,
}

/// Anything that can produce decoded frames by index.
///
/// [`crate::Video`] owns exactly one source and takes care of bounds checking, channel
/// reordering and slicing. Implementations only need to position themselves on the requested
/// frame and decode it.
pub trait FrameSource: Send {
    /// Static metadata. Must not change over the lifetime of the source.
    fn metadata(&self) -> Metadata;

    /// Channel order of the frames returned by [`FrameSource::read`].
    fn channel_order(&self) -> ChannelOrder;

    /// Decode the frame at `index`. Only called with `index < metadata().frame_count`.
    ///
    /// The returned frame has dims `(height, width, 3)` in [`FrameSource::channel_order`].
    fn read(&mut self, index: usize) -> Result<Frame>;
}
