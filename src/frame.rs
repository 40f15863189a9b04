extern crate ffmpeg_next as ffmpeg;

use ffmpeg::util::format::Pixel as AvPixel;
use ndarray::{s, Array3, Array4};

/// A single decoded frame as `ndarray` with dims `(H, W, C)`, in RGB order.
pub type Frame = Array3<u8>;

/// A stack of frames as `ndarray` with dims `(N, H, W, C)`, in RGB order.
pub type Frames = Array4<u8>;

/// Number of color channels in every frame.
pub const CHANNELS: usize = 3;

/// Pixel format the ffmpeg scaler produces. Packed BGR, which is what `FfmpegSource` reports as
/// its native channel order.
pub(crate) const FRAME_PIXEL_FORMAT: AvPixel = AvPixel::BGR24;

/// Order of the color samples in a frame as produced by a frame source.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

impl ChannelOrder {
    /// Reorder the channels of `frame` from `self` to RGB.
    pub fn to_rgb(self, frame: Frame) -> Frame {
        match self {
            ChannelOrder::Rgb => frame,
            ChannelOrder::Bgr => reverse_channels(&frame),
        }
    }
}

/// Reverse the channel axis of a frame, such that BGR becomes RGB and vice versa.
pub fn reverse_channels(frame: &Frame) -> Frame {
    frame
        .slice(s![.., .., ..;-1])
        .as_standard_layout()
        .into_owned()
}
