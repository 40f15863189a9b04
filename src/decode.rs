extern crate ffmpeg_next as ffmpeg;

use ffmpeg::codec::context::Context as AvContext;
use ffmpeg::codec::decoder::Video as AvDecoder;
use ffmpeg::software::scaling::context::Context as AvScaler;
use ffmpeg::software::scaling::flag::Flags as AvScalerFlags;
use ffmpeg::util::error::EAGAIN;
use ffmpeg::util::format::Pixel as AvPixel;
use ffmpeg::util::frame::video::Video as AvFrame;
use ffmpeg::Error as AvError;
use ffmpeg::Rational as AvRational;

use crate::error::Error;
use crate::ffi::convert_frame_to_ndarray_packed24;
use crate::frame::{ChannelOrder, Frame, FRAME_PIXEL_FORMAT};
use crate::io::{Reader, ReaderBuilder};
use crate::location::Location;
use crate::options::Options;
use crate::source::{FrameSource, Metadata};

type Result<T> = std::result::Result<T, Error>;

/// Frame source that decodes the best video stream of a file or network resource with ffmpeg.
///
/// Frames are converted to packed BGR by a software scaler, so [`FrameSource::channel_order`]
/// is always [`ChannelOrder::Bgr`].
pub struct FfmpegSource {
    reader: Reader,
    reader_stream_index: usize,
    decoder: AvDecoder,
    scaler: AvScaler,
    stream_time_base: AvRational,
    start_pts: i64,
    metadata: Metadata,
    /// Index of the frame the decoder produces next, if known. `None` forces a seek.
    next_index: Option<usize>,
    /// Frames decoded since the last seek to the start, used when timestamps are unusable.
    decoded_since_start: Option<usize>,
    /// Cleared once a decoded frame turns out to have no timestamp. Every later seek then
    /// restarts from the beginning and counts frames.
    timestamped: bool,
    draining: bool,
}

impl FfmpegSource {
    /// Open a source for the specified location.
    ///
    /// # Arguments
    ///
    /// * `source` - Location of the video.
    /// * `options` - Optional input options passed on to ffmpeg.
    pub fn open(source: impl Into<Location>, options: Option<&Options>) -> Result<Self> {
        let mut reader_builder = ReaderBuilder::new(source);
        if let Some(options) = options {
            reader_builder = reader_builder.with_options(options);
        }
        Self::from_reader(reader_builder.build()?)
    }

    /// Create a source from a [`Reader`]. Picks the best video stream, opens its decoder and
    /// reads the static metadata.
    pub fn from_reader(reader: Reader) -> Result<Self> {
        let reader_stream_index = reader.best_video_stream_index()?;
        let (decoder, stream_time_base, start_pts, fps, stream_frames, stream_duration) = {
            let stream = reader
                .input
                .stream(reader_stream_index)
                .ok_or(AvError::StreamNotFound)?;

            let fps = rational_to_f64(stream.avg_frame_rate())
                .or_else(|| rational_to_f64(stream.rate()))
                .unwrap_or(0.0);
            let start_pts = match stream.start_time() {
                i64::MIN => 0,
                start_time => start_time,
            };
            let stream_duration = match stream.duration() {
                duration if duration > 0 => {
                    rational_to_f64(stream.time_base()).map(|tb| duration as f64 * tb)
                }
                _ => None,
            };

            let decoder = AvContext::from_parameters(stream.parameters())?
                .decoder()
                .video()?;

            (
                decoder,
                stream.time_base(),
                start_pts,
                fps,
                stream.frames(),
                stream_duration,
            )
        };

        if decoder.format() == AvPixel::None || decoder.width() == 0 || decoder.height() == 0 {
            return Err(Error::MissingCodecParameters);
        }

        let frame_count = if stream_frames > 0 {
            stream_frames as usize
        } else {
            stream_duration
                .or_else(|| reader.duration_secs())
                .map(|secs| (secs * fps + 0.5) as usize)
                .unwrap_or(0)
        };

        let scaler = AvScaler::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            FRAME_PIXEL_FORMAT,
            decoder.width(),
            decoder.height(),
            AvScalerFlags::AREA,
        )?;

        let metadata = Metadata {
            frame_count,
            fps,
            width: decoder.width() as usize,
            height: decoder.height() as usize,
        };

        tracing::debug!(
            target: "video_index",
            source = %reader.source,
            stream = reader_stream_index,
            frame_count,
            fps,
            width = metadata.width,
            height = metadata.height,
            "opened ffmpeg source"
        );

        Ok(Self {
            reader,
            reader_stream_index,
            decoder,
            scaler,
            stream_time_base,
            start_pts,
            metadata,
            next_index: Some(0),
            decoded_since_start: Some(0),
            timestamped: true,
            draining: false,
        })
    }

    /// Reposition the reader such that decoding forward eventually reaches `index`.
    fn seek_to(&mut self, index: usize) -> Result<()> {
        let fps = self.metadata.fps;
        if index == 0 || fps <= 0.0 || !self.timestamped {
            self.reader.seek_to_start()?;
            self.decoded_since_start = Some(0);
        } else {
            let time_base = rational_to_f64(self.stream_time_base).unwrap_or(0.0);
            let start_secs = self.start_pts as f64 * time_base;
            let target_secs = start_secs + index as f64 / fps;
            self.reader.seek((target_secs * 1_000_000.0) as i64)?;
            self.decoded_since_start = None;
        }

        self.decoder.flush();
        self.draining = false;
        Ok(())
    }

    /// Decode the next frame in presentation order. Drains the decoder once the input is
    /// exhausted and returns [`Error::ReadExhausted`] when nothing is left.
    fn decode_next(&mut self) -> Result<AvFrame> {
        loop {
            if let Some(frame) = self.decoder_receive_frame()? {
                return Ok(frame);
            }
            if self.draining {
                return Err(Error::ReadExhausted);
            }

            match self.reader.read(self.reader_stream_index) {
                Ok(packet) => self.decoder.send_packet(&packet)?,
                Err(Error::ReadExhausted) => {
                    self.decoder.send_eof()?;
                    self.draining = true;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Pull a decoded frame from the decoder. `EAGAIN` and end-of-stream both yield `None`.
    fn decoder_receive_frame(&mut self) -> Result<Option<AvFrame>> {
        let mut frame = AvFrame::empty();
        match self.decoder.receive_frame(&mut frame) {
            Ok(()) => Ok(Some(frame)),
            Err(AvError::Other { errno }) if errno == EAGAIN => Ok(None),
            Err(AvError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Presentation index of a decoded frame, derived from its timestamp. Falls back to counting
    /// frames from the start of the stream when there is no usable timestamp.
    fn frame_index(&self, frame: &AvFrame) -> Option<usize> {
        let timestamp = frame.timestamp().or_else(|| frame.pts());
        match (timestamp, rational_to_f64(self.stream_time_base)) {
            (Some(pts), Some(time_base)) if self.metadata.fps > 0.0 => {
                let secs = (pts - self.start_pts) as f64 * time_base;
                Some((secs * self.metadata.fps).round().max(0.0) as usize)
            }
            _ => self.decoded_since_start,
        }
    }

    fn convert(&mut self, frame: &AvFrame) -> Result<Frame> {
        let mut frame_scaled = AvFrame::empty();
        self.scaler
            .run(frame, &mut frame_scaled)
            .map_err(Error::BackendError)?;
        convert_frame_to_ndarray_packed24(&mut frame_scaled).map_err(Error::BackendError)
    }

    fn read_at(&mut self, index: usize) -> Result<Frame> {
        if self.next_index != Some(index) {
            tracing::trace!(target: "video_index", index, next = ?self.next_index, "repositioning");
            self.seek_to(index)?;
        }

        loop {
            let frame = self.decode_next()?;
            let frame_index = self.frame_index(&frame);
            if let Some(count) = self.decoded_since_start.as_mut() {
                *count += 1;
            }

            match landing(frame_index, index) {
                Landing::Before => continue,
                Landing::On => self.next_index = Some(index + 1),
                Landing::Past(frame_index) => {
                    // Happens when the stream has no frame with this exact timestamp.
                    tracing::debug!(
                        target: "video_index",
                        index,
                        frame_index,
                        "decoder landed past requested frame"
                    );
                    self.next_index = Some(frame_index + 1);
                }
                Landing::Unknown => {
                    tracing::debug!(
                        target: "video_index",
                        index,
                        "decoded frame has no timestamp, counting from start"
                    );
                    self.timestamped = false;
                    self.seek_to(0)?;
                    continue;
                }
            }

            return self.convert(&frame);
        }
    }
}

impl FrameSource for FfmpegSource {
    fn metadata(&self) -> Metadata {
        self.metadata
    }

    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Bgr
    }

    fn read(&mut self, index: usize) -> Result<Frame> {
        let result = self.read_at(index);
        if result.is_err() {
            // Decoder state is unknown after a failure.
            self.next_index = None;
        }
        result
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        // Maximum number of invocations to `decoder_receive_frame` to drain the items still on
        // the queue before giving up.
        const MAX_DRAIN_ITERATIONS: u32 = 100;

        if let Ok(()) = self.decoder.send_eof() {
            for _ in 0..MAX_DRAIN_ITERATIONS {
                if !matches!(self.decoder_receive_frame(), Ok(Some(_))) {
                    break;
                }
            }
        }
    }
}

unsafe impl Send for FfmpegSource {}

/// Position of a decoded frame relative to the frame being read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Landing {
    Before,
    On,
    Past(usize),
    /// The frame index cannot be told, neither from a timestamp nor by counting.
    Unknown,
}

fn landing(frame_index: Option<usize>, target: usize) -> Landing {
    match frame_index {
        Some(frame_index) if frame_index < target => Landing::Before,
        Some(frame_index) if frame_index > target => Landing::Past(frame_index),
        Some(_) => Landing::On,
        None => Landing::Unknown,
    }
}

/// Convert a rational to floating point. `None` for zero or invalid rationals.
fn rational_to_f64(rational: AvRational) -> Option<f64> {
    if rational.numerator() > 0 && rational.denominator() > 0 {
        Some(rational.numerator() as f64 / rational.denominator() as f64)
    } else {
        None
    }
}
