extern crate ffmpeg_next as ffmpeg;

use ffmpeg::codec::packet::Packet as AvPacket;
use ffmpeg::ffi::AV_TIME_BASE;
use ffmpeg::format::context::Input as AvInput;
use ffmpeg::media::Type as AvMediaType;
use ffmpeg::Error as AvError;

use crate::error::Error;
use crate::location::Location;
use crate::options::Options;

type Result<T> = std::result::Result<T, Error>;

/// Builds a [`Reader`].
///
/// # Example
///
/// ```ignore
/// let options = Options::preset_rtsp_transport_tcp();
/// let reader = ReaderBuilder::new("rtsp://camera.local/stream")
///     .with_options(&options)
///     .build()
///     .unwrap();
/// ```
pub struct ReaderBuilder<'a> {
    source: Location,
    options: Option<&'a Options>,
}

impl<'a> ReaderBuilder<'a> {
    /// Create a new reader with the specified location.
    ///
    /// # Arguments
    ///
    /// * `source` - Source to read.
    pub fn new(source: impl Into<Location>) -> Self {
        Self {
            source: source.into(),
            options: None,
        }
    }

    /// Specify options for the backend.
    ///
    /// # Arguments
    ///
    /// * `options` - Options to pass on to input.
    pub fn with_options(mut self, options: &'a Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Build [`Reader`].
    pub fn build(self) -> Result<Reader> {
        let input = match self.options {
            None => ffmpeg::format::input(&self.source.as_path())?,
            Some(options) => {
                ffmpeg::format::input_with_dictionary(&self.source.as_path(), options.to_dict())?
            }
        };

        Ok(Reader {
            source: self.source,
            input,
        })
    }
}

/// Demuxing reader over a video file or stream.
pub struct Reader {
    pub source: Location,
    pub input: AvInput,
}

impl Reader {
    /// Create a new video reader on a given source (path, URL, etc.).
    ///
    /// # Arguments
    ///
    /// * `source` - Source to read from.
    #[inline]
    pub fn new(source: impl Into<Location>) -> Result<Self> {
        ReaderBuilder::new(source).build()
    }

    /// Read a single packet belonging to the given stream, skipping packets of other streams.
    ///
    /// Returns [`Error::ReadExhausted`] once the input has no more packets.
    ///
    /// # Arguments
    ///
    /// * `stream_index` - Index of stream to read from.
    pub fn read(&mut self, stream_index: usize) -> Result<AvPacket> {
        let mut error_count = 0;
        loop {
            match self.input.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() == stream_index {
                        return Ok(packet);
                    }
                }
                None => {
                    error_count += 1;
                    if error_count > 3 {
                        return Err(Error::ReadExhausted);
                    }
                }
            }
        }
    }

    /// Seek backwards to the closest point at or before the given timestamp. After seeking the
    /// reader head points at a keyframe, so callers must decode forward to reach the exact time.
    ///
    /// # Arguments
    ///
    /// * `timestamp_microseconds` - Position from the start of the input, in microseconds.
    pub fn seek(&mut self, timestamp_microseconds: i64) -> Result<()> {
        tracing::trace!(target: "video_index", timestamp_microseconds, "seek");
        self.input
            .seek(timestamp_microseconds, ..timestamp_microseconds)
            .map_err(Error::BackendError)
    }

    /// Seek to start of reader. This function performs best effort seeking to the start of the
    /// file.
    pub fn seek_to_start(&mut self) -> Result<()> {
        self.input
            .seek(i64::MIN, ..)
            .map_err(Error::BackendError)
    }

    /// Find the best video stream and return the index.
    pub fn best_video_stream_index(&self) -> Result<usize> {
        Ok(self
            .input
            .streams()
            .best(AvMediaType::Video)
            .ok_or(AvError::StreamNotFound)?
            .index())
    }

    /// Duration of the input in seconds, if the container reports one.
    pub fn duration_secs(&self) -> Option<f64> {
        let duration = self.input.duration();
        (duration > 0).then(|| duration as f64 / AV_TIME_BASE as f64)
    }
}

unsafe impl Send for Reader {}
