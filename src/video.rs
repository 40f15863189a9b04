use std::fmt;
use std::time::Duration;

use ndarray::Axis;

use crate::decode::FfmpegSource;
use crate::error::Error;
use crate::frame::{Frame, Frames, CHANNELS};
use crate::location::Location;
use crate::options::Options;
use crate::selector::{Selector, Slice};
use crate::source::{FrameSource, Metadata};

type Result<T> = std::result::Result<T, Error>;

/// What a slice read does when one of its frames fails to decode. A slice read never returns a
/// partial result.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Stop at the first failing frame and return its [`Error::Decode`].
    #[default]
    AbortOnFirst,
    /// Decode every selected frame, then return [`Error::Batch`] with all failures if any frame
    /// failed.
    CollectAll,
}

/// Result of [`Video::get`]: one frame for an index, a stack of frames for a slice.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Frame(Frame),
    Frames(Frames),
}

impl Selection {
    /// The single frame, if an index was selected.
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            Selection::Frame(frame) => Some(frame),
            Selection::Frames(_) => None,
        }
    }

    /// The stack of frames, if a slice was selected.
    pub fn into_frames(self) -> Option<Frames> {
        match self {
            Selection::Frame(_) => None,
            Selection::Frames(frames) => Some(frames),
        }
    }
}

/// Builds a [`Video`].
///
/// # Example
///
/// ```ignore
/// let options = Options::preset_rtsp_transport_tcp();
/// let video = VideoBuilder::new("rtsp://camera.local/stream")
///     .with_options(&options)
///     .with_batch_policy(BatchPolicy::CollectAll)
///     .build()
///     .unwrap();
/// ```
pub struct VideoBuilder<'a> {
    source: Location,
    options: Option<&'a Options>,
    batch_policy: BatchPolicy,
}

impl<'a> VideoBuilder<'a> {
    /// Create a builder for the video at `source`.
    pub fn new(source: impl Into<Location>) -> Self {
        Self {
            source: source.into(),
            options: None,
            batch_policy: BatchPolicy::default(),
        }
    }

    /// Specify input options for the backend.
    pub fn with_options(mut self, options: &'a Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Specify how slice reads react to frames that fail to decode.
    pub fn with_batch_policy(mut self, batch_policy: BatchPolicy) -> Self {
        self.batch_policy = batch_policy;
        self
    }

    /// Open the video and read its metadata.
    pub fn build(self) -> Result<Video> {
        let source = FfmpegSource::open(self.source.clone(), self.options).map_err(|err| {
            tracing::warn!(
                target: "video_index",
                source = %self.source,
                %err,
                "failed to open video"
            );
            Error::Open {
                source: self.source.clone(),
                reason: err.to_string(),
            }
        })?;

        let mut video = Video::from_source(self.source, source);
        video.batch_policy = self.batch_policy;
        Ok(video)
    }
}

/// Random access to the frames of a video, as if it were an array of shape
/// `(frames, height, width, 3)`.
///
/// Frames are decoded on demand and returned in RGB order. Nothing is cached: reading the same
/// frame twice decodes it twice.
///
/// A `Video` holds a single decoder, and every read moves its read position, so reads take
/// `&mut self`. To decode from several threads at once, open one `Video` per thread.
///
/// # Example
///
/// ```ignore
/// let mut video = Video::new(Path::new("video.mp4")).unwrap();
/// let first = video.read_frame(0).unwrap();
/// let some = video.slice(10..20).unwrap();
/// assert_eq!(some.dim(), (10, video.height(), video.width(), 3));
/// video.close().unwrap();
/// ```
pub struct Video {
    source: Location,
    metadata: Metadata,
    batch_policy: BatchPolicy,
    inner: Option<Box<dyn FrameSource>>,
}

impl Video {
    /// Open the video at `source` with default settings.
    #[inline]
    pub fn new(source: impl Into<Location>) -> Result<Self> {
        VideoBuilder::new(source).build()
    }

    /// Wrap an already opened frame source. Metadata is read from the source once, here.
    ///
    /// # Arguments
    ///
    /// * `location` - Where the frames come from, used for display only.
    /// * `source` - Source to take ownership of.
    pub fn from_source(
        location: impl Into<Location>,
        source: impl FrameSource + 'static,
    ) -> Self {
        let location = location.into();
        let metadata = source.metadata();
        tracing::info!(
            target: "video_index",
            source = %location,
            frames = metadata.frame_count,
            fps = metadata.fps,
            width = metadata.width,
            height = metadata.height,
            "opened video"
        );

        Self {
            source: location,
            metadata,
            batch_policy: BatchPolicy::default(),
            inner: Some(Box::new(source)),
        }
    }

    /// Decode the frame at `index`.
    ///
    /// # Arguments
    ///
    /// * `index` - Frame index, must be in `[0, len)`.
    ///
    /// # Return value
    ///
    /// The frame with dims `(height, width, 3)` in RGB order. Fails with [`Error::Closed`] after
    /// [`Video::close`], [`Error::Index`] for an index outside of `[0, len)` and
    /// [`Error::Decode`] if the frame could not be decoded.
    pub fn read_frame(&mut self, index: i64) -> Result<Frame> {
        if self.inner.is_none() {
            return Err(Error::Closed);
        }
        match usize::try_from(index) {
            Ok(resolved) if resolved < self.len() => self.read_resolved(resolved),
            _ => Err(Error::Index {
                index,
                len: self.len(),
            }),
        }
    }

    /// Select a single frame or a slice of frames.
    ///
    /// A negative index counts from the end, so `-1` is the last frame. Slices follow Python
    /// slicing: bounds are clamped instead of rejected and an empty selection yields an empty
    /// stack of shape `(0, height, width, 3)`.
    pub fn get(&mut self, selector: impl Into<Selector>) -> Result<Selection> {
        if self.inner.is_none() {
            return Err(Error::Closed);
        }
        match selector.into() {
            Selector::Index(index) => self.frame(index).map(Selection::Frame),
            Selector::Slice(slice) => self.slice(slice).map(Selection::Frames),
        }
    }

    /// Like [`Video::read_frame`], but a negative index counts from the end.
    pub fn frame(&mut self, index: i64) -> Result<Frame> {
        if index < 0 {
            let from_end = index.checked_add(self.len() as i64).filter(|i| *i >= 0);
            match from_end {
                Some(resolved) => self.read_frame(resolved),
                None if self.inner.is_none() => Err(Error::Closed),
                None => Err(Error::Index {
                    index,
                    len: self.len(),
                }),
            }
        } else {
            self.read_frame(index)
        }
    }

    /// Decode the frames selected by `slice` into a single array of dims
    /// `(n, height, width, 3)`.
    pub fn slice(&mut self, slice: impl Into<Slice>) -> Result<Frames> {
        if self.inner.is_none() {
            return Err(Error::Closed);
        }
        let resolved = slice.into().resolve(self.len())?;

        let mut frames = Frames::zeros((resolved.len(), self.height(), self.width(), CHANNELS));
        let mut failures = Vec::new();
        for (position, index) in resolved.indices().enumerate() {
            match self.read_resolved(index) {
                Ok(frame) => frames.index_axis_mut(Axis(0), position).assign(&frame),
                Err(err) => match self.batch_policy {
                    BatchPolicy::AbortOnFirst => return Err(err),
                    BatchPolicy::CollectAll => failures.push(err),
                },
            }
        }

        if failures.is_empty() {
            Ok(frames)
        } else {
            Err(Error::Batch(failures))
        }
    }

    /// Decode the entire video into one array of dims `(len, height, width, 3)`.
    ///
    /// This holds every frame in memory at once. For long or large videos prefer
    /// [`Video::frames`] or [`Video::slice`].
    pub fn data(&mut self) -> Result<Frames> {
        self.slice(Slice::full())
    }

    /// Iterate over all frames in order, decoding one frame per step.
    pub fn frames(&mut self) -> FrameIter<'_> {
        FrameIter {
            video: self,
            next: 0,
        }
    }

    /// Number of frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.metadata.frame_count
    }

    /// Whether the video has no frames.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape of the whole video as an array: `(frames, height, width, channels)`.
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (self.len(), self.height(), self.width(), self.channels())
    }

    /// Where the video was opened from.
    pub fn source(&self) -> &Location {
        &self.source
    }

    /// Frames per second.
    pub fn fps(&self) -> f64 {
        self.metadata.fps
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.metadata.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> usize {
        self.metadata.height
    }

    /// Number of color channels per pixel. Always 3.
    pub fn channels(&self) -> usize {
        CHANNELS
    }

    /// Duration derived from frame count and frame rate. Zero if the frame rate is unknown.
    pub fn duration(&self) -> Duration {
        if self.fps() > 0.0 {
            Duration::from_secs_f64(self.len() as f64 / self.fps())
        } else {
            Duration::ZERO
        }
    }

    /// How slice reads react to frames that fail to decode.
    pub fn batch_policy(&self) -> BatchPolicy {
        self.batch_policy
    }

    /// Whether [`Video::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Release the decoder. Every read afterwards fails with [`Error::Closed`], and so does a
    /// second call to `close`. Metadata accessors keep working.
    pub fn close(&mut self) -> Result<()> {
        match self.inner.take() {
            Some(source) => {
                drop(source);
                tracing::debug!(target: "video_index", source = %self.source, "closed video");
                Ok(())
            }
            None => Err(Error::Closed),
        }
    }

    /// Read a bounds-checked index and reorder its channels to RGB.
    fn read_resolved(&mut self, index: usize) -> Result<Frame> {
        let expected = (self.height(), self.width(), CHANNELS);
        let source = self.inner.as_mut().ok_or(Error::Closed)?;

        let frame = source.read(index).map_err(|err| {
            tracing::warn!(target: "video_index", index, %err, "failed to decode frame");
            Error::Decode {
                index,
                reason: err.to_string(),
            }
        })?;

        if frame.dim() != expected {
            tracing::warn!(
                target: "video_index",
                index,
                dim = ?frame.dim(),
                expected = ?expected,
                "decoded frame has unexpected dimensions"
            );
            return Err(Error::Decode {
                index,
                reason: format!(
                    "frame has dimensions {:?}, expected {:?}",
                    frame.dim(),
                    expected
                ),
            });
        }

        Ok(source.channel_order().to_rgb(frame))
    }
}

impl fmt::Debug for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Video({},{:.1},{},{},{},{})",
            self.source,
            self.fps(),
            self.len(),
            self.height(),
            self.width(),
            self.channels(),
        )
    }
}

impl fmt::Display for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Video named {}, {:.1} FPS, {} frames, {} height, {} width and {} colors",
            self.source,
            self.fps(),
            self.len(),
            self.height(),
            self.width(),
            self.channels(),
        )
    }
}

/// Iterator over all frames of a [`Video`], created by [`Video::frames`].
///
/// Yields an error for every frame that fails to decode and keeps going. After the video is
/// closed it yields a single [`Error::Closed`] and stops.
pub struct FrameIter<'a> {
    video: &'a mut Video,
    next: usize,
}

impl Iterator for FrameIter<'_> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.video.len() {
            return None;
        }
        if self.video.is_closed() {
            self.next = self.video.len();
            return Some(Err(Error::Closed));
        }

        let index = self.next;
        self.next += 1;
        Some(self.video.read_resolved(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.video.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}
