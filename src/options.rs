extern crate ffmpeg_next as ffmpeg;

use std::collections::HashMap;

use ffmpeg::Dictionary as AvDictionary;

/// A wrapper type for ffmpeg input options, passed on when a video is opened.
#[derive(Debug, Clone)]
pub struct Options(AvDictionary<'static>);

impl Options {
    /// Creates options such that ffmpeg will prefer TCP transport when reading RTSP stream (over
    /// the default UDP format).
    ///
    /// This sets the `rtsp_transport` to `tcp` in ffmpeg options.
    pub fn preset_rtsp_transport_tcp() -> Self {
        let mut opts = AvDictionary::new();
        opts.set("rtsp_transport", "tcp");

        Self(opts)
    }

    /// Creates options that limit how much of the input ffmpeg probes before reporting stream
    /// metadata. Opening becomes faster at the cost of less accurate frame rate and frame count
    /// estimates for containers that do not store them.
    pub fn preset_probe_small() -> Self {
        let mut opts = AvDictionary::new();
        opts.set("probesize", "32768");
        opts.set("analyzeduration", "0");

        Self(opts)
    }

    /// Set a single option.
    pub fn set(&mut self, key: &str, value: &str) {
        self.0.set(key, value);
    }

    /// Get a single option, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)
    }

    /// Convert back to ffmpeg native dictionary, which can be used with `ffmpeg_next` functions.
    pub(crate) fn to_dict(&self) -> AvDictionary {
        self.0.clone()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self(AvDictionary::new())
    }
}

impl From<HashMap<String, String>> for Options {
    /// Converts from `HashMap` to `Options`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut my_opts = HashMap::new();
    /// my_opts.insert("rtsp_transport".to_string(), "tcp".to_string());
    ///
    /// let opts: Options = my_opts.into();
    /// ```
    fn from(item: HashMap<String, String>) -> Self {
        let mut opts = AvDictionary::new();
        for (k, v) in item {
            opts.set(&k, &v);
        }

        Self(opts)
    }
}

impl From<Options> for HashMap<String, String> {
    fn from(item: Options) -> Self {
        item.0
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

unsafe impl Send for Options {}
unsafe impl Sync for Options {}
