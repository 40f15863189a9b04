use std::path::{Path, PathBuf};

/// Re-export [`url::Url`] since it is an input type for callers of the API.
pub use url::Url;

/// Where a video is read from: a file on disk or a network resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    File {
        /// Path to underlying file.
        path: PathBuf,
    },
    Network {
        /// URL pointing to network stream.
        url: Url,
    },
}

impl Location {
    /// Coerce underlying location to a path.
    ///
    /// Network locations produce a path holding the URL text, which is how ffmpeg expects to
    /// receive them.
    pub fn as_path(&self) -> &Path {
        match self {
            Location::File { path } => path.as_path(),
            Location::Network { url } => Path::new(url.as_str()),
        }
    }

    /// Parse a location from text. Anything that parses as a URL with a scheme of more than one
    /// character is a network location (single-letter schemes are Windows drive letters),
    /// `file://` URLs become paths, and everything else is taken as a path verbatim.
    pub fn parse(text: &str) -> Location {
        match Url::parse(text) {
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Location::File { path },
                Err(()) => Location::File {
                    path: PathBuf::from(text),
                },
            },
            Ok(url) if url.scheme().len() > 1 => Location::Network { url },
            _ => Location::File {
                path: PathBuf::from(text),
            },
        }
    }
}

impl From<PathBuf> for Location {
    fn from(value: PathBuf) -> Location {
        Location::File { path: value }
    }
}

impl From<&Path> for Location {
    fn from(value: &Path) -> Location {
        Location::File {
            path: value.to_path_buf(),
        }
    }
}

impl From<&PathBuf> for Location {
    fn from(value: &PathBuf) -> Location {
        Location::File {
            path: value.clone(),
        }
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Location {
        Location::parse(value)
    }
}

impl From<String> for Location {
    fn from(value: String) -> Location {
        Location::parse(&value)
    }
}

impl From<Url> for Location {
    fn from(value: Url) -> Location {
        Location::Network { url: value }
    }
}

impl From<&Url> for Location {
    fn from(value: &Url) -> Location {
        Location::Network { url: value.clone() }
    }
}

impl From<&Location> for Location {
    fn from(value: &Location) -> Location {
        value.clone()
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::File { path } => write!(f, "{}", path.display()),
            Location::Network { url } => write!(f, "{url}"),
        }
    }
}
