pub mod obj;

#[cfg(feature = "stl-io")]
pub mod stl;

/// Generic I/O and format‑conversion errors.
///
/// Image decoding is behind the `image-io` feature flag.
/// When the feature is disabled the corresponding variant does not exist.
#[derive(Debug)]
pub enum IoError {
    StdIo(std::io::Error),

    MalformedInput(String),
    MalformedPath(String),

    /// Error bubbled up from `serde_json` while reading weights or feature tensors.
    Json(serde_json::Error),
    /// Error bubbled up from `toml` while reading a run configuration.
    Toml(toml::de::Error),

    #[cfg(feature = "image-io")]
    /// Error bubbled up from the `image` crate during decoding.
    Image(::image::ImageError),
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use IoError::*;

        match self {
            StdIo(error) => write!(f, "std::io::Error: {error}"),

            MalformedInput(msg) => write!(f, "Input is malformed: {msg}"),
            MalformedPath(msg) => write!(f, "The path is malformed: {msg}"),

            Json(error) => write!(f, "JSON error: {error}"),
            Toml(error) => write!(f, "TOML error: {error}"),

            #[cfg(feature = "image-io")]
            Image(error) => write!(f, "Image decoding error: {error}"),
        }
    }
}

impl std::error::Error for IoError {}

impl From<std::io::Error> for IoError {
    fn from(value: std::io::Error) -> Self {
        Self::StdIo(value)
    }
}

impl From<serde_json::Error> for IoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<toml::de::Error> for IoError {
    fn from(value: toml::de::Error) -> Self {
        Self::Toml(value)
    }
}

#[cfg(feature = "image-io")]
impl From<::image::ImageError> for IoError {
    fn from(value: ::image::ImageError) -> Self {
        Self::Image(value)
    }
}
