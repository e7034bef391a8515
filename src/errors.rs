//! Reconstruction errors

use crate::float_types::Real;
use crate::io::IoError;
use nalgebra::Point3;

/// Everything that can go wrong between querying an oracle and holding a mesh.
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    /// A sampling grid needs at least two samples along every axis
    #[error("(InvalidResolution) every axis needs at least 2 samples, got {0:?}")]
    InvalidResolution([usize; 3]),
    /// The sampling box is empty or inverted along some axis
    #[error("(InvalidBounds) min {min} must be strictly below max {max}")]
    InvalidBounds { min: Point3<Real>, max: Point3<Real> },
    /// An oracle answered with the wrong number of values
    #[error("(OracleLength) oracle returned {got} values for {expected} points")]
    OracleLength { expected: usize, got: usize },
    /// A feature tensor does not hold `channels * height * width` values
    #[error("(FeatureShape) {0}")]
    FeatureShape(String),
    /// The decoder and the per-view features disagree on the channel count
    #[error("(ChannelMismatch) decoder expects {expected} input channels, views provide {got}")]
    ChannelMismatch { expected: usize, got: usize },
    /// Decoder weights are inconsistent
    #[error("(DecoderShape) {0}")]
    DecoderShape(String),
    /// A pixel-aligned oracle was built without views
    #[error("(NoViews) at least one calibrated view is required")]
    NoViews,
    /// The world calibration has no inverse
    #[error("(SingularTransform) world calibration matrix is not invertible")]
    SingularTransform,
    /// Marching cubes found no crossing at the iso-value
    #[error("(EmptySurface) no iso-surface crossing at threshold {0}")]
    EmptySurface(Real),
    /// Invalid run or reconstruction parameters
    #[error("(Config) {0}")]
    Config(String),
    /// Reading or writing files
    #[error(transparent)]
    Io(#[from] IoError),
}

impl From<std::io::Error> for ReconError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(IoError::StdIo(value))
    }
}

impl From<serde_json::Error> for ReconError {
    fn from(value: serde_json::Error) -> Self {
        Self::Io(IoError::Json(value))
    }
}
