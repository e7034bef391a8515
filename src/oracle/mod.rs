//! Feature-query oracles
//!
//! An oracle answers "how occupied is this point?" for batches of points. The pipeline
//! only ever talks to the [`OccupancyOracle`] trait, so analytic fields, a
//! [`PixelAlignedOracle`] driving an [`MlpDecoder`], or any external predictor plug in
//! the same way.

pub mod implicit;
pub mod mlp;
pub mod pixel_aligned;
pub mod traits;

// Re-export core types
pub use implicit::{ImplicitOracle, soft_sphere};
pub use mlp::{LastOp, LayerWeights, MlpDecoder, MlpWeights};
pub use pixel_aligned::{DepthNormalizer, PixelAlignedOracle, View};
pub use traits::{FiniteDifference, OccupancyOracle, PointDecoder, checked_query};
