//! Traits defining volume sampling strategies for dependency inversion

use crate::errors::ReconError;
use crate::grid::{SamplingGrid, ScalarField};
use crate::oracle::OccupancyOracle;

/// How many samples were actually asked of the oracle versus filled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplingStats {
    /// Samples answered by the oracle
    pub evaluated: usize,
    /// Samples filled from a uniform coarse cell
    pub interpolated: usize,
    /// Refinement levels visited
    pub levels: usize,
}

impl SamplingStats {
    pub const fn total(&self) -> usize {
        self.evaluated + self.interpolated
    }
}

/// A sampled grid together with its bookkeeping.
#[derive(Debug, Clone)]
pub struct SampledVolume {
    pub field: ScalarField,
    pub stats: SamplingStats,
}

/// Core volume sampling trait
pub trait VolumeSampler {
    /// Fill every sample of `grid` with an occupancy value.
    fn sample<O: OccupancyOracle + ?Sized>(
        &self,
        grid: &SamplingGrid,
        oracle: &O,
    ) -> Result<SampledVolume, ReconError>;
}
