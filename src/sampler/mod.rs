//! Volume samplers
//!
//! A sampler fills a [`SamplingGrid`](crate::grid::SamplingGrid) with occupancy values
//! from an oracle. [`DenseSampler`] asks about every sample; [`OctreeSampler`] skips
//! regions that are uniformly inside or outside.

pub mod dense;
pub mod octree;
pub mod traits;

pub use dense::DenseSampler;
pub use octree::OctreeSampler;
pub use traits::{SampledVolume, SamplingStats, VolumeSampler};

use crate::errors::ReconError;
use crate::grid::SamplingGrid;
use crate::oracle::OccupancyOracle;

/// Either sampler, picked at runtime from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sampler {
    Dense(DenseSampler),
    Octree(OctreeSampler),
}

impl Default for Sampler {
    fn default() -> Self {
        Sampler::Octree(OctreeSampler::default())
    }
}

impl VolumeSampler for Sampler {
    fn sample<O: OccupancyOracle + ?Sized>(
        &self,
        grid: &SamplingGrid,
        oracle: &O,
    ) -> Result<SampledVolume, ReconError> {
        match self {
            Sampler::Dense(s) => s.sample(grid, oracle),
            Sampler::Octree(s) => s.sample(grid, oracle),
        }
    }
}
