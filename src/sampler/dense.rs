//! Exhaustive sampling: every grid sample goes to the oracle

use crate::errors::ReconError;
use crate::grid::{SamplingGrid, ScalarField, batch_eval};
use crate::oracle::OccupancyOracle;
use crate::sampler::traits::{SampledVolume, SamplingStats, VolumeSampler};

/// Evaluates every sample of the grid, `num_samples` points per oracle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenseSampler {
    pub num_samples: usize,
}

impl DenseSampler {
    pub const fn new(num_samples: usize) -> Self {
        Self { num_samples }
    }
}

impl Default for DenseSampler {
    fn default() -> Self {
        Self::new(100_000)
    }
}

impl VolumeSampler for DenseSampler {
    fn sample<O: OccupancyOracle + ?Sized>(
        &self,
        grid: &SamplingGrid,
        oracle: &O,
    ) -> Result<SampledVolume, ReconError> {
        let values = batch_eval(oracle, &grid.points(), self.num_samples)?;
        let evaluated = values.len();
        Ok(SampledVolume {
            field: ScalarField::new(*grid, values)?,
            stats: SamplingStats {
                evaluated,
                interpolated: 0,
                levels: 1,
            },
        })
    }
}
