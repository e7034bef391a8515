//! Octree-accelerated sampling.
//!
//! Starts on a coarse lattice and halves the stride each level. Between levels, every
//! coarse cell whose eight corners agree to within `threshold` is filled with the mean of
//! its extreme corner values instead of being refined, so the oracle is mostly queried
//! near the surface.
//!
//! ```text
//! stride = max(1, rx / init_resolution)
//! loop:
//!     evaluate every dirty sample on the stride lattice
//!     if stride == 1: done
//!     for each cell (origin on the lattice, far corner inside the grid):
//!         skip if the cell center is already known
//!         if max(corners) - min(corners) < threshold:
//!             fill dirty samples of [origin, origin + stride)^3 with (max + min) / 2
//!     stride /= 2
//! ```

use crate::errors::ReconError;
use crate::float_types::Real;
use crate::grid::{SamplingGrid, ScalarField, batch_eval};
use crate::oracle::OccupancyOracle;
use crate::sampler::traits::{SampledVolume, SamplingStats, VolumeSampler};
use log::debug;

/// Adaptive sampler; see the module docs for the refinement rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeSampler {
    /// Lattice resolution of the first level along x
    pub init_resolution: usize,
    /// Largest corner spread for which a cell counts as uniform
    pub threshold: Real,
    /// Points per oracle call
    pub num_samples: usize,
}

impl Default for OctreeSampler {
    fn default() -> Self {
        Self {
            init_resolution: 64,
            threshold: 0.05,
            num_samples: 100_000,
        }
    }
}

impl OctreeSampler {
    /// Stride of the first level. Grids coarser than `init_resolution` start dense.
    pub fn initial_stride(&self, grid: &SamplingGrid) -> usize {
        (grid.resolution()[0] / self.init_resolution.max(1)).max(1)
    }

    /// Evaluate all still-unknown samples on the `stride` lattice.
    fn evaluate_level<O: OccupancyOracle + ?Sized>(
        &self,
        grid: &SamplingGrid,
        oracle: &O,
        stride: usize,
        values: &mut [Real],
        dirty: &mut [bool],
    ) -> Result<usize, ReconError> {
        let [rx, ry, rz] = grid.resolution();
        let mut indices = Vec::new();
        for x in (0..rx).step_by(stride) {
            for y in (0..ry).step_by(stride) {
                for z in (0..rz).step_by(stride) {
                    let i = grid.index(x, y, z);
                    if dirty[i] {
                        indices.push(i);
                    }
                }
            }
        }

        let points: Vec<_> = indices
            .iter()
            .map(|&i| {
                let [x, y, z] = grid.delinearize(i);
                grid.point(x, y, z)
            })
            .collect();
        let answers = batch_eval(oracle, &points, self.num_samples)?;
        for (&i, v) in indices.iter().zip(answers) {
            values[i] = v;
            dirty[i] = false;
        }
        Ok(indices.len())
    }

    /// Fill uniform `stride` cells; returns the number of samples filled.
    fn collapse_uniform_cells(
        &self,
        grid: &SamplingGrid,
        stride: usize,
        values: &mut [Real],
        dirty: &mut [bool],
    ) -> usize {
        let [rx, ry, rz] = grid.resolution();
        let half = stride / 2;
        let mut filled = 0;

        for x in (0..rx.saturating_sub(stride)).step_by(stride) {
            for y in (0..ry.saturating_sub(stride)).step_by(stride) {
                for z in (0..rz.saturating_sub(stride)).step_by(stride) {
                    if !dirty[grid.index(x + half, y + half, z + half)] {
                        continue;
                    }

                    let mut lo = Real::INFINITY;
                    let mut hi = Real::NEG_INFINITY;
                    let mut finite = true;
                    for (dx, dy, dz) in CORNERS {
                        let v = values[grid.index(x + dx * stride, y + dy * stride, z + dz * stride)];
                        finite &= v.is_finite();
                        lo = lo.min(v);
                        hi = hi.max(v);
                    }
                    if !finite || hi - lo >= self.threshold {
                        continue;
                    }

                    let mid = (hi + lo) / 2.0;
                    for bx in x..x + stride {
                        for by in y..y + stride {
                            for bz in z..z + stride {
                                let i = grid.index(bx, by, bz);
                                if dirty[i] {
                                    values[i] = mid;
                                    dirty[i] = false;
                                    filled += 1;
                                }
                            }
                        }
                    }
                }
            }
        }
        filled
    }
}

const CORNERS: [(usize, usize, usize); 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (0, 1, 0),
    (1, 1, 0),
    (0, 0, 1),
    (1, 0, 1),
    (0, 1, 1),
    (1, 1, 1),
];

impl VolumeSampler for OctreeSampler {
    fn sample<O: OccupancyOracle + ?Sized>(
        &self,
        grid: &SamplingGrid,
        oracle: &O,
    ) -> Result<SampledVolume, ReconError> {
        let mut values = vec![0.0; grid.len()];
        let mut dirty = vec![true; grid.len()];
        let mut stats = SamplingStats::default();
        let mut stride = self.initial_stride(grid);

        loop {
            stats.levels += 1;
            let evaluated = self.evaluate_level(grid, oracle, stride, &mut values, &mut dirty)?;
            stats.evaluated += evaluated;
            if stride <= 1 {
                debug!("octree level stride 1: evaluated {evaluated}");
                break;
            }

            let filled = self.collapse_uniform_cells(grid, stride, &mut values, &mut dirty);
            stats.interpolated += filled;
            debug!("octree level stride {stride}: evaluated {evaluated}, filled {filled}");
            stride /= 2;
        }

        debug_assert!(dirty.iter().all(|d| !d));
        Ok(SampledVolume {
            field: ScalarField::new(*grid, values)?,
            stats,
        })
    }
}
