//! The reconstruction pipeline: sample, extract, colorize, place in the world.

use crate::colorize::NormalColorizer;
use crate::errors::ReconError;
use crate::float_types::Real;
use crate::grid::SamplingGrid;
use crate::marching_cubes::marching_cubes;
use crate::mesh::ReconstructedMesh;
use crate::oracle::OccupancyOracle;
use crate::projection::WorldTransform;
use crate::sampler::{DenseSampler, OctreeSampler, Sampler, SamplingStats, VolumeSampler};
use log::{debug, info, warn};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Octree refinement parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeSettings {
    pub init_resolution: usize,
    pub threshold: Real,
}

impl Default for OctreeSettings {
    fn default() -> Self {
        let sampler = OctreeSampler::default();
        Self {
            init_resolution: sampler.init_resolution,
            threshold: sampler.threshold,
        }
    }
}

/// Parameters of a single reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// Samples along each axis
    pub resolution: usize,
    pub b_min: [Real; 3],
    pub b_max: [Real; 3],
    /// Iso-value separating inside from outside
    pub threshold: Real,
    pub use_octree: bool,
    pub octree: OctreeSettings,
    /// Points per oracle call while sampling
    pub num_samples: usize,
    pub normals: NormalColorizer,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            resolution: 256,
            b_min: [-1.0; 3],
            b_max: [1.0; 3],
            threshold: 0.5,
            use_octree: true,
            octree: OctreeSettings::default(),
            num_samples: 100_000,
            normals: NormalColorizer::default(),
        }
    }
}

impl ReconConfig {
    pub fn grid(&self) -> Result<SamplingGrid, ReconError> {
        SamplingGrid::cubic(
            self.resolution,
            Point3::from(self.b_min),
            Point3::from(self.b_max),
        )
    }

    pub fn sampler(&self) -> Sampler {
        if self.use_octree {
            Sampler::Octree(OctreeSampler {
                init_resolution: self.octree.init_resolution,
                threshold: self.octree.threshold,
                num_samples: self.num_samples,
            })
        } else {
            Sampler::Dense(DenseSampler::new(self.num_samples))
        }
    }

    /// Reject parameters that cannot produce a mesh.
    pub fn validate(&self) -> Result<(), ReconError> {
        self.grid()?;
        if !self.threshold.is_finite() {
            return Err(ReconError::Config(format!("threshold must be finite, got {}", self.threshold)));
        }
        if self.num_samples == 0 || self.normals.chunk_size == 0 {
            return Err(ReconError::Config("batch sizes must be positive".into()));
        }
        if self.use_octree && self.octree.init_resolution == 0 {
            return Err(ReconError::Config("octree.init_resolution must be positive".into()));
        }
        if !(self.normals.delta.is_finite() && self.normals.delta > 0.0) {
            return Err(ReconError::Config(format!(
                "normals.delta must be positive, got {}",
                self.normals.delta
            )));
        }
        Ok(())
    }
}

/// A finished reconstruction and how much sampling it took.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub mesh: ReconstructedMesh,
    pub stats: SamplingStats,
}

/// Runs the pipeline for any [`OccupancyOracle`].
#[derive(Debug, Clone)]
pub struct Reconstructor {
    config: ReconConfig,
    grid: SamplingGrid,
}

impl Reconstructor {
    pub fn new(config: ReconConfig) -> Result<Self, ReconError> {
        config.validate()?;
        let grid = config.grid()?;
        Ok(Self { config, grid })
    }

    pub const fn config(&self) -> &ReconConfig {
        &self.config
    }

    pub const fn grid(&self) -> &SamplingGrid {
        &self.grid
    }

    /// Sample the oracle and extract its iso-surface. The mesh stays in the oracle's
    /// model frame and carries no colors.
    pub fn reconstruct<O: OccupancyOracle + ?Sized>(
        &self,
        oracle: &O,
    ) -> Result<Reconstruction, ReconError> {
        let started = Instant::now();
        let volume = self.config.sampler().sample(&self.grid, oracle)?;
        info!(
            "sampled {} points ({} evaluated, {} interpolated, {} levels) in {:.2?}",
            self.grid.len(),
            volume.stats.evaluated,
            volume.stats.interpolated,
            volume.stats.levels,
            started.elapsed()
        );

        let started = Instant::now();
        let mesh = marching_cubes(&volume.field, self.config.threshold);
        if mesh.is_empty() {
            warn!("no surface at threshold {}", self.config.threshold);
            return Err(ReconError::EmptySurface(self.config.threshold));
        }
        info!(
            "extracted {} vertices, {} faces in {:.2?}",
            mesh.vertex_count(),
            mesh.face_count(),
            started.elapsed()
        );

        Ok(Reconstruction {
            mesh,
            stats: volume.stats,
        })
    }

    /// Full pipeline: reconstruct, color vertices by their normals in model space, then
    /// map them into the world frame when a world calibration is given.
    pub fn generate<O: OccupancyOracle + ?Sized>(
        &self,
        oracle: &O,
        world: Option<&WorldTransform>,
    ) -> Result<Reconstruction, ReconError> {
        let mut recon = self.reconstruct(oracle)?;

        let started = Instant::now();
        self.config.normals.colorize(oracle, &mut recon.mesh)?;
        info!("colored {} vertices in {:.2?}", recon.mesh.vertex_count(), started.elapsed());

        if let Some(world) = world {
            recon.mesh.transform(world);
            debug!("mapped vertices to world space");
        }
        Ok(recon)
    }
}
