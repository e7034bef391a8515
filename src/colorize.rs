//! Per-vertex coloring from the occupancy gradient

use crate::errors::ReconError;
use crate::float_types::Real;
use crate::mesh::ReconstructedMesh;
use crate::oracle::{FiniteDifference, OccupancyOracle};
use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Colors each vertex with its estimated normal mapped from `[-1, 1]` to `[0, 1]`.
///
/// Normals come from [`OccupancyOracle::normals`], so they must be computed while the
/// vertices are still in the oracle's model frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalColorizer {
    /// Finite-difference step in model units
    pub delta: Real,
    pub scheme: FiniteDifference,
    /// Vertices per `normals` call
    pub chunk_size: usize,
}

impl Default for NormalColorizer {
    fn default() -> Self {
        Self {
            delta: 0.1,
            scheme: FiniteDifference::Forward,
            chunk_size: 100_000,
        }
    }
}

/// `n * 0.5 + 0.5`
#[inline]
pub fn normal_to_color(n: &Vector3<Real>) -> Vector3<Real> {
    n.map(|c| c * 0.5 + 0.5)
}

impl NormalColorizer {
    /// Estimated outward normals for every vertex, in vertex order.
    pub fn vertex_normals<O: OccupancyOracle + ?Sized>(
        &self,
        oracle: &O,
        mesh: &ReconstructedMesh,
    ) -> Result<Vec<Vector3<Real>>, ReconError> {
        let mut normals = Vec::with_capacity(mesh.vertex_count());
        for chunk in mesh.vertices.chunks(self.chunk_size.max(1)) {
            let batch = oracle.normals(chunk, self.delta, self.scheme)?;
            if batch.len() != chunk.len() {
                return Err(ReconError::OracleLength {
                    expected: chunk.len(),
                    got: batch.len(),
                });
            }
            normals.extend(batch);
        }
        Ok(normals)
    }

    /// Fill `mesh.colors`, replacing any previous colors.
    pub fn colorize<O: OccupancyOracle + ?Sized>(
        &self,
        oracle: &O,
        mesh: &mut ReconstructedMesh,
    ) -> Result<(), ReconError> {
        let normals = self.vertex_normals(oracle, mesh)?;
        mesh.colors = Some(normals.iter().map(normal_to_color).collect());
        debug!(
            "colored {} vertices with {:?} differences, delta {}",
            mesh.vertex_count(),
            self.scheme,
            self.delta
        );
        Ok(())
    }
}
