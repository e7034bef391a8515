//! Test support library
//! Shared fields, configurations and scratch directories for the integration tests.
#![allow(dead_code)]

use nalgebra::Point3;
use pifurs::features::FeatureMap;
use pifurs::float_types::Real;
use pifurs::mesh::ReconstructedMesh;
use pifurs::oracle::{LastOp, LayerWeights, MlpWeights};
use pifurs::reconstruct::{OctreeSettings, ReconConfig};
use std::path::PathBuf;

/// Default reconstruction parameters at a test-friendly resolution.
pub fn small_config(resolution: usize) -> ReconConfig {
    ReconConfig {
        resolution,
        octree: OctreeSettings {
            init_resolution: resolution / 4,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pifurs-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Panics with the edge report when `mesh` is not closed and consistently oriented.
pub fn assert_closed(mesh: &ReconstructedMesh) {
    assert!(!mesh.is_empty(), "mesh is empty");
    let report = mesh.edge_report();
    assert!(report.is_watertight(), "mesh is not watertight: {report:?}");
    assert!(mesh.signed_volume() > 0.0, "mesh is inside out");
}

/// Mean and max deviation of the vertices' distance to `center` from `radius`.
pub fn radial_error(mesh: &ReconstructedMesh, center: Point3<Real>, radius: Real) -> (Real, Real) {
    let errors: Vec<Real> = mesh
        .vertices
        .iter()
        .map(|v| ((v - center).norm() - radius).abs())
        .collect();
    let mean = errors.iter().sum::<Real>() / errors.len() as Real;
    let max = errors.iter().copied().fold(0.0, Real::max);
    (mean, max)
}

/// Depth encoding scale with the default normalizer: `(512 / 2) / 200`.
pub const DEPTH_SCALE: Real = 1.28;

/// A one-channel front view whose pixel holds the half-thickness of a centered sphere
/// of `radius` at that image location: `sqrt(max(0, r^2 - x^2 - y^2))`.
pub fn sphere_thickness_map(radius: Real, size: usize) -> FeatureMap {
    let coord = |i: usize| -1.0 + 2.0 * i as Real / (size - 1) as Real;
    let mut data = Vec::with_capacity(size * size);
    for row in 0..size {
        for col in 0..size {
            let (x, y) = (coord(col), coord(row));
            data.push((radius * radius - x * x - y * y).max(0.0).sqrt());
        }
    }
    FeatureMap::new(1, size, size, data).unwrap()
}

/// Decoder for `sigmoid(sharpness * (thickness - |z|))` on `[thickness, depth]` inputs.
///
/// Layer 0 splits the depth feature into its positive and negative parts, layer 1 sees
/// them next to the raw input and recombines them.
pub fn thickness_decoder_weights(sharpness: Real) -> MlpWeights {
    let slope = 0.01;
    let k = sharpness / (DEPTH_SCALE * (1.0 - slope));
    MlpWeights {
        layers: vec![
            LayerWeights {
                weights: vec![vec![0.0, 1.0], vec![0.0, -1.0]],
                bias: vec![0.0, 0.0],
            },
            LayerWeights {
                weights: vec![vec![-k, -k, sharpness, 0.0]],
                bias: vec![0.0],
            },
        ],
        res_layers: vec![1],
        merge_layer: None,
        last_op: LastOp::Sigmoid,
        leaky_slope: slope,
    }
}
