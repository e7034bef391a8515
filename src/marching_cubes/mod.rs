//! Iso-surface extraction with marching cubes.
//!
//! Every cell of the sampled lattice is classified by which of its eight corners lie
//! strictly above the iso-value, and the matching row of [`tables::TRI_TABLE`] emits its
//! triangles. A vertex is created once per crossing lattice edge and shared by every
//! cell around that edge, so the output is an indexed mesh that is closed wherever the
//! surface does not leave the grid.
//!
//! A crossing that lands on a lattice sample (within [`SNAP_FRACTION`] of a cell edge) is
//! keyed by that sample instead, so every edge meeting there shares one vertex and the
//! collapsed triangles are dropped rather than emitted with zero area.

pub mod tables;

use crate::float_types::Real;
use crate::grid::ScalarField;
use crate::mesh::ReconstructedMesh;
use hashbrown::HashMap;
use log::debug;
use nalgebra::Point3;
use tables::{CORNER_OFFSETS, EDGE_CORNERS, TRI_TABLE};

/// Crossings closer than this fraction of an edge to an endpoint snap onto the endpoint.
pub const SNAP_FRACTION: Real = 1e-6;

/// Identity of an output vertex on the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum VertexKey {
    /// Interior of the edge leaving `sample` along `axis`
    Edge { sample: usize, axis: usize },
    /// Exactly on a lattice sample
    Sample(usize),
}

/// Non-finite samples count as outside.
#[inline]
fn is_inside(value: Real, iso: Real) -> bool {
    value.is_finite() && value > iso
}

/// Where along `a -> b` the field crosses `iso`, as a fraction in `[0, 1]`.
#[inline]
fn crossing(va: Real, vb: Real, iso: Real) -> Real {
    let t = (iso - va) / (vb - va);
    if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 }
}

/// Extract the `iso` level set of `field` as a triangle mesh in world coordinates.
///
/// Returns an empty mesh when no cell straddles the iso-value.
pub fn marching_cubes(field: &ScalarField, iso: Real) -> ReconstructedMesh {
    let grid = field.grid();
    let [rx, ry, rz] = grid.resolution();
    let values = field.values();

    let mut vertex_index: HashMap<VertexKey, usize> = HashMap::new();
    let mut vertices: Vec<Point3<Real>> = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();
    let mut degenerate = 0usize;

    for x in 0..rx - 1 {
        for y in 0..ry - 1 {
            for z in 0..rz - 1 {
                let mut corner_values = [0.0; 8];
                let mut case = 0usize;
                for (i, [dx, dy, dz]) in CORNER_OFFSETS.iter().enumerate() {
                    let v = values[grid.index(x + dx, y + dy, z + dz)];
                    corner_values[i] = v;
                    if is_inside(v, iso) {
                        case |= 1 << i;
                    }
                }

                let row = &TRI_TABLE[case];
                if row[0] < 0 {
                    continue;
                }

                let mut cell_vertex = |edge: usize| -> usize {
                    let [a, b] = EDGE_CORNERS[edge];
                    // walk every edge from its lower lattice endpoint
                    let (lo, hi) = if CORNER_OFFSETS[a] <= CORNER_OFFSETS[b] { (a, b) } else { (b, a) };
                    let [ox, oy, oz] = CORNER_OFFSETS[lo];
                    let axis = (0..3)
                        .find(|&k| CORNER_OFFSETS[lo][k] != CORNER_OFFSETS[hi][k])
                        .unwrap_or(0);
                    let mut coords = Point3::new((x + ox) as Real, (y + oy) as Real, (z + oz) as Real);
                    let t = crossing(corner_values[lo], corner_values[hi], iso);
                    let key = if t <= SNAP_FRACTION {
                        VertexKey::Sample(grid.index(x + ox, y + oy, z + oz))
                    } else if t >= 1.0 - SNAP_FRACTION {
                        coords[axis] += 1.0;
                        VertexKey::Sample(grid.index(
                            x + CORNER_OFFSETS[hi][0],
                            y + CORNER_OFFSETS[hi][1],
                            z + CORNER_OFFSETS[hi][2],
                        ))
                    } else {
                        coords[axis] += t;
                        VertexKey::Edge {
                            sample: grid.index(x + ox, y + oy, z + oz),
                            axis,
                        }
                    };

                    *vertex_index.entry(key).or_insert_with(|| {
                        vertices.push(grid.to_world(&coords));
                        vertices.len() - 1
                    })
                };

                for tri in row.chunks_exact(3).take_while(|t| t[0] >= 0) {
                    let face = [
                        cell_vertex(tri[0] as usize),
                        cell_vertex(tri[1] as usize),
                        cell_vertex(tri[2] as usize),
                    ];
                    if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                        degenerate += 1;
                        continue;
                    }
                    faces.push(face);
                }
            }
        }
    }

    debug!(
        "marching cubes at iso {iso}: {} vertices, {} faces, {degenerate} degenerate dropped",
        vertices.len(),
        faces.len()
    );
    ReconstructedMesh::new(vertices, faces)
}
