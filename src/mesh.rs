//! Indexed triangle meshes produced by reconstruction

use crate::float_types::Real;
use crate::projection::WorldTransform;
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};

/// A triangle soup with shared vertices and optional per-vertex colors.
///
/// Faces index into `vertices` and wind counter-clockwise seen from outside, so
/// `(b - a) x (c - a)` points away from the subject.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconstructedMesh {
    pub vertices: Vec<Point3<Real>>,
    pub faces: Vec<[usize; 3]>,
    /// RGB in `[0, 1]`, one per vertex when present
    pub colors: Option<Vec<Vector3<Real>>>,
}

/// Edge-sharing summary of a mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeReport {
    /// Undirected edges used by exactly one face
    pub boundary_edges: usize,
    /// Undirected edges used by more than two faces
    pub non_manifold_edges: usize,
    /// Edges whose two faces traverse them in the same direction
    pub inconsistent_edges: usize,
}

impl EdgeReport {
    /// Closed, manifold and consistently oriented.
    pub const fn is_watertight(&self) -> bool {
        self.boundary_edges == 0 && self.non_manifold_edges == 0 && self.inconsistent_edges == 0
    }
}

impl ReconstructedMesh {
    pub fn new(vertices: Vec<Point3<Real>>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            colors: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Axis-aligned bounds of the vertices, `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<(Point3<Real>, Point3<Real>)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (lo.inf(v), hi.sup(v))
        }))
    }

    /// Unnormalized normal of face `i`; its length is twice the face area.
    pub fn face_normal(&self, i: usize) -> Vector3<Real> {
        let [a, b, c] = self.faces[i];
        let (a, b, c) = (self.vertices[a], self.vertices[b], self.vertices[c]);
        (b - a).cross(&(c - a))
    }

    pub fn surface_area(&self) -> Real {
        (0..self.faces.len()).map(|i| self.face_normal(i).norm()).sum::<Real>() / 2.0
    }

    /// Volume enclosed by a closed mesh; positive when faces wind outward.
    pub fn signed_volume(&self) -> Real {
        self.faces
            .iter()
            .map(|&[a, b, c]| {
                let (a, b, c) = (
                    self.vertices[a].coords,
                    self.vertices[b].coords,
                    self.vertices[c].coords,
                );
                a.dot(&b.cross(&c))
            })
            .sum::<Real>()
            / 6.0
    }

    /// Count how every undirected edge is shared.
    pub fn edge_report(&self) -> EdgeReport {
        // (low, high) -> (faces using the edge, faces traversing it low -> high)
        let mut edges: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
        for face in &self.faces {
            for k in 0..3 {
                let (a, b) = (face[k], face[(k + 1) % 3]);
                let entry = edges.entry((a.min(b), a.max(b))).or_insert((0, 0));
                entry.0 += 1;
                if a < b {
                    entry.1 += 1;
                }
            }
        }

        let mut report = EdgeReport::default();
        for &(uses, forward) in edges.values() {
            match uses {
                1 => report.boundary_edges += 1,
                2 if forward != 1 => report.inconsistent_edges += 1,
                2 => {},
                _ => report.non_manifold_edges += 1,
            }
        }
        report
    }

    /// Edges used by a single face.
    pub fn boundary_edges(&self) -> usize {
        self.edge_report().boundary_edges
    }

    pub fn is_watertight(&self) -> bool {
        self.edge_report().is_watertight()
    }

    /// Map every vertex from model space into world space. Topology and colors are kept.
    pub fn transform(&mut self, world: &WorldTransform) {
        for v in &mut self.vertices {
            *v = world.model_to_world(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Matrix4;

    fn tetrahedron() -> ReconstructedMesh {
        ReconstructedMesh::new(
            vec![
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        )
    }

    #[test]
    fn closed_tetrahedron_is_watertight_with_positive_volume() {
        let mesh = tetrahedron();
        assert!(mesh.is_watertight());
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 6.0, epsilon = 1e-12);
        let (lo, hi) = mesh.bounding_box().unwrap();
        assert_relative_eq!(lo, Point3::origin());
        assert_relative_eq!(hi, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn missing_and_flipped_faces_are_reported() {
        let mut open = tetrahedron();
        open.faces.pop();
        assert_eq!(open.edge_report().boundary_edges, 3);

        let mut flipped = tetrahedron();
        flipped.faces[3] = [1, 3, 2];
        let report = flipped.edge_report();
        assert_eq!(report.boundary_edges, 0);
        assert_eq!(report.inconsistent_edges, 3);
        assert!(!flipped.is_watertight());
    }

    #[test]
    fn transform_applies_the_inverse_world_matrix() {
        let mut mesh = tetrahedron();
        let world = WorldTransform::new(Matrix4::new_scaling(2.0)).unwrap();
        mesh.transform(&world);
        assert_relative_eq!(mesh.vertices[1], Point3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 48.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_mesh_has_no_bounds() {
        assert!(ReconstructedMesh::default().bounding_box().is_none());
        assert!(ReconstructedMesh::default().is_watertight());
    }
}
