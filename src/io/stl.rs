use crate::float_types::Real;
use crate::io::IoError;
use crate::mesh::ReconstructedMesh;
use nalgebra::{Point3, Vector3};
use std::io::{Cursor, Read, Seek};

fn unit_face_normal(mesh: &ReconstructedMesh, i: usize) -> Vector3<Real> {
    let n = mesh.face_normal(i);
    let len = n.norm();
    if len > 0.0 { n / len } else { Vector3::zeros() }
}

/// Export to ASCII STL
/// Convert a mesh to an **ASCII STL** string with the given `name`. Vertex colors are
/// not representable and are dropped.
///
/// ```rust
/// # use pifurs::mesh::ReconstructedMesh;
/// # use nalgebra::Point3;
/// let mesh = ReconstructedMesh::new(
///     vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
///     vec![[0, 1, 2]],
/// );
/// let stl = pifurs::io::stl::to_stl_ascii(&mesh, "body");
/// assert!(stl.contains("facet normal 0.000000 0.000000 1.000000"));
/// ```
pub fn to_stl_ascii(mesh: &ReconstructedMesh, name: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("solid {name}\n"));

    for (i, face) in mesh.faces.iter().enumerate() {
        let n = unit_face_normal(mesh, i);
        out.push_str(&format!("  facet normal {:.6} {:.6} {:.6}\n", n.x, n.y, n.z));
        out.push_str("    outer loop\n");
        for &v in face {
            let p = mesh.vertices[v];
            out.push_str(&format!("      vertex {:.6} {:.6} {:.6}\n", p.x, p.y, p.z));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }

    out.push_str(&format!("endsolid {name}\n"));
    out
}

/// Export to BINARY STL (returns `Vec<u8>`)
pub fn to_stl_binary(mesh: &ReconstructedMesh) -> Result<Vec<u8>, IoError> {
    use stl_io::{Normal, Triangle, Vertex, write_stl};

    #[allow(clippy::unnecessary_cast)]
    let triangles: Vec<Triangle> = mesh
        .faces
        .iter()
        .enumerate()
        .map(|(i, face)| {
            let n = unit_face_normal(mesh, i);
            Triangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: face.map(|v| {
                    let p = mesh.vertices[v];
                    Vertex::new([p.x as f32, p.y as f32, p.z as f32])
                }),
            }
        })
        .collect();

    let mut bytes = Vec::new();
    write_stl(&mut bytes, triangles.iter())?;
    Ok(bytes)
}

/// Read an STL stream (ASCII or binary) into an indexed mesh without colors.
pub fn read_stl<R: Read + Seek>(reader: &mut R) -> Result<ReconstructedMesh, IoError> {
    let indexed = stl_io::read_stl(reader)?;
    let vertices = indexed
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as Real, v[1] as Real, v[2] as Real))
        .collect();
    let faces = indexed.faces.iter().map(|f| f.vertices).collect();
    Ok(ReconstructedMesh::new(vertices, faces))
}

impl ReconstructedMesh {
    pub fn to_stl_ascii(&self, name: &str) -> String {
        self::to_stl_ascii(self, name)
    }

    pub fn to_stl_binary(&self) -> Result<Vec<u8>, IoError> {
        self::to_stl_binary(self)
    }

    pub fn from_stl(bytes: &[u8]) -> Result<Self, IoError> {
        read_stl(&mut Cursor::new(bytes))
    }
}
