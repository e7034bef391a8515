//! Wavefront OBJ export with optional vertex colors.
//!
//! Colored meshes use the common `v x y z r g b` extension; faces are written 1-based in
//! mesh winding order.

use crate::io::IoError;
use crate::mesh::ReconstructedMesh;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Stream `mesh` as OBJ text into `out`.
pub fn write_obj<W: Write>(mesh: &ReconstructedMesh, mut out: W) -> Result<(), IoError> {
    let colors = match &mesh.colors {
        Some(colors) if colors.len() == mesh.vertices.len() => Some(colors),
        Some(colors) => {
            return Err(IoError::MalformedInput(format!(
                "{} colors for {} vertices",
                colors.len(),
                mesh.vertices.len()
            )));
        },
        None => None,
    };

    for (i, v) in mesh.vertices.iter().enumerate() {
        match colors {
            Some(colors) => {
                let c = colors[i];
                writeln!(
                    out,
                    "v {:.4} {:.4} {:.4} {:.4} {:.4} {:.4}",
                    v.x, v.y, v.z, c.x, c.y, c.z
                )?;
            },
            None => writeln!(out, "v {:.4} {:.4} {:.4}", v.x, v.y, v.z)?,
        }
    }

    for &[a, b, c] in &mesh.faces {
        if a.max(b).max(c) >= mesh.vertices.len() {
            return Err(IoError::MalformedInput(format!(
                "face [{a}, {b}, {c}] indexes past {} vertices",
                mesh.vertices.len()
            )));
        }
        writeln!(out, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }
    out.flush()?;
    Ok(())
}

/// OBJ text for `mesh`.
pub fn to_obj_string(mesh: &ReconstructedMesh) -> Result<String, IoError> {
    let mut bytes = Vec::new();
    write_obj(mesh, &mut bytes)?;
    String::from_utf8(bytes).map_err(|e| IoError::MalformedInput(e.to_string()))
}

/// Write `mesh` to `path`, creating missing parent directories.
pub fn save_obj<P: AsRef<Path>>(mesh: &ReconstructedMesh, path: P) -> Result<(), IoError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_obj(mesh, BufWriter::new(File::create(path)?))
}

impl ReconstructedMesh {
    /// Convert this mesh to OBJ text.
    ///
    /// ```rust
    /// # use pifurs::mesh::ReconstructedMesh;
    /// # use nalgebra::Point3;
    /// let mesh = ReconstructedMesh::new(
    ///     vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
    ///     vec![[0, 1, 2]],
    /// );
    /// let obj = mesh.to_obj().unwrap();
    /// assert!(obj.ends_with("f 1 2 3\n"));
    /// ```
    pub fn to_obj(&self) -> Result<String, IoError> {
        to_obj_string(self)
    }

    pub fn save_obj<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        save_obj(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn triangle() -> ReconstructedMesh {
        ReconstructedMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.25, -0.5),
            ],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn plain_vertices_and_one_based_faces() {
        let obj = to_obj_string(&triangle()).unwrap();
        assert_eq!(
            obj,
            "v 0.0000 0.0000 0.0000\nv 1.0000 0.0000 0.0000\nv 0.0000 1.2500 -0.5000\nf 1 2 3\n"
        );
    }

    #[test]
    fn colors_follow_positions() {
        let mut mesh = triangle();
        mesh.colors = Some(vec![Vector3::new(1.0, 0.5, 0.25); 3]);
        let obj = to_obj_string(&mesh).unwrap();
        assert_eq!(obj.lines().next(), Some("v 0.0000 0.0000 0.0000 1.0000 0.5000 0.2500"));
        assert_eq!(obj.lines().count(), 4);
    }

    #[test]
    fn mismatched_colors_are_rejected() {
        let mut mesh = triangle();
        mesh.colors = Some(vec![Vector3::zeros()]);
        assert!(matches!(to_obj_string(&mesh), Err(IoError::MalformedInput(_))));
    }
}
