mod support;

use nalgebra::Point3;
use pifurs::oracle::soft_sphere;
use pifurs::reconstruct::Reconstructor;
use std::fs;

#[test]
fn colored_obj_round_trips_through_the_file_system() {
    let oracle = soft_sphere(Point3::origin(), 0.5, 20.0);
    let recon = Reconstructor::new(support::small_config(24))
        .unwrap()
        .generate(&oracle, None)
        .unwrap();

    let dir = support::scratch_dir("obj");
    let path = dir.join("nested").join("result_sphere.obj");
    recon.mesh.save_obj(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let vertex_lines: Vec<&str> = text.lines().filter(|l| l.starts_with("v ")).collect();
    let face_lines: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
    assert_eq!(vertex_lines.len(), recon.mesh.vertex_count());
    assert_eq!(face_lines.len(), recon.mesh.face_count());

    for line in &vertex_lines {
        let fields: Vec<&str> = line.split_whitespace().skip(1).collect();
        assert_eq!(fields.len(), 6, "{line}");
        for f in &fields {
            // four decimals
            assert_eq!(f.split('.').nth(1).map(str::len), Some(4), "{line}");
        }
        let rgb: Vec<f64> = fields[3..].iter().map(|f| f.parse().unwrap()).collect();
        assert!(rgb.iter().all(|c| (0.0..=1.0).contains(c)));
    }

    let n = recon.mesh.vertex_count();
    for (line, face) in face_lines.iter().zip(&recon.mesh.faces) {
        let idx: Vec<usize> = line.split_whitespace().skip(1).map(|f| f.parse().unwrap()).collect();
        assert!(idx.iter().all(|&i| (1..=n).contains(&i)));
        assert_eq!(idx, face.iter().map(|i| i + 1).collect::<Vec<_>>());
    }

    let _ = fs::remove_dir_all(dir);
}

#[cfg(feature = "stl-io")]
#[test]
fn reconstructed_mesh_survives_binary_stl() {
    let oracle = soft_sphere(Point3::origin(), 0.5, 20.0);
    let recon = Reconstructor::new(support::small_config(24)).unwrap().reconstruct(&oracle).unwrap();

    let bytes = recon.mesh.to_stl_binary().unwrap();
    let back = pifurs::ReconstructedMesh::from_stl(&bytes).unwrap();
    assert_eq!(back.face_count(), recon.mesh.face_count());
    support::assert_closed(&back);
    approx::assert_relative_eq!(back.signed_volume(), recon.mesh.signed_volume(), max_relative = 1e-4);

    let ascii = recon.mesh.to_stl_ascii("sphere");
    assert_eq!(ascii.matches("endfacet").count(), recon.mesh.face_count());
}

#[cfg(feature = "stl-io")]
#[test]
fn iso_valued_samples_survive_binary_stl() {
    use pifurs::float_types::Real;
    use pifurs::grid::{SamplingGrid, ScalarField};
    use pifurs::marching_cubes::marching_cubes;

    // several lattice samples evaluate to exactly the iso-value
    let grid = SamplingGrid::cubic(24, Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0)).unwrap();
    let field = ScalarField::from_fn(grid, |p: &Point3<Real>| {
        1.0 / (1.0 + (-20.0 * (0.5 - p.coords.norm())).exp())
    });
    let mesh = marching_cubes(&field, 0.5);
    support::assert_closed(&mesh);

    let back = pifurs::ReconstructedMesh::from_stl(&mesh.to_stl_binary().unwrap()).unwrap();
    let report = back.edge_report();
    assert_eq!(report.non_manifold_edges, 0, "{report:?}");
    assert_eq!(back.face_count(), mesh.face_count());
    assert_eq!(back.vertex_count(), mesh.vertex_count());
    support::assert_closed(&back);
    for i in 0..back.face_count() {
        assert!(back.face_normal(i).norm() > 0.0, "face {i} has zero area");
    }
}
