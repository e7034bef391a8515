mod support;

use nalgebra::{Point3, Vector3};
use pifurs::float_types::Real;
use pifurs::grid::{SamplingGrid, ScalarField};
use pifurs::marching_cubes::marching_cubes;

fn field(res: usize, f: impl Fn(&Point3<Real>) -> Real) -> ScalarField {
    let grid = SamplingGrid::cubic(res, Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
        .unwrap();
    ScalarField::from_fn(grid, f)
}

#[test]
fn torus_is_closed_with_genus_one() {
    let (major, minor) = (0.5, 0.2);
    let torus = field(40, |p| {
        let q = (p.x.hypot(p.y) - major).hypot(p.z);
        minor - q
    });
    let mesh = marching_cubes(&torus, 0.0);
    support::assert_closed(&mesh);

    // V - E + F = 0 for a torus; every edge is shared by two faces
    let edges = mesh.face_count() * 3 / 2;
    let euler = mesh.vertex_count() as i64 - edges as i64 + mesh.face_count() as i64;
    assert_eq!(euler, 0);
}

#[test]
fn two_separate_blobs_are_both_closed() {
    let blobs = field(32, |p| {
        let a = 0.3 - (p - Point3::new(-0.45, 0.0, 0.0)).norm();
        let b = 0.3 - (p - Point3::new(0.45, 0.0, 0.0)).norm();
        a.max(b)
    });
    let mesh = marching_cubes(&blobs, 0.0);
    support::assert_closed(&mesh);
    let euler = mesh.vertex_count() as i64 - (mesh.face_count() * 3 / 2) as i64
        + mesh.face_count() as i64;
    assert_eq!(euler, 4);
}

#[test]
fn faces_point_away_from_the_inside() {
    let ellipsoid = field(32, |p| 1.0 - (p.x / 0.7).powi(2) - (p.y / 0.4).powi(2) - (p.z / 0.5).powi(2));
    let mesh = marching_cubes(&ellipsoid, 0.0);
    support::assert_closed(&mesh);

    let mut inward = 0;
    for (i, &[a, b, c]) in mesh.faces.iter().enumerate() {
        let centroid: Vector3<Real> =
            (mesh.vertices[a].coords + mesh.vertices[b].coords + mesh.vertices[c].coords) / 3.0;
        let gradient = Vector3::new(
            centroid.x / (0.7 * 0.7),
            centroid.y / (0.4 * 0.4),
            centroid.z / (0.5 * 0.5),
        );
        if mesh.face_normal(i).dot(&gradient) <= 0.0 {
            inward += 1;
        }
    }
    assert!(inward * 100 <= mesh.face_count(), "{inward} faces point inward");
}

#[test]
fn surfaces_cut_by_the_grid_are_open() {
    // a half-space: the plane x = 0.1 crosses the whole grid
    let slab = field(16, |p| 0.1 - p.x);
    let mesh = marching_cubes(&slab, 0.0);
    assert!(!mesh.is_empty());
    assert!(mesh.boundary_edges() > 0);
    assert_eq!(mesh.edge_report().non_manifold_edges, 0);
    assert_eq!(mesh.edge_report().inconsistent_edges, 0);
    for v in &mesh.vertices {
        approx::assert_relative_eq!(v.x, 0.1, epsilon = 1e-9);
    }
}

#[test]
fn iso_value_selects_the_level_set() {
    let ball = field(32, |p| p.coords.norm());
    // inside means value > iso, so the outside of the ball is "inside" here
    let inverted = marching_cubes(&ball, 0.5);
    assert!(inverted.is_watertight());
    assert!(inverted.signed_volume() < 0.0);

    let negated = field(32, |p| -p.coords.norm());
    let mesh = marching_cubes(&negated, -0.5);
    support::assert_closed(&mesh);
    let (mean, max) = support::radial_error(&mesh, Point3::origin(), 0.5);
    assert!(mean < 0.01 && max < 0.02, "mean {mean}, max {max}");
}
