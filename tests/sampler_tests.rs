mod support;

use nalgebra::Point3;
use pifurs::float_types::Real;
use pifurs::grid::SamplingGrid;
use pifurs::marching_cubes::marching_cubes;
use pifurs::oracle::{ImplicitOracle, OccupancyOracle, soft_sphere};
use pifurs::sampler::{DenseSampler, OctreeSampler, VolumeSampler};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

fn unit_grid(res: usize) -> SamplingGrid {
    SamplingGrid::cubic(res, Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0)).unwrap()
}

#[test]
fn octree_agrees_with_dense_sampling_on_a_sphere() {
    let oracle = soft_sphere(Point3::new(0.1, 0.0, -0.05), 0.55, 30.0);
    let grid = unit_grid(48);

    let dense = DenseSampler::default().sample(&grid, &oracle).unwrap();
    let octree = OctreeSampler {
        init_resolution: 12,
        ..Default::default()
    }
    .sample(&grid, &oracle)
    .unwrap();

    assert_eq!(octree.stats.total(), grid.len());
    assert!(octree.stats.evaluated < dense.stats.evaluated / 2);

    // interpolated samples sit in near-uniform cells, so they stay close to the truth
    // and almost never land on the other side of the iso-value
    let mut flipped = 0;
    for (d, o) in dense.field.values().iter().zip(octree.field.values()) {
        assert!((d - o).abs() < 0.15, "dense {d} vs octree {o}");
        if (*d > 0.5) != (*o > 0.5) {
            flipped += 1;
        }
    }
    assert!(flipped * 1000 <= grid.len(), "{flipped} samples changed sides");

    let a = marching_cubes(&dense.field, 0.5);
    let b = marching_cubes(&octree.field, 0.5);
    support::assert_closed(&a);
    support::assert_closed(&b);
    approx::assert_relative_eq!(a.signed_volume(), b.signed_volume(), max_relative = 0.02);
}

/// Forwards to `inner` and keeps every point it was asked about.
struct Recording<O> {
    inner: O,
    seen: Mutex<Vec<Point3<Real>>>,
}

impl<O: OccupancyOracle> OccupancyOracle for Recording<O> {
    fn query(&self, points: &[Point3<Real>]) -> Result<Vec<Real>, pifurs::ReconError> {
        self.seen.lock().unwrap().extend_from_slice(points);
        self.inner.query(points)
    }
}

/// Sample `grid` both ways and check that every sample the octree asked the oracle
/// about holds exactly the dense value, each asked once.
fn assert_evaluated_samples_match_dense(grid: &SamplingGrid, sampler: OctreeSampler) {
    let oracle = Recording {
        inner: soft_sphere(Point3::new(0.05, -0.1, 0.0), 0.6, 25.0),
        seen: Mutex::new(Vec::new()),
    };
    let octree = sampler.sample(grid, &oracle).unwrap();
    let dense = DenseSampler::default().sample(grid, &oracle.inner).unwrap();

    assert_eq!(octree.stats.total(), grid.len());
    assert!(octree.stats.interpolated > 0);

    let key = |p: &Point3<Real>| [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
    let by_point: hashbrown::HashMap<_, usize> =
        grid.points().iter().enumerate().map(|(i, p)| (key(p), i)).collect();

    let seen = oracle.seen.into_inner().unwrap();
    assert_eq!(seen.len(), octree.stats.evaluated);
    let mut visited = hashbrown::HashSet::new();
    for p in &seen {
        let i = by_point[&key(p)];
        assert!(visited.insert(i), "sample {i} queried twice");
        assert_eq!(octree.field.values()[i], dense.field.values()[i]);
    }

    support::assert_closed(&marching_cubes(&octree.field, 0.5));
}

#[test]
fn octree_handles_non_cubic_grids() {
    let grid = SamplingGrid::new(
        [40, 17, 23],
        Point3::new(-1.0, -1.0, -1.0),
        Point3::new(1.0, 1.0, 1.0),
    )
    .unwrap();
    let sampler = OctreeSampler {
        init_resolution: 5,
        ..Default::default()
    };
    assert_eq!(sampler.initial_stride(&grid), 8);
    assert_evaluated_samples_match_dense(&grid, sampler);
}

#[test]
fn octree_handles_odd_initial_stride() {
    let grid = unit_grid(96);
    let sampler = OctreeSampler {
        init_resolution: 32,
        ..Default::default()
    };
    assert_eq!(sampler.initial_stride(&grid), 3);
    assert_evaluated_samples_match_dense(&grid, sampler);
}

#[test]
fn octree_never_queries_a_sample_twice() {
    struct Counting {
        calls: AtomicUsize,
        points: AtomicUsize,
    }
    impl OccupancyOracle for Counting {
        fn query(&self, points: &[Point3<Real>]) -> Result<Vec<Real>, pifurs::ReconError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.points.fetch_add(points.len(), Ordering::Relaxed);
            Ok(points.iter().map(|p| if p.coords.norm() < 0.4 { 1.0 } else { 0.0 }).collect())
        }
    }

    let oracle = Counting {
        calls: AtomicUsize::new(0),
        points: AtomicUsize::new(0),
    };
    let grid = unit_grid(32);
    let sampler = OctreeSampler {
        init_resolution: 4,
        threshold: 0.05,
        num_samples: 500,
    };
    let volume = sampler.sample(&grid, &oracle).unwrap();

    assert_eq!(oracle.points.load(Ordering::Relaxed), volume.stats.evaluated);
    assert!(oracle.calls.load(Ordering::Relaxed) >= volume.stats.evaluated / 500);
    assert_eq!(volume.stats.levels, 4);
}

#[test]
fn resolution_below_init_resolution_is_dense() {
    let oracle = ImplicitOracle::new(|p: &Point3<Real>| p.y);
    let grid = unit_grid(16);
    let volume = OctreeSampler::default().sample(&grid, &oracle).unwrap();
    let dense = DenseSampler::new(7).sample(&grid, &oracle).unwrap();
    assert_eq!(volume.field, dense.field);
    assert_eq!(volume.stats.interpolated, 0);
}
