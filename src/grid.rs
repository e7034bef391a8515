//! Regular sampling grids and the scalar fields sampled on them

use crate::errors::ReconError;
use crate::float_types::Real;
use crate::oracle::{OccupancyOracle, checked_query};
use log::debug;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A regular lattice of `resolution[0] x resolution[1] x resolution[2]` samples.
///
/// Sample `(i, j, k)` sits at `b_min + (i, j, k) * step` with
/// `step = (b_max - b_min) / resolution`, so the last sample stops one step short of
/// `b_max`. Samples are stored x-slowest, z-fastest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingGrid {
    resolution: [usize; 3],
    b_min: Point3<Real>,
    b_max: Point3<Real>,
    step: Vector3<Real>,
}

impl SamplingGrid {
    pub fn new(
        resolution: [usize; 3],
        b_min: Point3<Real>,
        b_max: Point3<Real>,
    ) -> Result<Self, ReconError> {
        if resolution.iter().any(|&r| r < 2) {
            return Err(ReconError::InvalidResolution(resolution));
        }
        if (0..3).any(|i| !(b_min[i] < b_max[i])) {
            return Err(ReconError::InvalidBounds {
                min: b_min,
                max: b_max,
            });
        }
        let length = b_max - b_min;
        let step = Vector3::new(
            length.x / resolution[0] as Real,
            length.y / resolution[1] as Real,
            length.z / resolution[2] as Real,
        );
        Ok(Self {
            resolution,
            b_min,
            b_max,
            step,
        })
    }

    /// Same resolution on all three axes.
    pub fn cubic(
        resolution: usize,
        b_min: Point3<Real>,
        b_max: Point3<Real>,
    ) -> Result<Self, ReconError> {
        Self::new([resolution; 3], b_min, b_max)
    }

    pub const fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    pub const fn b_min(&self) -> Point3<Real> {
        self.b_min
    }

    pub const fn b_max(&self) -> Point3<Real> {
        self.b_max
    }

    pub const fn step(&self) -> Vector3<Real> {
        self.step
    }

    pub const fn len(&self) -> usize {
        self.resolution[0] * self.resolution[1] * self.resolution[2]
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub const fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.resolution[1] + y) * self.resolution[2] + z
    }

    #[inline]
    pub const fn delinearize(&self, i: usize) -> [usize; 3] {
        let z = i % self.resolution[2];
        let xy = i / self.resolution[2];
        let y = xy % self.resolution[1];
        let x = xy / self.resolution[1];
        [x, y, z]
    }

    /// World position of sample `(x, y, z)`.
    #[inline]
    pub fn point(&self, x: usize, y: usize, z: usize) -> Point3<Real> {
        self.to_world(&Point3::new(x as Real, y as Real, z as Real))
    }

    /// Map fractional grid coordinates to world coordinates.
    #[inline]
    pub fn to_world(&self, grid_coords: &Point3<Real>) -> Point3<Real> {
        self.b_min + grid_coords.coords.component_mul(&self.step)
    }

    /// Every sample position in storage order.
    pub fn points(&self) -> Vec<Point3<Real>> {
        (0..self.len())
            .map(|i| {
                let [x, y, z] = self.delinearize(i);
                self.point(x, y, z)
            })
            .collect()
    }
}

/// One value per sample of a [`SamplingGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    grid: SamplingGrid,
    values: Vec<Real>,
}

impl ScalarField {
    pub fn new(grid: SamplingGrid, values: Vec<Real>) -> Result<Self, ReconError> {
        if values.len() != grid.len() {
            return Err(ReconError::OracleLength {
                expected: grid.len(),
                got: values.len(),
            });
        }
        Ok(Self { grid, values })
    }

    /// Evaluate `f` at every sample. Mostly useful for analytic fields and tests.
    pub fn from_fn<F>(grid: SamplingGrid, f: F) -> Self
    where
        F: Fn(&Point3<Real>) -> Real,
    {
        let values = grid.points().iter().map(f).collect();
        Self { grid, values }
    }

    pub const fn grid(&self) -> &SamplingGrid {
        &self.grid
    }

    pub fn values(&self) -> &[Real] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Real> {
        self.values
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Real {
        self.values[self.grid.index(x, y, z)]
    }
}

/// Query `oracle` in chunks of at most `num_samples` points and concatenate the answers
/// in input order.
#[cfg(not(feature = "parallel"))]
pub fn batch_eval<O: OccupancyOracle + ?Sized>(
    oracle: &O,
    points: &[Point3<Real>],
    num_samples: usize,
) -> Result<Vec<Real>, ReconError> {
    let chunk = num_samples.max(1);
    let mut values = Vec::with_capacity(points.len());
    for batch in points.chunks(chunk) {
        values.extend(checked_query(oracle, batch)?);
    }
    debug!("evaluated {} points in batches of {}", points.len(), chunk);
    Ok(values)
}

/// Query `oracle` in chunks of at most `num_samples` points, chunks running on the rayon
/// pool, and concatenate the answers in input order.
#[cfg(feature = "parallel")]
pub fn batch_eval<O: OccupancyOracle + ?Sized>(
    oracle: &O,
    points: &[Point3<Real>],
    num_samples: usize,
) -> Result<Vec<Real>, ReconError> {
    let chunk = num_samples.max(1);
    let batches: Vec<Vec<Real>> = points
        .par_chunks(chunk)
        .map(|batch| checked_query(oracle, batch))
        .collect::<Result<_, _>>()?;
    debug!("evaluated {} points in batches of {}", points.len(), chunk);
    Ok(batches.concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ImplicitOracle;
    use approx::assert_relative_eq;

    #[test]
    fn samples_stop_one_step_short_of_the_max_corner() {
        let grid = SamplingGrid::cubic(4, Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
            .unwrap();
        assert_relative_eq!(grid.step(), Vector3::new(0.5, 0.5, 0.5));
        assert_relative_eq!(grid.point(0, 0, 0), Point3::new(-1.0, -1.0, -1.0));
        assert_relative_eq!(grid.point(3, 3, 3), Point3::new(0.5, 0.5, 0.5));
        assert_relative_eq!(grid.to_world(&Point3::new(1.5, 0.0, 2.0)), Point3::new(-0.25, -1.0, 0.0));
    }

    #[test]
    fn storage_is_x_slowest_z_fastest() {
        let grid = SamplingGrid::new([2, 3, 4], Point3::origin(), Point3::new(1.0, 1.0, 1.0)).unwrap();
        assert_eq!(grid.len(), 24);
        assert_eq!(grid.index(0, 0, 1), 1);
        assert_eq!(grid.index(0, 1, 0), 4);
        assert_eq!(grid.index(1, 0, 0), 12);
        for i in 0..grid.len() {
            let [x, y, z] = grid.delinearize(i);
            assert_eq!(grid.index(x, y, z), i);
        }
        let points = grid.points();
        assert_relative_eq!(points[13], grid.point(1, 0, 1));
    }

    #[test]
    fn invalid_grids_are_rejected() {
        assert!(matches!(
            SamplingGrid::new([1, 4, 4], Point3::origin(), Point3::new(1.0, 1.0, 1.0)),
            Err(ReconError::InvalidResolution(_))
        ));
        assert!(matches!(
            SamplingGrid::cubic(4, Point3::new(0.0, 1.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
            Err(ReconError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn batch_eval_preserves_order_across_chunks() {
        let oracle = ImplicitOracle::new(|p: &Point3<Real>| p.x);
        let points: Vec<_> = (0..10).map(|i| Point3::new(i as Real, 0.0, 0.0)).collect();
        let values = batch_eval(&oracle, &points, 3).unwrap();
        assert_eq!(values, (0..10).map(|i| i as Real).collect::<Vec<_>>());
    }

    #[test]
    fn batch_eval_rejects_short_answers() {
        struct Lazy;
        impl OccupancyOracle for Lazy {
            fn query(&self, _: &[Point3<Real>]) -> Result<Vec<Real>, ReconError> {
                Ok(vec![0.0])
            }
        }
        let points = vec![Point3::origin(); 4];
        assert!(matches!(
            batch_eval(&Lazy, &points, 2),
            Err(ReconError::OracleLength { expected: 2, got: 1 })
        ));
    }
}
