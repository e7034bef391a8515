//! Traits at the seam between the reconstruction pipeline and a trained predictor

use crate::errors::ReconError;
use crate::float_types::{NORMAL_EPSILON, Real};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Which finite-difference stencil to use when estimating a gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiniteDifference {
    /// `f(p + d) - f(p)`
    #[default]
    Forward,
    /// `f(p) - f(p - d)`
    Backward,
    /// `f(p + d) - f(p - d)`
    Central,
}

impl FiniteDifference {
    /// Number of oracle samples spent per point.
    pub const fn samples_per_point(self) -> usize {
        match self {
            FiniteDifference::Forward | FiniteDifference::Backward => 4,
            FiniteDifference::Central => 6,
        }
    }

    fn stencil(self, p: &Point3<Real>, delta: Real, out: &mut Vec<Point3<Real>>) {
        let axes = [Vector3::x(), Vector3::y(), Vector3::z()];
        match self {
            FiniteDifference::Forward => {
                out.push(*p);
                out.extend(axes.iter().map(|a| p + a * delta));
            },
            FiniteDifference::Backward => {
                out.push(*p);
                out.extend(axes.iter().map(|a| p - a * delta));
            },
            FiniteDifference::Central => {
                for a in &axes {
                    out.push(p + a * delta);
                    out.push(p - a * delta);
                }
            },
        }
    }

    fn gradient(self, f: &[Real]) -> Vector3<Real> {
        match self {
            FiniteDifference::Forward => Vector3::new(f[1] - f[0], f[2] - f[0], f[3] - f[0]),
            FiniteDifference::Backward => Vector3::new(f[0] - f[1], f[0] - f[2], f[0] - f[3]),
            FiniteDifference::Central => Vector3::new(f[0] - f[1], f[2] - f[3], f[4] - f[5]),
        }
    }
}

/// A queryable occupancy field: `> 0.5` inside the subject, `< 0.5` outside.
///
/// `query` is by far the most expensive call in the pipeline. Callers batch points and
/// implementors should treat each call as one forward pass.
pub trait OccupancyOracle: Sync {
    /// One occupancy value per point, in input order.
    fn query(&self, points: &[Point3<Real>]) -> Result<Vec<Real>, ReconError>;

    /// Outward unit normals estimated from finite differences of the occupancy.
    ///
    /// All perturbed samples go through a single [`OccupancyOracle::query`] call. The
    /// division by `delta` is skipped since the gradient is normalized anyway.
    fn normals(
        &self,
        points: &[Point3<Real>],
        delta: Real,
        scheme: FiniteDifference,
    ) -> Result<Vec<Vector3<Real>>, ReconError> {
        let per_point = scheme.samples_per_point();
        let mut samples = Vec::with_capacity(points.len() * per_point);
        for p in points {
            scheme.stencil(p, delta, &mut samples);
        }

        let values = checked_query(self, &samples)?;
        Ok(values
            .chunks_exact(per_point)
            .map(|f| {
                let g = -scheme.gradient(f);
                g / g.norm().max(NORMAL_EPSILON)
            })
            .collect())
    }
}

/// Run `query` and make sure the oracle answered once per point.
pub fn checked_query<O: OccupancyOracle + ?Sized>(
    oracle: &O,
    points: &[Point3<Real>],
) -> Result<Vec<Real>, ReconError> {
    let values = oracle.query(points)?;
    if values.len() != points.len() {
        return Err(ReconError::OracleLength {
            expected: points.len(),
            got: values.len(),
        });
    }
    Ok(values)
}

impl<T: OccupancyOracle + ?Sized> OccupancyOracle for &T {
    fn query(&self, points: &[Point3<Real>]) -> Result<Vec<Real>, ReconError> {
        (**self).query(points)
    }

    fn normals(
        &self,
        points: &[Point3<Real>],
        delta: Real,
        scheme: FiniteDifference,
    ) -> Result<Vec<Vector3<Real>>, ReconError> {
        (**self).normals(points, delta, scheme)
    }
}

impl<T: OccupancyOracle + ?Sized> OccupancyOracle for Box<T> {
    fn query(&self, points: &[Point3<Real>]) -> Result<Vec<Real>, ReconError> {
        (**self).query(points)
    }

    fn normals(
        &self,
        points: &[Point3<Real>],
        delta: Real,
        scheme: FiniteDifference,
    ) -> Result<Vec<Vector3<Real>>, ReconError> {
        (**self).normals(points, delta, scheme)
    }
}

/// Maps the stacked per-view features of one point to an occupancy.
pub trait PointDecoder: Sync {
    /// Feature length expected from each view.
    fn input_channels(&self) -> usize;

    /// `features` holds `num_views` consecutive blocks of `input_channels()` values.
    fn decode(&self, features: &[Real], num_views: usize) -> Real;
}

impl<T: PointDecoder + ?Sized> PointDecoder for &T {
    fn input_channels(&self) -> usize {
        (**self).input_channels()
    }

    fn decode(&self, features: &[Real], num_views: usize) -> Real {
        (**self).decode(features, num_views)
    }
}

impl<T: PointDecoder + ?Sized> PointDecoder for Box<T> {
    fn input_channels(&self) -> usize {
        (**self).input_channels()
    }

    fn decode(&self, features: &[Real], num_views: usize) -> Real {
        (**self).decode(features, num_views)
    }
}
