//! Analytic occupancy fields

use crate::errors::ReconError;
use crate::float_types::Real;
use crate::oracle::traits::OccupancyOracle;
use nalgebra::Point3;

/// Wraps a closure `Fn(&Point3<Real>) -> Real` as an [`OccupancyOracle`].
///
/// ```
/// # use pifurs::oracle::{ImplicitOracle, OccupancyOracle};
/// # use nalgebra::Point3;
/// let ball = ImplicitOracle::new(|p: &Point3<f64>| if p.coords.norm() < 0.5 { 1.0 } else { 0.0 });
/// assert_eq!(ball.query(&[Point3::origin()]).unwrap(), vec![1.0]);
/// ```
#[derive(Clone)]
pub struct ImplicitOracle<F> {
    field: F,
}

impl<F> ImplicitOracle<F>
where
    F: Fn(&Point3<Real>) -> Real + Sync,
{
    pub const fn new(field: F) -> Self {
        Self { field }
    }
}

impl<F> OccupancyOracle for ImplicitOracle<F>
where
    F: Fn(&Point3<Real>) -> Real + Sync,
{
    fn query(&self, points: &[Point3<Real>]) -> Result<Vec<Real>, ReconError> {
        Ok(points.iter().map(|p| (self.field)(p)).collect())
    }
}

/// A smooth ball: `sigmoid(sharpness * (radius - |p - center|))`.
///
/// Crosses 0.5 exactly on the sphere and is the field most tests and demos reconstruct.
pub fn soft_sphere(
    center: Point3<Real>,
    radius: Real,
    sharpness: Real,
) -> ImplicitOracle<impl Fn(&Point3<Real>) -> Real + Sync + Clone> {
    ImplicitOracle::new(move |p: &Point3<Real>| {
        let d = radius - (p - center).norm();
        1.0 / (1.0 + (-sharpness * d).exp())
    })
}
