//! Camera projection of world points into normalized image space.
//!
//! A [`Calibration`] is the `[R | t]` part of a camera: it maps a world point into a
//! camera frame whose x/y are normalized image coordinates and whose z is depth. After
//! projection, everything that matters to a pixel-aligned query lives inside the
//! [`CanonicalCube`] `[-1, 1]^3`; anything outside is treated as empty space.

use crate::errors::ReconError;
use crate::float_types::{Real, tolerance};
use nalgebra::{Matrix2, Matrix3, Matrix4, Point3, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// How camera-space points turn into image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    /// Scaled orthographic camera: `xyz = R p + t`
    #[default]
    Orthogonal,
    /// Pinhole camera: `xy = (R p + t).xy / (R p + t).z`, depth kept in z
    Perspective,
}

/// The 3x4 world-to-camera matrix of one view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub rotation: Matrix3<Real>,
    pub translation: Vector3<Real>,
}

impl Calibration {
    pub const fn new(rotation: Matrix3<Real>, translation: Vector3<Real>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Build from three rows of `[r0, r1, r2, t]`.
    pub fn from_rows(rows: [[Real; 4]; 3]) -> Self {
        let rotation = Matrix3::new(
            rows[0][0], rows[0][1], rows[0][2], //
            rows[1][0], rows[1][1], rows[1][2], //
            rows[2][0], rows[2][1], rows[2][2],
        );
        let translation = Vector3::new(rows[0][3], rows[1][3], rows[2][3]);
        Self::new(rotation, translation)
    }

    /// Camera looking down +z with the world already in normalized coordinates.
    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    /// `R p + t`
    #[inline]
    pub fn to_camera(&self, p: &Point3<Real>) -> Vector3<Real> {
        self.rotation * p.coords + self.translation
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::identity()
    }
}

/// Optional 2x3 image-space transform applied after projection: `xy' = S xy + s`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageTransform {
    pub scale: Matrix2<Real>,
    pub shift: Vector2<Real>,
}

impl ImageTransform {
    /// Build from two rows of `[s0, s1, shift]`.
    pub fn from_rows(rows: [[Real; 3]; 2]) -> Self {
        Self {
            scale: Matrix2::new(rows[0][0], rows[0][1], rows[1][0], rows[1][1]),
            shift: Vector2::new(rows[0][2], rows[1][2]),
        }
    }

    #[inline]
    pub fn apply(&self, xy: Vector2<Real>) -> Vector2<Real> {
        self.scale * xy + self.shift
    }
}

/// Project a single point. Perspective projections of points (nearly) on the camera
/// plane come back non-finite, which [`CanonicalCube::contains`] rejects.
pub fn project_point(
    p: &Point3<Real>,
    calibration: &Calibration,
    transform: Option<&ImageTransform>,
    mode: ProjectionMode,
) -> Point3<Real> {
    let h = calibration.to_camera(p);
    let mut xy = match mode {
        ProjectionMode::Orthogonal => Vector2::new(h.x, h.y),
        ProjectionMode::Perspective => {
            if h.z.abs() < tolerance() {
                Vector2::new(Real::NAN, Real::NAN)
            } else {
                Vector2::new(h.x / h.z, h.y / h.z)
            }
        },
    };
    if let Some(t) = transform {
        xy = t.apply(xy);
    }
    Point3::new(xy.x, xy.y, h.z)
}

/// Project a batch of points with the same camera.
pub fn project(
    points: &[Point3<Real>],
    calibration: &Calibration,
    transform: Option<&ImageTransform>,
    mode: ProjectionMode,
) -> Vec<Point3<Real>> {
    points
        .iter()
        .map(|p| project_point(p, calibration, transform, mode))
        .collect()
}

/// The canonical `[-1, 1]^3` bounding cube of projected space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanonicalCube;

impl CanonicalCube {
    pub const MIN: Real = -1.0;
    pub const MAX: Real = 1.0;

    /// True iff every coordinate lies in `[-1, 1]`. NaN is never contained.
    #[inline]
    pub fn contains(p: &Point3<Real>) -> bool {
        p.coords
            .iter()
            .all(|&c| (Self::MIN..=Self::MAX).contains(&c))
    }

    pub fn min() -> Point3<Real> {
        Point3::new(Self::MIN, Self::MIN, Self::MIN)
    }

    pub fn max() -> Point3<Real> {
        Point3::new(Self::MAX, Self::MAX, Self::MAX)
    }
}

/// A 4x4 world calibration. Reconstructed vertices live in the normalized model frame
/// and are brought back to the world frame with the inverse of this matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    matrix: Matrix4<Real>,
    inverse: Matrix4<Real>,
}

impl WorldTransform {
    pub fn new(matrix: Matrix4<Real>) -> Result<Self, ReconError> {
        let inverse = matrix.try_inverse().ok_or(ReconError::SingularTransform)?;
        Ok(Self { matrix, inverse })
    }

    pub fn from_rows(rows: [[Real; 4]; 4]) -> Result<Self, ReconError> {
        let flat: Vec<Real> = rows.iter().flatten().copied().collect();
        Self::new(Matrix4::from_row_slice(&flat))
    }

    pub const fn matrix(&self) -> &Matrix4<Real> {
        &self.matrix
    }

    /// `(C^-1 [v; 1]).xyz`, without a homogeneous divide.
    #[inline]
    pub fn model_to_world(&self, v: &Point3<Real>) -> Point3<Real> {
        let h = self.inverse * Vector4::new(v.x, v.y, v.z, 1.0);
        Point3::new(h.x, h.y, h.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn orthogonal_projection_applies_rotation_translation_and_transform() {
        let calib = Calibration::from_rows([
            [0.0, -1.0, 0.0, 0.1],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, -0.2],
        ]);
        let transform = ImageTransform::from_rows([[2.0, 0.0, 0.5], [0.0, 2.0, -0.5]]);
        let p = Point3::new(0.25, 0.5, 0.4);

        let xyz = project_point(&p, &calib, Some(&transform), ProjectionMode::Orthogonal);
        // camera: (-0.5 + 0.1, 0.25, 0.2)
        assert_relative_eq!(xyz, Point3::new(2.0 * -0.4 + 0.5, 2.0 * 0.25 - 0.5, 0.2), epsilon = 1e-12);
    }

    #[test]
    fn perspective_projection_divides_by_depth() {
        let calib = Calibration::new(Matrix3::identity(), Vector3::new(0.0, 0.0, 2.0));
        let xyz = project_point(
            &Point3::new(1.0, -0.5, 2.0),
            &calib,
            None,
            ProjectionMode::Perspective,
        );
        assert_relative_eq!(xyz, Point3::new(0.25, -0.125, 4.0), epsilon = 1e-12);

        let on_plane = project_point(
            &Point3::new(1.0, 1.0, -2.0),
            &calib,
            None,
            ProjectionMode::Perspective,
        );
        assert!(!CanonicalCube::contains(&on_plane));
    }

    #[test]
    fn canonical_cube_is_inclusive() {
        assert!(CanonicalCube::contains(&Point3::new(1.0, -1.0, 0.0)));
        assert!(!CanonicalCube::contains(&Point3::new(1.0 + 1e-6, 0.0, 0.0)));
        assert!(!CanonicalCube::contains(&Point3::new(Real::NAN, 0.0, 0.0)));
    }

    #[test]
    fn world_transform_inverts_the_calibration() {
        let world = WorldTransform::from_rows([
            [2.0, 0.0, 0.0, 1.0],
            [0.0, 2.0, 0.0, 0.0],
            [0.0, 0.0, 2.0, -1.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
        .unwrap();
        let v = world.model_to_world(&Point3::new(3.0, 2.0, 1.0));
        assert_relative_eq!(v, Point3::new(1.0, 1.0, 1.0), epsilon = 1e-12);

        assert!(matches!(
            WorldTransform::new(Matrix4::zeros()),
            Err(ReconError::SingularTransform)
        ));
    }
}
