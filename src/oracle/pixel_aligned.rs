//! Pixel-aligned implicit function oracle.
//!
//! Every query point is projected into each calibrated view, the view's feature map is
//! sampled at the projected location, and a spatial encoding of the projected depth is
//! appended. A [`PointDecoder`] turns the stacked per-view features into an occupancy.

use crate::errors::ReconError;
use crate::features::FeatureMap;
use crate::float_types::Real;
use crate::oracle::traits::{OccupancyOracle, PointDecoder};
use crate::projection::{
    CanonicalCube, Calibration, ImageTransform, ProjectionMode, project_point,
};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One calibrated input image and its feature map.
#[derive(Debug, Clone)]
pub struct View {
    pub calibration: Calibration,
    pub transform: Option<ImageTransform>,
    pub features: FeatureMap,
}

impl View {
    pub fn new(calibration: Calibration, features: FeatureMap) -> Self {
        Self {
            calibration,
            transform: None,
            features,
        }
    }

    pub fn with_transform(mut self, transform: ImageTransform) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// Spatial encoding of projected depth: `z * (load_size / 2) / z_size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthNormalizer {
    /// Input image size the network was trained on
    pub load_size: u32,
    /// Depth range the encoding is normalized by
    pub z_size: Real,
}

impl Default for DepthNormalizer {
    fn default() -> Self {
        Self {
            load_size: 512,
            z_size: 200.0,
        }
    }
}

impl DepthNormalizer {
    #[inline]
    pub fn encode(&self, z: Real) -> Real {
        z * (self.load_size / 2) as Real / self.z_size
    }
}

/// Queries a decoder with features sampled at each point's image projections.
pub struct PixelAlignedOracle<D> {
    views: Vec<View>,
    projection: ProjectionMode,
    depth: DepthNormalizer,
    decoder: D,
}

impl<D: PointDecoder> PixelAlignedOracle<D> {
    /// Checks that there is at least one view, that all feature maps agree on their
    /// channel count, and that the decoder expects those channels plus the depth feature.
    pub fn new(
        views: Vec<View>,
        projection: ProjectionMode,
        depth: DepthNormalizer,
        decoder: D,
    ) -> Result<Self, ReconError> {
        let first = views.first().ok_or(ReconError::NoViews)?;
        let channels = first.features.channels();
        if let Some(v) = views.iter().find(|v| v.features.channels() != channels) {
            return Err(ReconError::ChannelMismatch {
                expected: channels,
                got: v.features.channels(),
            });
        }
        if decoder.input_channels() != channels + 1 {
            return Err(ReconError::ChannelMismatch {
                expected: decoder.input_channels(),
                got: channels + 1,
            });
        }

        Ok(Self {
            views,
            projection,
            depth,
            decoder,
        })
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub const fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Occupancy of one point, with `buffer` reused across calls.
    fn query_point(&self, p: &Point3<Real>, buffer: &mut [Real]) -> Real {
        let stride = self.decoder.input_channels();

        for (i, (view, block)) in self.views.iter().zip(buffer.chunks_exact_mut(stride)).enumerate() {
            let xyz = project_point(p, &view.calibration, view.transform.as_ref(), self.projection);
            // the reference view decides what lies inside the reconstruction volume
            if i == 0 && !CanonicalCube::contains(&xyz) {
                return 0.0;
            }
            let (image, depth) = block.split_at_mut(stride - 1);
            view.features.sample_into(xyz.x, xyz.y, image);
            depth[0] = self.depth.encode(xyz.z);
        }

        self.decoder.decode(buffer, self.views.len())
    }
}

impl<D: PointDecoder> OccupancyOracle for PixelAlignedOracle<D> {
    #[cfg(not(feature = "parallel"))]
    fn query(&self, points: &[Point3<Real>]) -> Result<Vec<Real>, ReconError> {
        let mut buffer = vec![0.0; self.views.len() * self.decoder.input_channels()];
        Ok(points
            .iter()
            .map(|p| self.query_point(p, &mut buffer))
            .collect())
    }

    #[cfg(feature = "parallel")]
    fn query(&self, points: &[Point3<Real>]) -> Result<Vec<Real>, ReconError> {
        let len = self.views.len() * self.decoder.input_channels();
        Ok(points
            .par_iter()
            .map_init(|| vec![0.0; len], |buffer, p| self.query_point(p, buffer))
            .collect())
    }
}
