//! Per-view image feature maps and pixel-aligned sampling.

use crate::errors::ReconError;
use crate::float_types::Real;
use crate::io::IoError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A `channels x height x width` feature tensor, stored channel-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMap {
    channels: usize,
    height: usize,
    width: usize,
    data: Vec<Real>,
}

impl FeatureMap {
    pub fn new(
        channels: usize,
        height: usize,
        width: usize,
        data: Vec<Real>,
    ) -> Result<Self, ReconError> {
        let map = Self {
            channels,
            height,
            width,
            data,
        };
        map.validate()?;
        Ok(map)
    }

    /// A map filled with a constant per channel.
    pub fn constant(values: &[Real], height: usize, width: usize) -> Result<Self, ReconError> {
        let data = values
            .iter()
            .flat_map(|&v| std::iter::repeat_n(v, height * width))
            .collect();
        Self::new(values.len(), height, width, data)
    }

    fn validate(&self) -> Result<(), ReconError> {
        if self.channels == 0 || self.height == 0 || self.width == 0 {
            return Err(ReconError::FeatureShape(format!(
                "feature map dimensions must be non-zero, got {}x{}x{}",
                self.channels, self.height, self.width
            )));
        }
        let expected = self.channels * self.height * self.width;
        if self.data.len() != expected {
            return Err(ReconError::FeatureShape(format!(
                "expected {} values for {}x{}x{}, got {}",
                expected,
                self.channels,
                self.height,
                self.width,
                self.data.len()
            )));
        }
        Ok(())
    }

    pub const fn channels(&self) -> usize {
        self.channels
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn at(&self, c: usize, y: usize, x: usize) -> Real {
        self.data[(c * self.height + y) * self.width + x]
    }

    /// Bilinearly sample every channel at normalized image coordinates `(u, v)`.
    ///
    /// `u = -1` is the center of the leftmost column and `u = 1` the center of the
    /// rightmost one (corner-aligned). Taps that fall outside the map contribute zero,
    /// so points projecting off-image fade to a zero feature. `out` must hold
    /// `channels()` values.
    pub fn sample_into(&self, u: Real, v: Real, out: &mut [Real]) {
        debug_assert_eq!(out.len(), self.channels);
        out.iter_mut().for_each(|o| *o = 0.0);
        if !(u.is_finite() && v.is_finite()) {
            return;
        }

        let x = (u + 1.0) * 0.5 * (self.width as Real - 1.0);
        let y = (v + 1.0) * 0.5 * (self.height as Real - 1.0);
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let taps = [
            (x0, y0, (1.0 - fx) * (1.0 - fy)),
            (x0 + 1.0, y0, fx * (1.0 - fy)),
            (x0, y0 + 1.0, (1.0 - fx) * fy),
            (x0 + 1.0, y0 + 1.0, fx * fy),
        ];

        for (tx, ty, w) in taps {
            if w == 0.0
                || tx < 0.0
                || ty < 0.0
                || tx > self.width as Real - 1.0
                || ty > self.height as Real - 1.0
            {
                continue;
            }
            let (xi, yi) = (tx as usize, ty as usize);
            for (c, o) in out.iter_mut().enumerate() {
                *o += w * self.at(c, yi, xi);
            }
        }
    }

    /// Allocating variant of [`FeatureMap::sample_into`].
    pub fn sample(&self, u: Real, v: Real) -> Vec<Real> {
        let mut out = vec![0.0; self.channels];
        self.sample_into(u, v, &mut out);
        out
    }

    /// Read a JSON tensor `{ "channels", "height", "width", "data" }`.
    pub fn from_json_str(json: &str) -> Result<Self, ReconError> {
        let map: Self = serde_json::from_str(json)?;
        map.validate()?;
        Ok(map)
    }

    /// Load a feature map from disk. `.json` files are read as tensors; anything else
    /// is decoded as an image when the `image-io` feature is enabled.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReconError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            let text = std::fs::read_to_string(path)?;
            return Self::from_json_str(&text);
        }

        #[cfg(feature = "image-io")]
        {
            let img = ::image::open(path).map_err(IoError::from)?;
            Self::from_image(&img)
        }
        #[cfg(not(feature = "image-io"))]
        {
            Err(ReconError::Io(IoError::MalformedPath(format!(
                "{} is not a JSON tensor and image decoding is disabled",
                path.display()
            ))))
        }
    }
}

#[cfg(feature = "image-io")]
impl FeatureMap {
    /// Turn an RGB image into a 3-channel map normalized to `[-1, 1]`.
    pub fn from_image(img: &::image::DynamicImage) -> Result<Self, ReconError> {
        let rgb = img.to_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        let mut data = vec![0.0; 3 * width * height];
        for (x, y, pixel) in rgb.enumerate_pixels() {
            for c in 0..3 {
                let value = pixel.0[c] as Real / 255.0;
                data[(c * height + y as usize) * width + x as usize] = (value - 0.5) / 0.5;
            }
        }
        Self::new(3, height, width, data)
    }
}
