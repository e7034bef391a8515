//! Point-wise multilayer perceptron decoder.
//!
//! The decoder is the tail of a pixel-aligned implicit function: a stack of 1x1
//! convolutions, i.e. dense layers applied to every point independently.
//!
//! ## Forward pass
//! For each view `v` with input features `x_v`:
//! ```text
//! y_v = x_v
//! for layer l:
//!     y_v = W_l * (l ∈ res_layers ? [y_v; x_v] : y_v) + b_l
//!     y_v = leaky_relu(y_v)            (all but the last layer)
//!     if l == merge_layer and views > 1:
//!         y = mean_v(y_v), x = mean_v(x_v)
//! occupancy = last_op(y)
//! ```

use crate::errors::ReconError;
use crate::float_types::Real;
use crate::oracle::traits::PointDecoder;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Weights of a single dense layer, `weights` being `out x in` row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerWeights {
    pub weights: Vec<Vec<Real>>,
    pub bias: Vec<Real>,
}

/// Output non-linearity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LastOp {
    #[default]
    Sigmoid,
    None,
}

const fn default_leaky_slope() -> Real {
    0.01
}

/// Serialized form of a trained decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpWeights {
    pub layers: Vec<LayerWeights>,
    /// Layers whose input is concatenated with the decoder input
    #[serde(default)]
    pub res_layers: Vec<usize>,
    /// Layer after which multi-view activations are averaged; `layers.len() / 2` if absent
    #[serde(default)]
    pub merge_layer: Option<usize>,
    #[serde(default)]
    pub last_op: LastOp,
    #[serde(default = "default_leaky_slope")]
    pub leaky_slope: Real,
}

#[derive(Debug, Clone)]
struct Dense {
    weights: DMatrix<Real>,
    bias: DVector<Real>,
    residual: bool,
}

/// A validated, ready-to-run decoder.
#[derive(Debug, Clone)]
pub struct MlpDecoder {
    layers: Vec<Dense>,
    input_channels: usize,
    merge_layer: usize,
    last_op: LastOp,
    leaky_slope: Real,
}

impl MlpDecoder {
    pub fn new(weights: MlpWeights) -> Result<Self, ReconError> {
        let n_layers = weights.layers.len();
        if n_layers == 0 {
            return Err(ReconError::DecoderShape("decoder has no layers".into()));
        }
        if let Some(&bad) = weights.res_layers.iter().find(|&&l| l == 0 || l >= n_layers) {
            return Err(ReconError::DecoderShape(format!(
                "residual layer {bad} must be in 1..{n_layers}"
            )));
        }
        let merge_layer = weights.merge_layer.unwrap_or(n_layers / 2);
        if merge_layer >= n_layers {
            return Err(ReconError::DecoderShape(format!(
                "merge layer {merge_layer} must be below {n_layers}"
            )));
        }

        let input_channels = weights.layers[0].weights.first().map_or(0, Vec::len);
        if input_channels == 0 {
            return Err(ReconError::DecoderShape("first layer has no inputs".into()));
        }

        let mut layers = Vec::with_capacity(n_layers);
        let mut previous_out = input_channels;
        for (l, layer) in weights.layers.into_iter().enumerate() {
            let residual = weights.res_layers.contains(&l);
            let expected_in = if l == 0 {
                input_channels
            } else if residual {
                previous_out + input_channels
            } else {
                previous_out
            };
            let rows = layer.weights.len();
            if rows == 0 || rows != layer.bias.len() {
                return Err(ReconError::DecoderShape(format!(
                    "layer {l}: {rows} weight rows but {} biases",
                    layer.bias.len()
                )));
            }
            if let Some(row) = layer.weights.iter().find(|r| r.len() != expected_in) {
                return Err(ReconError::DecoderShape(format!(
                    "layer {l}: expected {expected_in} inputs, found a row of {}",
                    row.len()
                )));
            }
            let flat: Vec<Real> = layer.weights.iter().flatten().copied().collect();
            layers.push(Dense {
                weights: DMatrix::from_row_slice(rows, expected_in, &flat),
                bias: DVector::from_vec(layer.bias),
                residual,
            });
            previous_out = rows;
        }
        if previous_out != 1 {
            return Err(ReconError::DecoderShape(format!(
                "last layer must produce 1 value, produces {previous_out}"
            )));
        }

        Ok(Self {
            layers,
            input_channels,
            merge_layer,
            last_op: weights.last_op,
            leaky_slope: weights.leaky_slope,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ReconError> {
        let weights: MlpWeights = serde_json::from_str(json)?;
        Self::new(weights)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReconError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn mean(vectors: &[DVector<Real>]) -> DVector<Real> {
        let n = vectors[0].len();
        let sum = vectors
            .iter()
            .fold(DVector::zeros(n), |acc: DVector<Real>, v| acc + v);
        sum / vectors.len() as Real
    }
}

impl PointDecoder for MlpDecoder {
    fn input_channels(&self) -> usize {
        self.input_channels
    }

    fn decode(&self, features: &[Real], num_views: usize) -> Real {
        debug_assert!(num_views >= 1);
        debug_assert_eq!(features.len(), num_views * self.input_channels);

        let mut skips: Vec<DVector<Real>> = features
            .chunks_exact(self.input_channels)
            .take(num_views)
            .map(DVector::from_column_slice)
            .collect();
        let mut ys = skips.clone();
        let last = self.layers.len() - 1;

        for (l, layer) in self.layers.iter().enumerate() {
            for (y, skip) in ys.iter_mut().zip(&skips) {
                let mut out = if layer.residual {
                    let stacked = DVector::from_iterator(
                        y.len() + skip.len(),
                        y.iter().chain(skip.iter()).copied(),
                    );
                    &layer.weights * stacked + &layer.bias
                } else {
                    &layer.weights * &*y + &layer.bias
                };
                if l != last {
                    out.iter_mut()
                        .filter(|v| **v < 0.0)
                        .for_each(|v| *v *= self.leaky_slope);
                }
                *y = out;
            }
            if ys.len() > 1 && l == self.merge_layer {
                ys = vec![Self::mean(&ys)];
                skips = vec![Self::mean(&skips)];
            }
        }

        let y = ys[0][0];
        match self.last_op {
            LastOp::Sigmoid => 1.0 / (1.0 + (-y).exp()),
            LastOp::None => y,
        }
    }
}
