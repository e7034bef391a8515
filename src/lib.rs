//! **Pixel-aligned implicit function (PIFu) surface reconstruction.**
//!
//! Given a predictor that maps a 3D point and per-view image features to an occupancy
//! probability, `pifurs` samples the predictor over a bounded volume (optionally with
//! octree acceleration), extracts the 0.5 iso-surface with marching cubes, colors every
//! vertex by its finite-difference normal and writes the result as a colored mesh.
//!
//! ```rust
//! use pifurs::oracle::soft_sphere;
//! use pifurs::reconstruct::{ReconConfig, Reconstructor};
//! use nalgebra::Point3;
//!
//! let config = ReconConfig { resolution: 32, ..Default::default() };
//! let oracle = soft_sphere(Point3::origin(), 0.5, 20.0);
//! let recon = Reconstructor::new(config)?.generate(&oracle, None)?;
//! assert!(recon.mesh.is_watertight());
//! # Ok::<(), pifurs::errors::ReconError>(())
//! ```
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): `.stl` import/export
//! - **image-io**: load view images as 3-channel feature maps
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **parallel**: use rayon for batched oracle queries

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod colorize;
pub mod config;
pub mod errors;
pub mod features;
pub mod float_types;
pub mod grid;
pub mod io;
pub mod marching_cubes;
pub mod mesh;
pub mod oracle;
pub mod projection;
pub mod reconstruct;
pub mod sampler;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use errors::ReconError;
pub use mesh::ReconstructedMesh;
pub use reconstruct::{ReconConfig, Reconstruction, Reconstructor};
