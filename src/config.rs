//! Run configuration for the `pifurs` binary.
//!
//! A run file is TOML:
//!
//! ```toml
//! model = "weights/mlp.json"
//! results_path = "results"
//! name = "demo"
//! projection = "orthogonal"
//!
//! [recon]
//! resolution = 256
//!
//! [[subjects]]
//! name = "subject_0"
//!
//! [[subjects.views]]
//! features = "subject_0/front.png"
//! calibration = [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]]
//! ```
//!
//! Relative paths are resolved against the directory holding the run file.

use crate::errors::ReconError;
use crate::features::FeatureMap;
use crate::float_types::Real;
use crate::io::IoError;
use crate::oracle::{DepthNormalizer, View};
use crate::projection::{Calibration, ImageTransform, ProjectionMode, WorldTransform};
use crate::reconstruct::ReconConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One calibrated input view of a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Image, or JSON feature tensor when the extension is `.json`
    pub features: PathBuf,
    /// Rows of the 3x4 `[R | t]` matrix
    pub calibration: [[Real; 4]; 3],
    /// Rows of the optional 2x3 image-plane transform
    #[serde(default)]
    pub transform: Option<[[Real; 3]; 2]>,
}

impl ViewConfig {
    pub fn load(&self) -> Result<View, ReconError> {
        let view = View::new(
            Calibration::from_rows(self.calibration),
            FeatureMap::open(&self.features)?,
        );
        Ok(match self.transform {
            Some(rows) => view.with_transform(ImageTransform::from_rows(rows)),
            None => view,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectConfig {
    pub name: String,
    /// Rows of the 4x4 world calibration, if the mesh should be placed in world space
    #[serde(default)]
    pub calib_world: Option<[[Real; 4]; 4]>,
    pub views: Vec<ViewConfig>,
}

impl SubjectConfig {
    pub fn world_transform(&self) -> Result<Option<WorldTransform>, ReconError> {
        self.calib_world.map(WorldTransform::from_rows).transpose()
    }

    pub fn load_views(&self) -> Result<Vec<View>, ReconError> {
        self.views.iter().map(ViewConfig::load).collect()
    }
}

fn default_results_path() -> PathBuf {
    PathBuf::from("results")
}

fn default_name() -> String {
    "example".to_string()
}

const fn unbounded() -> i64 {
    -1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Decoder weights (JSON)
    pub model: PathBuf,
    #[serde(default = "default_results_path")]
    pub results_path: PathBuf,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub projection: ProjectionMode,
    #[serde(default)]
    pub depth: DepthNormalizer,
    #[serde(default)]
    pub recon: ReconConfig,
    /// First subject to process; negative starts at the beginning
    #[serde(default = "unbounded")]
    pub start_id: i64,
    /// One past the last subject; negative runs to the end
    #[serde(default = "unbounded")]
    pub end_id: i64,
    #[serde(default)]
    pub subjects: Vec<SubjectConfig>,
}

impl RunConfig {
    /// Parse a run file. Paths are left as written.
    pub fn from_toml_str(text: &str) -> Result<Self, ReconError> {
        let config: Self = toml::from_str(text).map_err(IoError::from)?;
        config.recon.validate()?;
        Ok(config)
    }

    /// Read and parse `path`, resolving relative paths against its directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReconError> {
        let path = path.as_ref();
        let mut config = Self::from_toml_str(&fs::read_to_string(path)?)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        Ok(config)
    }

    /// Prefix every relative path with `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.model);
        resolve(&mut self.results_path);
        for view in self.subjects.iter_mut().flat_map(|s| s.views.iter_mut()) {
            resolve(&mut view.features);
        }
    }

    /// Subjects in `[start_id, end_id)`, clamped to the list.
    pub fn selected_subjects(&self) -> &[SubjectConfig] {
        let len = self.subjects.len();
        let end = if self.end_id < 0 { len } else { (self.end_id as usize).min(len) };
        let start = if self.start_id < 0 { 0 } else { (self.start_id as usize).min(end) };
        &self.subjects[start..end]
    }

    /// `<results_path>/<name>/recon/result_<subject>.obj`
    pub fn output_path(&self, subject: &SubjectConfig) -> PathBuf {
        self.results_path
            .join(&self.name)
            .join("recon")
            .join(format!("result_{}.obj", subject.name))
    }
}
