// main.rs
//
// Batch reconstruction driver: reads a TOML run file, reconstructs every selected
// subject with the configured decoder and writes one colored OBJ per subject.

use anyhow::{Context, Result, bail};
use log::{info, warn};
use pifurs::config::{RunConfig, SubjectConfig};
use pifurs::oracle::{MlpDecoder, PixelAlignedOracle};
use pifurs::reconstruct::Reconstructor;
use std::path::PathBuf;
use std::time::Instant;

fn init_logging() {
    // RUST_LOG wins when set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn run_subject(
    config: &RunConfig,
    reconstructor: &Reconstructor,
    decoder: &MlpDecoder,
    subject: &SubjectConfig,
) -> Result<PathBuf> {
    let views = subject
        .load_views()
        .with_context(|| format!("loading views of {}", subject.name))?;
    let oracle = PixelAlignedOracle::new(views, config.projection, config.depth, decoder)?;
    let world = subject.world_transform()?;

    let recon = reconstructor.generate(&oracle, world.as_ref())?;

    let path = config.output_path(subject);
    recon
        .mesh
        .save_obj(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn main() -> Result<()> {
    init_logging();

    let Some(config_path) = std::env::args().nth(1) else {
        bail!("usage: pifurs <config.toml>");
    };
    let config = RunConfig::load(&config_path)
        .with_context(|| format!("reading run configuration {config_path}"))?;
    let decoder = MlpDecoder::open(&config.model)
        .with_context(|| format!("loading decoder weights {}", config.model.display()))?;
    let reconstructor = Reconstructor::new(config.recon.clone())?;

    let subjects = config.selected_subjects();
    info!(
        "run '{}': {} subject(s), resolution {}, octree {}",
        config.name,
        subjects.len(),
        config.recon.resolution,
        config.recon.use_octree
    );

    let mut failed = 0;
    for subject in subjects {
        let started = Instant::now();
        info!("reconstructing {}", subject.name);
        match run_subject(&config, &reconstructor, &decoder, subject) {
            Ok(path) => info!("{} -> {} in {:.2?}", subject.name, path.display(), started.elapsed()),
            Err(e) => {
                warn!("{}: {e:#}", subject.name);
                failed += 1;
            },
        }
    }

    if failed > 0 {
        warn!("{failed} of {} subject(s) failed", subjects.len());
    }
    Ok(())
}
