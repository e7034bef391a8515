mod support;

use pifurs::config::RunConfig;
use pifurs::oracle::{MlpDecoder, PixelAlignedOracle};
use pifurs::reconstruct::Reconstructor;
use std::fs;

const RUN: &str = r#"
model = "weights.json"
results_path = "out"
name = "sphere_run"

[recon]
resolution = 24

[recon.octree]
init_resolution = 6

[[subjects]]
name = "ball"
calib_world = [[2.0, 0.0, 0.0, 0.0], [0.0, 2.0, 0.0, 0.0], [0.0, 0.0, 2.0, 0.0], [0.0, 0.0, 0.0, 1.0]]

[[subjects.views]]
features = "ball/front.json"
calibration = [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]]
"#;

#[test]
fn run_file_drives_a_full_reconstruction() {
    let dir = support::scratch_dir("run");
    fs::create_dir_all(dir.join("ball")).unwrap();
    fs::write(dir.join("run.toml"), RUN).unwrap();
    fs::write(
        dir.join("weights.json"),
        serde_json::to_string(&support::thickness_decoder_weights(10.0)).unwrap(),
    )
    .unwrap();
    fs::write(
        dir.join("ball").join("front.json"),
        serde_json::to_string(&support::sphere_thickness_map(0.5, 33)).unwrap(),
    )
    .unwrap();

    let config = RunConfig::load(dir.join("run.toml")).unwrap();
    assert_eq!(config.model, dir.join("weights.json"));
    assert_eq!(config.recon.octree.init_resolution, 6);
    assert_eq!(config.recon.octree.threshold, 0.05);

    let decoder = MlpDecoder::open(&config.model).unwrap();
    let reconstructor = Reconstructor::new(config.recon.clone()).unwrap();
    let subjects = config.selected_subjects();
    assert_eq!(subjects.len(), 1);

    let subject = &subjects[0];
    let oracle = PixelAlignedOracle::new(
        subject.load_views().unwrap(),
        config.projection,
        config.depth,
        &decoder,
    )
    .unwrap();
    let world = subject.world_transform().unwrap();
    let recon = reconstructor.generate(&oracle, world.as_ref()).unwrap();
    support::assert_closed(&recon.mesh);

    // the world calibration doubles coordinates, so its inverse halves the radius
    let (mean, _) = support::radial_error(&recon.mesh, nalgebra::Point3::origin(), 0.25);
    assert!(mean < 0.03, "mean radial error {mean}");

    let out = config.output_path(subject);
    assert_eq!(out, dir.join("out").join("sphere_run").join("recon").join("result_ball.obj"));
    recon.mesh.save_obj(&out).unwrap();
    assert!(out.exists());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn missing_feature_files_fail_per_subject() {
    let dir = support::scratch_dir("missing");
    fs::write(dir.join("run.toml"), RUN).unwrap();
    let config = RunConfig::load(dir.join("run.toml")).unwrap();
    assert!(config.subjects[0].load_views().is_err());
    let _ = fs::remove_dir_all(dir);
}
