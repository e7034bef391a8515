// Reconstruct an analytic "snowman" occupancy field and write it as a colored OBJ and a
// binary STL under `out/`.

use nalgebra::Point3;
use pifurs::float_types::Real;
use pifurs::oracle::ImplicitOracle;
use pifurs::reconstruct::{ReconConfig, Reconstructor};
use std::fs;

fn sigmoid(x: Real) -> Real {
    1.0 / (1.0 + (-x).exp())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let body = Point3::new(0.0, -0.3, 0.0);
    let head = Point3::new(0.0, 0.45, 0.0);
    let oracle = ImplicitOracle::new(move |p: &Point3<Real>| {
        let d_body = 0.45 - (p - body).norm();
        let d_head = 0.3 - (p - head).norm();
        sigmoid(25.0 * d_body.max(d_head))
    });

    let config = ReconConfig {
        resolution: 128,
        ..Default::default()
    };
    let recon = Reconstructor::new(config)?.generate(&oracle, None)?;
    println!(
        "{} vertices, {} faces, {} oracle samples, watertight: {}",
        recon.mesh.vertex_count(),
        recon.mesh.face_count(),
        recon.stats.evaluated,
        recon.mesh.is_watertight()
    );

    fs::create_dir_all("out")?;
    recon.mesh.save_obj("out/snowman.obj")?;
    #[cfg(feature = "stl-io")]
    fs::write("out/snowman.stl", recon.mesh.to_stl_binary()?)?;
    Ok(())
}
