//! Lists connected cameras, then connects to the first one and resets its
//! port.
//!
//! ```text
//! RUST_LOG=tethercam=debug cargo run --example list_cameras --features gphoto2
//! ```

use tethercam::{list_connected, Camera, CameraError};
use tracing::{info, warn};

fn main() -> Result<(), CameraError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("tethercam v{}", tethercam::VERSION);

    let cameras = list_connected()?;
    println!("Available cameras:");
    for (name, port) in cameras.iter() {
        println!("  {} on port {}", name, port);
    }

    let Some(first) = cameras.names.first() else {
        warn!("No cameras detected");
        return Ok(());
    };

    let mut camera = Camera::open(first)?;
    if let Err(e) = camera.reset() {
        warn!("Port reset failed: {}", e);
    }
    camera.free()
}
