//! Camera session library over libgphoto2
//!
//! Discovers connected cameras, connects to one by model name, and manages
//! the session's native resources: the camera handle, its context, and the
//! transient lists and port objects used while connecting or resetting.
//!
//! # Architecture
//!
//! ```text
//! discovery ──┐
//!             ├──► native::Backend ──► libgphoto2 (feature "gphoto2")
//! camera ─────┘                   └──► FakeBackend (in-memory)
//! ```
//!
//! # Design Principles
//!
//! - **Owned handles**: every native handle is held by a value that releases
//!   it exactly once, on every success and failure path
//! - **Fail fast**: the first native error aborts the operation and is
//!   returned with the step that failed and the native code
//! - **Explicit misses**: a requested camera that is not connected is an
//!   error unless fallback to the default camera is configured
//! - **Blocking**: every call runs on the caller's thread until the
//!   hardware answers; there are no retries or timeouts
//!
//! # Example
//!
//! ```no_run
//! use tethercam::{list_cameras, Camera, FakeBackend};
//!
//! let backend = FakeBackend::with_devices([
//!     ("Canon EOS R", "usb:001,004"),
//!     ("Nikon Z6", "usb:001,005"),
//! ]);
//!
//! let cameras = list_cameras(&backend).unwrap();
//! for (name, port) in cameras.iter() {
//!     println!("{name} on {port}");
//! }
//!
//! let mut camera = Camera::connect(backend, "Nikon Z6").unwrap();
//! camera.reset().unwrap();
//! camera.free().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod camera;
pub mod discovery;
pub mod native;

// Re-export commonly used types at crate root
pub use camera::{
    Camera, CameraError, ConfigError, ConnectConfig, Context, FileConfig, MissingCamera, Operation,
};
#[cfg(feature = "gphoto2")]
pub use discovery::list_connected;
pub use discovery::{list_cameras, CameraList};
#[cfg(feature = "gphoto2")]
pub use native::Gphoto2;
pub use native::{Backend, FakeBackend, Status};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
