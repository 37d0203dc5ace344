//! Camera discovery.
//!
//! Stateless enumeration of connected cameras. Each call creates and
//! releases its own native context.

mod enumerate;

#[cfg(feature = "gphoto2")]
pub use enumerate::list_connected;
pub use enumerate::{list_cameras, CameraList};
