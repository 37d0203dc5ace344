//! Camera sessions.
//!
//! A [`Camera`] owns a native camera handle and the [`Context`] it was
//! initialized with. Construction walks the connect handshake; the lifecycle
//! operations close, reset and release the session.

mod config;
mod connect;
mod context;
mod error;
mod session;

pub use config::{ConfigError, ConnectConfig, FileConfig, MissingCamera};
pub use context::Context;
pub use error::{CameraError, Operation};
pub use session::Camera;
