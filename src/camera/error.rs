//! Errors surfaced by camera construction, lifecycle and discovery.

use super::config::ConfigError;
use crate::native::Status;
use std::fmt;
use thiserror::Error;

/// The native step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListNew,
    Autodetect,
    ListCount,
    ListGetName,
    ListGetValue,
    AbilitiesListNew,
    AbilitiesListLoad,
    LookupModel,
    GetAbilities,
    SetAbilities,
    PortInfoListNew,
    PortInfoListLoad,
    LookupPort,
    GetPortInfo,
    SetPortInfo,
    CameraNew,
    Init,
    Exit,
    Unref,
    PortNew,
    CameraPortInfo,
    PortSetInfo,
    PortOpen,
    PortReset,
    PortClose,
    PortFree,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            Operation::ListNew => "initialize camera list",
            Operation::Autodetect => "autodetect cameras",
            Operation::ListCount => "get camera list",
            Operation::ListGetName => "read camera name",
            Operation::ListGetValue => "read camera port",
            Operation::AbilitiesListNew => "initialize camera abilities list",
            Operation::AbilitiesListLoad => "load camera abilities list",
            Operation::LookupModel => "lookup camera model",
            Operation::GetAbilities => "get camera abilities",
            Operation::SetAbilities => "set camera abilities",
            Operation::PortInfoListNew => "initialize port info list",
            Operation::PortInfoListLoad => "load port info list",
            Operation::LookupPort => "lookup port",
            Operation::GetPortInfo => "get port info",
            Operation::SetPortInfo => "set port info",
            Operation::CameraNew => "initialize camera pointer",
            Operation::Init => "initialize camera",
            Operation::Exit => "exit camera",
            Operation::Unref => "release camera",
            Operation::PortNew => "allocate port",
            Operation::CameraPortInfo => "read camera port info",
            Operation::PortSetInfo => "bind port info",
            Operation::PortOpen => "open port",
            Operation::PortReset => "reset port",
            Operation::PortClose => "close port",
            Operation::PortFree => "free port",
        };
        f.write_str(what)
    }
}

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("cannot create native context")]
    ContextInit,
    #[error("cannot {op}: {status}")]
    Native { op: Operation, status: Status },
    #[error("camera {name:?} not found among {} detected camera(s)", .detected.len())]
    NotFound { name: String, detected: Vec<String> },
    #[error("camera has already been released")]
    Released,
    #[error("invalid connect configuration: {0}")]
    Config(#[from] ConfigError),
}

impl CameraError {
    /// Maps a native status to the error for `op`. Meant for `map_err`.
    pub(crate) fn at(op: Operation) -> impl FnOnce(Status) -> CameraError {
        move |status| CameraError::Native { op, status }
    }

    /// The native integer code, when the error came from the library.
    pub fn code(&self) -> Option<i32> {
        match self {
            CameraError::Native { status, .. } => Some(status.code()),
            _ => None,
        }
    }

    /// The native step that failed, if any.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            CameraError::Native { op, .. } => Some(*op),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_error_display() {
        let err = CameraError::at(Operation::AbilitiesListLoad)(Status::IO);
        assert_eq!(
            err.to_string(),
            "cannot load camera abilities list: I/O problem (code -7)"
        );
        assert_eq!(err.code(), Some(-7));
        assert_eq!(err.operation(), Some(Operation::AbilitiesListLoad));
    }

    #[test]
    fn test_not_found_display() {
        let err = CameraError::NotFound {
            name: "Nikon Z6".to_string(),
            detected: vec!["Canon EOS R".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "camera \"Nikon Z6\" not found among 1 detected camera(s)"
        );
        assert_eq!(err.code(), None);
    }
}
