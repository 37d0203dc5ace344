//! Enumeration of connected cameras.

use crate::camera::{CameraError, Context, Operation};
use crate::native::{Backend, Scoped};
use serde::{Deserialize, Serialize};

/// Connected cameras as reported by autodetection.
///
/// `names[i]` is the model of the camera on port `ports[i]`. Names are not
/// unique: two identical bodies show up twice with different ports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraList {
    /// Model names, in detection order.
    pub names: Vec<String>,
    /// Port paths, index-aligned with `names`.
    pub ports: Vec<String>,
}

impl CameraList {
    /// Number of detected cameras.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no camera was detected.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over `(name, port)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .zip(&self.ports)
            .map(|(name, port)| (name.as_str(), port.as_str()))
    }

    /// Port of the first camera with the given model name.
    pub fn port_of(&self, name: &str) -> Option<&str> {
        self.iter().find(|(n, _)| *n == name).map(|(_, port)| port)
    }

    fn push(&mut self, name: String, port: String) {
        self.names.push(name);
        self.ports.push(port);
    }
}

/// Lists the cameras currently connected.
///
/// Uses a private context that is released before returning. An empty list
/// is not an error.
pub fn list_cameras<B: Backend>(backend: &B) -> Result<CameraList, CameraError> {
    let context = Context::new(backend.clone())?;

    let list = backend.list_new().map_err(CameraError::at(Operation::ListNew))?;
    let list = Scoped::new(backend, list, "camera list", B::list_free);

    backend
        .autodetect(list.get(), context.raw())
        .map_err(CameraError::at(Operation::Autodetect))?;
    let count = backend
        .list_count(list.get())
        .map_err(CameraError::at(Operation::ListCount))?;

    let mut cameras = CameraList {
        names: Vec::with_capacity(count),
        ports: Vec::with_capacity(count),
    };
    for index in 0..count {
        let name = backend
            .list_get_name(list.get(), index)
            .map_err(CameraError::at(Operation::ListGetName))?;
        let port = backend
            .list_get_value(list.get(), index)
            .map_err(CameraError::at(Operation::ListGetValue))?;
        cameras.push(name, port);
    }

    tracing::debug!(count = cameras.len(), "Listed connected cameras");
    Ok(cameras)
}

/// Lists the cameras connected through libgphoto2.
#[cfg(feature = "gphoto2")]
pub fn list_connected() -> Result<CameraList, CameraError> {
    list_cameras(&crate::native::Gphoto2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{Call, FakeBackend, Status};
    use proptest::prelude::*;

    #[test]
    fn test_lists_names_and_ports_by_index() {
        let backend = FakeBackend::with_devices([
            ("Canon EOS R", "usb:001,004"),
            ("Nikon Z6", "usb:001,005"),
        ]);
        let cameras = list_cameras(&backend).unwrap();

        assert_eq!(cameras.names, vec!["Canon EOS R", "Nikon Z6"]);
        assert_eq!(cameras.ports, vec!["usb:001,004", "usb:001,005"]);
        assert_eq!(cameras.port_of("Nikon Z6"), Some("usb:001,005"));
        assert!(backend.all_released());
    }

    #[test]
    fn test_empty_enumeration() {
        let backend = FakeBackend::new();
        let cameras = list_cameras(&backend).unwrap();

        assert!(cameras.is_empty());
        assert!(cameras.ports.is_empty());
        assert!(backend.all_released());
    }

    #[test]
    fn test_negative_count_is_an_error() {
        let backend = FakeBackend::with_devices([("Nikon Z6", "usb:001,005")]);
        backend.set_count(-7);

        let err = list_cameras(&backend).unwrap_err();
        assert_eq!(err.operation(), Some(Operation::ListCount));
        assert_eq!(err.code(), Some(-7));
        assert!(backend.all_released());
    }

    #[test]
    fn test_autodetect_failure_releases_context() {
        let backend = FakeBackend::new();
        backend.fail(Call::Autodetect, Status::IO);

        let err = list_cameras(&backend).unwrap_err();
        assert_eq!(err.operation(), Some(Operation::Autodetect));
        assert_eq!(backend.calls(Call::ContextUnref), 1);
        assert!(backend.all_released());
    }

    #[test]
    fn test_serializes_as_toml() {
        let cameras = CameraList {
            names: vec!["Nikon Z6".to_string()],
            ports: vec!["usb:001,005".to_string()],
        };
        let text = toml::to_string(&cameras).unwrap();
        let parsed: CameraList = toml::from_str(&text).unwrap();
        assert_eq!(parsed, cameras);
    }

    proptest! {
        #[test]
        fn prop_names_and_ports_stay_aligned(
            devices in prop::collection::vec(("[A-Za-z ]{1,12}", 1u8..=127, 1u8..=127), 0..8)
        ) {
            let backend = FakeBackend::new();
            let expected: Vec<(String, String)> = devices
                .iter()
                .map(|(name, bus, dev)| (name.clone(), format!("usb:{bus:03},{dev:03}")))
                .collect();
            for (name, port) in &expected {
                backend.add_device(name.clone(), port.clone());
            }

            let cameras = list_cameras(&backend).unwrap();
            prop_assert_eq!(cameras.names.len(), cameras.ports.len());
            prop_assert_eq!(cameras.len(), expected.len());
            for ((name, port), (want_name, want_port)) in cameras.iter().zip(&expected) {
                prop_assert_eq!(name, want_name.as_str());
                prop_assert_eq!(port, want_port.as_str());
            }
            prop_assert!(backend.all_released());
        }
    }
}
