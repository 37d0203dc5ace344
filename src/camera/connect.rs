//! Camera construction.
//!
//! Connecting to a named camera is a handshake over several native
//! resources: an autodetect list, the abilities list, a port info list and
//! the camera handle itself. Each is held by a scoped guard, so whichever
//! step fails, everything acquired before it is released before the error
//! reaches the caller.

use super::{Camera, CameraError, ConnectConfig, Context, MissingCamera, Operation};
use crate::native::{Backend, Scoped};

/// Outcome of scanning the autodetect list.
enum Lookup<C> {
    Bound(C),
    Missing(Vec<String>),
}

impl<B: Backend> Camera<B> {
    /// Connects to the camera whose model name is `name`.
    ///
    /// An empty name connects to the default camera chosen by the library,
    /// without enumerating devices. A name that matches no detected camera
    /// fails with [`CameraError::NotFound`]; use [`Camera::connect_with`] to
    /// fall back to the default camera instead.
    pub fn connect(backend: B, name: &str) -> Result<Self, CameraError> {
        Self::connect_with(backend, &ConnectConfig::for_model(name))
    }

    /// Connects using the given configuration.
    pub fn connect_with(backend: B, config: &ConnectConfig) -> Result<Self, CameraError> {
        config.validate()?;
        let context = Context::new(backend)?;

        if config.is_targeted() {
            match bind_named(&context, config)? {
                Lookup::Bound(raw) => {
                    tracing::info!(model = %config.model, "Connected to camera");
                    return Ok(Self::from_parts(raw, context));
                }
                Lookup::Missing(detected) => match config.on_missing {
                    MissingCamera::Error => {
                        return Err(CameraError::NotFound {
                            name: config.model.clone(),
                            detected,
                        });
                    }
                    MissingCamera::FallbackToDefault => {
                        tracing::warn!(
                            model = %config.model,
                            ?detected,
                            "Requested camera not detected, falling back to default camera"
                        );
                    }
                },
            }
        }

        let raw = bind_default(&context)?;
        tracing::info!("Connected to default camera");
        Ok(Self::from_parts(raw, context))
    }
}

#[cfg(feature = "gphoto2")]
impl Camera<crate::native::Gphoto2> {
    /// Connects to `name` through libgphoto2.
    pub fn open(name: &str) -> Result<Self, CameraError> {
        Self::connect(crate::native::Gphoto2, name)
    }
}

/// Autodetects cameras and binds the first entry matching `config`.
fn bind_named<B: Backend>(
    context: &Context<B>,
    config: &ConnectConfig,
) -> Result<Lookup<B::Camera>, CameraError> {
    let backend = context.backend();

    let list = backend.list_new().map_err(CameraError::at(Operation::ListNew))?;
    let list = Scoped::new(backend, list, "camera list", B::list_free);

    let abilities = backend
        .abilities_list_new()
        .map_err(CameraError::at(Operation::AbilitiesListNew))?;
    let abilities = Scoped::new(backend, abilities, "abilities list", B::abilities_list_free);
    backend
        .abilities_list_load(abilities.get(), context.raw())
        .map_err(CameraError::at(Operation::AbilitiesListLoad))?;

    backend
        .autodetect(list.get(), context.raw())
        .map_err(CameraError::at(Operation::Autodetect))?;
    let count = backend
        .list_count(list.get())
        .map_err(CameraError::at(Operation::ListCount))?;
    tracing::debug!(count, model = %config.model, "Autodetected cameras");

    let mut detected = Vec::with_capacity(count);
    for index in 0..count {
        let name = backend
            .list_get_name(list.get(), index)
            .map_err(CameraError::at(Operation::ListGetName))?;
        let port = backend
            .list_get_value(list.get(), index)
            .map_err(CameraError::at(Operation::ListGetValue))?;
        tracing::trace!(index, name = %name, port = %port, "Detected camera");

        if config.matches(&name, &port) {
            tracing::debug!(index, port = %port, "Found camera: {}", name);
            let raw = bind_entry(context, abilities.get(), &name, &port)?;
            return Ok(Lookup::Bound(raw));
        }
        detected.push(name);
    }

    Ok(Lookup::Missing(detected))
}

/// Binds the abilities of `model` and the transport at `port` to a fresh
/// camera handle, then initializes it.
fn bind_entry<B: Backend>(
    context: &Context<B>,
    abilities_list: B::AbilitiesList,
    model: &str,
    port: &str,
) -> Result<B::Camera, CameraError> {
    let backend = context.backend();

    let camera = backend.camera_new().map_err(CameraError::at(Operation::CameraNew))?;
    let camera = Scoped::new(backend, camera, "camera", B::camera_unref);

    let index = backend
        .abilities_list_lookup_model(abilities_list, model)
        .map_err(CameraError::at(Operation::LookupModel))?;
    let abilities = backend
        .abilities_list_get_abilities(abilities_list, index)
        .map_err(CameraError::at(Operation::GetAbilities))?;
    backend
        .camera_set_abilities(camera.get(), &abilities)
        .map_err(CameraError::at(Operation::SetAbilities))?;

    let ports = backend
        .port_info_list_new()
        .map_err(CameraError::at(Operation::PortInfoListNew))?;
    let ports = Scoped::new(backend, ports, "port info list", B::port_info_list_free);
    backend
        .port_info_list_load(ports.get())
        .map_err(CameraError::at(Operation::PortInfoListLoad))?;
    let index = backend
        .port_info_list_lookup_path(ports.get(), port)
        .map_err(CameraError::at(Operation::LookupPort))?;
    let info = backend
        .port_info_list_get_info(ports.get(), index)
        .map_err(CameraError::at(Operation::GetPortInfo))?;
    backend
        .camera_set_port_info(camera.get(), info)
        .map_err(CameraError::at(Operation::SetPortInfo))?;

    initialize(context, &camera)?;
    Ok(camera.into_raw())
}

/// Initializes a bare handle; the library picks the camera itself.
fn bind_default<B: Backend>(context: &Context<B>) -> Result<B::Camera, CameraError> {
    let backend = context.backend();
    let camera = backend.camera_new().map_err(CameraError::at(Operation::CameraNew))?;
    let camera = Scoped::new(backend, camera, "camera", B::camera_unref);

    initialize(context, &camera)?;
    Ok(camera.into_raw())
}

fn initialize<B: Backend>(
    context: &Context<B>,
    camera: &Scoped<'_, B, B::Camera>,
) -> Result<(), CameraError> {
    let backend = context.backend();
    if let Err(status) = backend.camera_init(camera.get(), context.raw()) {
        // A half-opened connection must be closed before the handle goes.
        if let Err(exit) = backend.camera_exit(camera.get(), context.raw()) {
            tracing::debug!(status = %exit, "Exit after failed init also failed");
        }
        return Err(CameraError::at(Operation::Init)(status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{Call, FakeBackend, Resource, Status};
    use proptest::prelude::*;

    fn two_bodies() -> FakeBackend {
        FakeBackend::with_devices([("Canon EOS R", "usb:001,004"), ("Nikon Z6", "usb:001,005")])
    }

    /// Calls on the acquisition path of a targeted connect.
    const BIND_CALLS: [Call; 18] = [
        Call::ContextNew,
        Call::ListNew,
        Call::AbilitiesListNew,
        Call::AbilitiesListLoad,
        Call::Autodetect,
        Call::ListCount,
        Call::ListGetName,
        Call::ListGetValue,
        Call::CameraNew,
        Call::LookupModel,
        Call::GetAbilities,
        Call::SetAbilities,
        Call::PortInfoListNew,
        Call::PortInfoListLoad,
        Call::LookupPath,
        Call::GetPortInfo,
        Call::SetPortInfo,
        Call::CameraInit,
    ];

    #[test]
    fn test_connect_selects_matching_entry() {
        let backend = two_bodies();
        let camera = Camera::connect(backend.clone(), "Nikon Z6").unwrap();

        let bindings = backend.bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].model.as_deref(), Some("Nikon Z6"));
        assert_eq!(bindings[0].port.as_deref(), Some("usb:001,005"));
        assert_eq!(bindings[0].inits, 1);
        assert_eq!(backend.live(Resource::Context), 1);
        assert_eq!(backend.live(Resource::Camera), 1);

        // Intermediate lists are gone, only the session remains.
        assert_eq!(backend.live(Resource::List), 0);
        assert_eq!(backend.live(Resource::AbilitiesList), 0);
        assert_eq!(backend.live(Resource::PortInfoList), 0);
        drop(camera);
    }

    #[test]
    fn test_connect_stops_at_first_match() {
        let backend = FakeBackend::with_devices([
            ("Nikon Z6", "usb:001,004"),
            ("Nikon Z6", "usb:001,005"),
        ]);
        let _camera = Camera::connect(backend.clone(), "Nikon Z6").unwrap();

        assert_eq!(backend.calls(Call::ListGetName), 1);
        assert_eq!(backend.bindings()[0].port.as_deref(), Some("usb:001,004"));
    }

    #[test]
    fn test_connect_with_port_filter() {
        let backend = FakeBackend::with_devices([
            ("Nikon Z6", "usb:001,004"),
            ("Nikon Z6", "usb:001,005"),
        ]);
        let config = ConnectConfig::for_model("Nikon Z6").on_port("usb:001,005");
        let _camera = Camera::connect_with(backend.clone(), &config).unwrap();

        assert_eq!(backend.bindings()[0].port.as_deref(), Some("usb:001,005"));
    }

    #[test]
    fn test_empty_name_skips_enumeration() {
        let backend = two_bodies();
        let camera = Camera::connect(backend.clone(), "").unwrap();

        for call in [
            Call::ListNew,
            Call::Autodetect,
            Call::AbilitiesListNew,
            Call::LookupModel,
            Call::SetAbilities,
            Call::PortInfoListNew,
            Call::SetPortInfo,
        ] {
            assert_eq!(backend.calls(call), 0, "{call:?} should not be called");
        }
        assert_eq!(backend.calls(Call::CameraInit), 1);
        assert!(!camera.is_released());
    }

    #[test]
    fn test_missing_camera_is_an_error() {
        let backend = two_bodies();
        let err = Camera::connect(backend.clone(), "Sony A7 IV").unwrap_err();

        match err {
            CameraError::NotFound { name, detected } => {
                assert_eq!(name, "Sony A7 IV");
                assert_eq!(detected, vec!["Canon EOS R", "Nikon Z6"]);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert_eq!(backend.calls(Call::CameraNew), 0);
        assert!(backend.all_released());
    }

    #[test]
    fn test_missing_camera_falls_back_when_configured() {
        let backend = two_bodies();
        let config =
            ConnectConfig::for_model("Sony A7 IV").when_missing(MissingCamera::FallbackToDefault);
        let camera = Camera::connect_with(backend.clone(), &config).unwrap();

        let bindings = backend.bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].model.as_deref(), Some("Canon EOS R"));
        assert_eq!(backend.calls(Call::SetAbilities), 0);
        assert_eq!(backend.live(Resource::Context), 1);
        drop(camera);
        assert!(backend.all_released());
    }

    #[test]
    fn test_no_cameras_detected() {
        let backend = FakeBackend::new();
        let err = Camera::connect(backend.clone(), "Nikon Z6").unwrap_err();
        assert!(matches!(err, CameraError::NotFound { ref detected, .. } if detected.is_empty()));
        assert!(backend.all_released());
    }

    #[test]
    fn test_negative_count_is_an_error() {
        let backend = two_bodies();
        backend.set_count(-1);

        let err = Camera::connect(backend.clone(), "Nikon Z6").unwrap_err();
        assert_eq!(err.operation(), Some(Operation::ListCount));
        assert_eq!(err.code(), Some(-1));
        assert!(backend.all_released());
    }

    #[test]
    fn test_autodetect_failure_is_reported() {
        let backend = two_bodies();
        backend.fail(Call::Autodetect, Status::IO);

        let err = Camera::connect(backend.clone(), "Nikon Z6").unwrap_err();
        assert_eq!(err.operation(), Some(Operation::Autodetect));
        assert_eq!(backend.calls(Call::ListCount), 0);
        assert!(backend.all_released());
    }

    #[test]
    fn test_init_failure_exits_then_releases() {
        let backend = two_bodies();
        backend.fail(Call::CameraInit, Status::from_code(-53).unwrap());

        let err = Camera::connect(backend.clone(), "Nikon Z6").unwrap_err();
        assert_eq!(err.operation(), Some(Operation::Init));
        assert_eq!(backend.calls(Call::CameraExit), 1);
        assert_eq!(backend.calls(Call::CameraUnref), 1);
        assert!(backend.all_released());
    }

    #[test]
    fn test_unknown_model_releases_camera() {
        let backend = two_bodies();
        backend.fail(Call::LookupModel, Status::MODEL_NOT_FOUND);

        let err = Camera::connect(backend.clone(), "Nikon Z6").unwrap_err();
        assert_eq!(err.operation(), Some(Operation::LookupModel));
        assert_eq!(backend.calls(Call::CameraNew), 1);
        assert_eq!(backend.calls(Call::CameraUnref), 1);
        assert_eq!(backend.calls(Call::ContextUnref), 1);
        assert!(backend.all_released());
    }

    #[test]
    fn test_invalid_config_allocates_nothing() {
        let backend = two_bodies();
        let config = ConnectConfig::default().on_port("usb:001,004");

        let err = Camera::connect_with(backend.clone(), &config).unwrap_err();
        assert!(matches!(err, CameraError::Config(_)));
        assert_eq!(backend.calls(Call::ContextNew), 0);
    }

    #[test]
    fn test_context_failure_propagates() {
        let backend = two_bodies();
        backend.fail(Call::ContextNew, Status::NO_MEMORY);

        assert!(matches!(
            Camera::connect(backend.clone(), "Nikon Z6"),
            Err(CameraError::ContextInit)
        ));
        assert_eq!(backend.calls(Call::ListNew), 0);
    }

    proptest! {
        #[test]
        fn prop_failed_connect_releases_everything(
            call in prop::sample::select(BIND_CALLS.to_vec()),
            code in -115i32..=-1,
        ) {
            let backend = two_bodies();
            backend.fail(call, Status::from_code(code).unwrap());

            let err = Camera::connect(backend.clone(), "Nikon Z6").unwrap_err();
            if call == Call::ContextNew {
                prop_assert!(matches!(err, CameraError::ContextInit));
            } else {
                prop_assert_eq!(err.code(), Some(code));
            }
            prop_assert!(backend.all_released());
            prop_assert_eq!(backend.double_releases(), 0);
            prop_assert!(backend.bindings().iter().all(|b| b.inits == 0));
        }
    }
}
