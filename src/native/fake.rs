//! In-memory backend for exercising the lifecycle without hardware.
//!
//! `FakeBackend` mimics the native library's observable behavior: an
//! autodetect table of connected cameras, a table of known models and
//! ports, and handles that must be released exactly once. Every call is
//! counted, any call can be made to fail with a chosen status, and the
//! ledger of live handles shows whether anything leaked.

use super::{Backend, Status};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Native calls, for counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    ContextNew,
    ContextUnref,
    ListNew,
    ListFree,
    ListCount,
    ListGetName,
    ListGetValue,
    Autodetect,
    AbilitiesListNew,
    AbilitiesListFree,
    AbilitiesListLoad,
    LookupModel,
    GetAbilities,
    PortInfoListNew,
    PortInfoListFree,
    PortInfoListLoad,
    LookupPath,
    GetPortInfo,
    CameraNew,
    SetAbilities,
    SetPortInfo,
    CameraGetPortInfo,
    CameraInit,
    CameraExit,
    CameraUnref,
    PortNew,
    PortSetInfo,
    PortOpen,
    PortReset,
    PortClose,
    PortFree,
}

/// Kinds of handle tracked by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Context,
    List,
    AbilitiesList,
    PortInfoList,
    Camera,
    Port,
}

const ALL_RESOURCES: [Resource; 6] = [
    Resource::Context,
    Resource::List,
    Resource::AbilitiesList,
    Resource::PortInfoList,
    Resource::Camera,
    Resource::Port,
];

/// Opaque handle handed out by the fake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FakeHandle(u64);

/// Abilities copied out of the fake abilities list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeAbilities {
    /// Model the abilities belong to.
    pub model: String,
}

/// Index into the fake's table of known ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakePortInfo(usize);

/// What has been bound to one camera handle, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    /// Model whose abilities were bound (or picked by a bare init).
    pub model: Option<String>,
    /// Port path bound to the camera.
    pub port: Option<String>,
    /// Successful `init` calls.
    pub inits: usize,
    /// Successful `exit` calls.
    pub exits: usize,
}

#[derive(Debug, Default)]
struct State {
    devices: Vec<(String, String)>,
    models: Vec<String>,
    ports: Vec<String>,
    count_override: Option<i32>,
    failures: HashMap<Call, Status>,
    calls: HashMap<Call, usize>,
    journal: Vec<Call>,
    next_handle: u64,
    live: HashMap<FakeHandle, Resource>,
    double_releases: usize,
    lists: HashMap<FakeHandle, Vec<(String, String)>>,
    loaded: HashSet<FakeHandle>,
    cameras: Vec<(FakeHandle, Binding)>,
    port_targets: HashMap<FakeHandle, usize>,
    open_ports: HashSet<FakeHandle>,
    resets: Vec<String>,
}

impl State {
    fn enter(&mut self, call: Call) -> Result<(), Status> {
        *self.calls.entry(call).or_default() += 1;
        self.journal.push(call);
        match self.failures.get(&call) {
            Some(&status) => Err(status),
            None => Ok(()),
        }
    }

    fn alloc(&mut self, resource: Resource) -> FakeHandle {
        self.next_handle += 1;
        let handle = FakeHandle(self.next_handle);
        self.live.insert(handle, resource);
        handle
    }

    fn free(&mut self, handle: FakeHandle, resource: Resource) -> Result<(), Status> {
        match self.live.get(&handle) {
            Some(&kind) if kind == resource => {
                self.live.remove(&handle);
                Ok(())
            }
            _ => {
                self.double_releases += 1;
                Err(Status::BAD_PARAMETERS)
            }
        }
    }

    fn expect_live(&self, handle: FakeHandle, resource: Resource) -> Result<(), Status> {
        match self.live.get(&handle) {
            Some(&kind) if kind == resource => Ok(()),
            _ => Err(Status::BAD_PARAMETERS),
        }
    }

    fn binding_mut(&mut self, camera: FakeHandle) -> Result<&mut Binding, Status> {
        self.cameras
            .iter_mut()
            .find(|(handle, _)| *handle == camera)
            .map(|(_, binding)| binding)
            .ok_or(Status::BAD_PARAMETERS)
    }

    fn register(&mut self, model: &str, port: &str) {
        if !self.models.iter().any(|m| m == model) {
            self.models.push(model.to_string());
        }
        if !self.ports.iter().any(|p| p == port) {
            self.ports.push(port.to_string());
        }
    }
}

/// A scriptable stand-in for the native library.
///
/// Clones share one state, so a test can keep a clone to inspect the ledger
/// after handing the backend to a [`crate::Camera`].
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    /// Creates a backend with no connected cameras.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend with the given `(model, port)` pairs connected.
    pub fn with_devices<I, M, P>(devices: I) -> Self
    where
        I: IntoIterator<Item = (M, P)>,
        M: Into<String>,
        P: Into<String>,
    {
        let backend = Self::new();
        for (model, port) in devices {
            backend.add_device(model, port);
        }
        backend
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Connects a camera. Its model and port become known as well.
    pub fn add_device(&self, model: impl Into<String>, port: impl Into<String>) {
        let (model, port) = (model.into(), port.into());
        let mut state = self.state();
        state.register(&model, &port);
        state.devices.push((model, port));
    }

    /// Makes a model known to the abilities list without connecting it.
    pub fn add_model(&self, model: impl Into<String>) {
        let model = model.into();
        let mut state = self.state();
        if !state.models.contains(&model) {
            state.models.push(model);
        }
    }

    /// Forces the list count to report `code`, e.g. a negative status.
    pub fn set_count(&self, code: i32) {
        self.state().count_override = Some(code);
    }

    /// Makes every subsequent `call` fail with `status`.
    pub fn fail(&self, call: Call, status: Status) {
        self.state().failures.insert(call, status);
    }

    /// Lets `call` succeed again.
    pub fn clear_failure(&self, call: Call) {
        self.state().failures.remove(&call);
    }

    /// Number of times `call` was made, failed attempts included.
    pub fn calls(&self, call: Call) -> usize {
        self.state().calls.get(&call).copied().unwrap_or(0)
    }

    /// Every call made so far, in order.
    pub fn journal(&self) -> Vec<Call> {
        self.state().journal.clone()
    }

    /// Handles of the given kind that are allocated and not yet released.
    pub fn live(&self, resource: Resource) -> usize {
        self.state().live.values().filter(|&&kind| kind == resource).count()
    }

    /// True when no handle of any kind is outstanding.
    pub fn all_released(&self) -> bool {
        let leaked: Vec<_> = ALL_RESOURCES
            .iter()
            .map(|&resource| (resource, self.live(resource)))
            .filter(|&(_, count)| count > 0)
            .collect();
        if !leaked.is_empty() {
            tracing::debug!(?leaked, "Fake backend has live handles");
        }
        leaked.is_empty()
    }

    /// Release calls made on handles that were not live.
    pub fn double_releases(&self) -> usize {
        self.state().double_releases
    }

    /// Bindings of every camera handle ever created, in creation order.
    pub fn bindings(&self) -> Vec<Binding> {
        self.state().cameras.iter().map(|(_, b)| b.clone()).collect()
    }

    /// Port paths that received a hardware reset, in order.
    pub fn resets(&self) -> Vec<String> {
        self.state().resets.clone()
    }
}

impl Backend for FakeBackend {
    type Context = FakeHandle;
    type Camera = FakeHandle;
    type List = FakeHandle;
    type AbilitiesList = FakeHandle;
    type Abilities = FakeAbilities;
    type PortInfoList = FakeHandle;
    type PortInfo = FakePortInfo;
    type Port = FakeHandle;

    fn context_new(&self) -> Option<FakeHandle> {
        let mut state = self.state();
        state.enter(Call::ContextNew).ok()?;
        Some(state.alloc(Resource::Context))
    }

    fn context_unref(&self, context: FakeHandle) {
        let mut state = self.state();
        if state.enter(Call::ContextUnref).is_ok() {
            let _ = state.free(context, Resource::Context);
        }
    }

    fn list_new(&self) -> Result<FakeHandle, Status> {
        let mut state = self.state();
        state.enter(Call::ListNew)?;
        let list = state.alloc(Resource::List);
        state.lists.insert(list, Vec::new());
        Ok(list)
    }

    fn list_free(&self, list: FakeHandle) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::ListFree)?;
        state.free(list, Resource::List)?;
        state.lists.remove(&list);
        Ok(())
    }

    fn list_count(&self, list: FakeHandle) -> Result<usize, Status> {
        let mut state = self.state();
        state.enter(Call::ListCount)?;
        state.expect_live(list, Resource::List)?;
        if let Some(code) = state.count_override {
            return Status::check(code).map(|n| n as usize);
        }
        Ok(state.lists.get(&list).map_or(0, Vec::len))
    }

    fn list_get_name(&self, list: FakeHandle, index: usize) -> Result<String, Status> {
        let mut state = self.state();
        state.enter(Call::ListGetName)?;
        state
            .lists
            .get(&list)
            .and_then(|entries| entries.get(index))
            .map(|(name, _)| name.clone())
            .ok_or(Status::BAD_PARAMETERS)
    }

    fn list_get_value(&self, list: FakeHandle, index: usize) -> Result<String, Status> {
        let mut state = self.state();
        state.enter(Call::ListGetValue)?;
        state
            .lists
            .get(&list)
            .and_then(|entries| entries.get(index))
            .map(|(_, value)| value.clone())
            .ok_or(Status::BAD_PARAMETERS)
    }

    fn autodetect(&self, list: FakeHandle, context: FakeHandle) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::Autodetect)?;
        state.expect_live(context, Resource::Context)?;
        state.expect_live(list, Resource::List)?;
        let detected = state.devices.clone();
        state.lists.insert(list, detected);
        Ok(())
    }

    fn abilities_list_new(&self) -> Result<FakeHandle, Status> {
        let mut state = self.state();
        state.enter(Call::AbilitiesListNew)?;
        Ok(state.alloc(Resource::AbilitiesList))
    }

    fn abilities_list_free(&self, list: FakeHandle) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::AbilitiesListFree)?;
        state.free(list, Resource::AbilitiesList)?;
        state.loaded.remove(&list);
        Ok(())
    }

    fn abilities_list_load(&self, list: FakeHandle, context: FakeHandle) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::AbilitiesListLoad)?;
        state.expect_live(context, Resource::Context)?;
        state.expect_live(list, Resource::AbilitiesList)?;
        state.loaded.insert(list);
        Ok(())
    }

    fn abilities_list_lookup_model(&self, list: FakeHandle, model: &str) -> Result<usize, Status> {
        let mut state = self.state();
        state.enter(Call::LookupModel)?;
        if !state.loaded.contains(&list) {
            return Err(Status::MODEL_NOT_FOUND);
        }
        state
            .models
            .iter()
            .position(|m| m == model)
            .ok_or(Status::MODEL_NOT_FOUND)
    }

    fn abilities_list_get_abilities(
        &self,
        list: FakeHandle,
        index: usize,
    ) -> Result<FakeAbilities, Status> {
        let mut state = self.state();
        state.enter(Call::GetAbilities)?;
        state.expect_live(list, Resource::AbilitiesList)?;
        state
            .models
            .get(index)
            .map(|model| FakeAbilities {
                model: model.clone(),
            })
            .ok_or(Status::BAD_PARAMETERS)
    }

    fn port_info_list_new(&self) -> Result<FakeHandle, Status> {
        let mut state = self.state();
        state.enter(Call::PortInfoListNew)?;
        Ok(state.alloc(Resource::PortInfoList))
    }

    fn port_info_list_free(&self, list: FakeHandle) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::PortInfoListFree)?;
        state.free(list, Resource::PortInfoList)?;
        state.loaded.remove(&list);
        Ok(())
    }

    fn port_info_list_load(&self, list: FakeHandle) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::PortInfoListLoad)?;
        state.expect_live(list, Resource::PortInfoList)?;
        state.loaded.insert(list);
        Ok(())
    }

    fn port_info_list_lookup_path(&self, list: FakeHandle, path: &str) -> Result<usize, Status> {
        let mut state = self.state();
        state.enter(Call::LookupPath)?;
        if !state.loaded.contains(&list) {
            return Err(Status::UNKNOWN_PORT);
        }
        state
            .ports
            .iter()
            .position(|p| p == path)
            .ok_or(Status::UNKNOWN_PORT)
    }

    fn port_info_list_get_info(
        &self,
        list: FakeHandle,
        index: usize,
    ) -> Result<FakePortInfo, Status> {
        let mut state = self.state();
        state.enter(Call::GetPortInfo)?;
        state.expect_live(list, Resource::PortInfoList)?;
        if index < state.ports.len() {
            Ok(FakePortInfo(index))
        } else {
            Err(Status::BAD_PARAMETERS)
        }
    }

    fn camera_new(&self) -> Result<FakeHandle, Status> {
        let mut state = self.state();
        state.enter(Call::CameraNew)?;
        let camera = state.alloc(Resource::Camera);
        state.cameras.push((camera, Binding::default()));
        Ok(camera)
    }

    fn camera_set_abilities(
        &self,
        camera: FakeHandle,
        abilities: &FakeAbilities,
    ) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::SetAbilities)?;
        state.expect_live(camera, Resource::Camera)?;
        state.binding_mut(camera)?.model = Some(abilities.model.clone());
        Ok(())
    }

    fn camera_set_port_info(&self, camera: FakeHandle, info: FakePortInfo) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::SetPortInfo)?;
        state.expect_live(camera, Resource::Camera)?;
        let path = state.ports.get(info.0).cloned().ok_or(Status::UNKNOWN_PORT)?;
        state.binding_mut(camera)?.port = Some(path);
        Ok(())
    }

    fn camera_get_port_info(&self, camera: FakeHandle) -> Result<FakePortInfo, Status> {
        let mut state = self.state();
        state.enter(Call::CameraGetPortInfo)?;
        state.expect_live(camera, Resource::Camera)?;
        let path = state.binding_mut(camera)?.port.clone().ok_or(Status::UNKNOWN_PORT)?;
        state
            .ports
            .iter()
            .position(|p| *p == path)
            .map(FakePortInfo)
            .ok_or(Status::UNKNOWN_PORT)
    }

    fn camera_init(&self, camera: FakeHandle, context: FakeHandle) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::CameraInit)?;
        state.expect_live(context, Resource::Context)?;
        state.expect_live(camera, Resource::Camera)?;
        let first = state.devices.first().cloned();
        let connected: Vec<String> = state.devices.iter().map(|(_, p)| p.clone()).collect();
        let binding = state.binding_mut(camera)?;
        match binding.port.clone() {
            // Bare handle: the library picks the first connected camera.
            None => {
                let (model, port) = first.ok_or(Status::MODEL_NOT_FOUND)?;
                binding.model.get_or_insert(model);
                binding.port = Some(port);
            }
            Some(port) if !connected.contains(&port) => return Err(Status::IO_USB_FIND),
            Some(_) => {}
        }
        binding.inits += 1;
        Ok(())
    }

    fn camera_exit(&self, camera: FakeHandle, context: FakeHandle) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::CameraExit)?;
        state.expect_live(context, Resource::Context)?;
        state.expect_live(camera, Resource::Camera)?;
        state.binding_mut(camera)?.exits += 1;
        Ok(())
    }

    fn camera_unref(&self, camera: FakeHandle) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::CameraUnref)?;
        state.free(camera, Resource::Camera)
    }

    fn port_new(&self) -> Result<FakeHandle, Status> {
        let mut state = self.state();
        state.enter(Call::PortNew)?;
        Ok(state.alloc(Resource::Port))
    }

    fn port_set_info(&self, port: FakeHandle, info: FakePortInfo) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::PortSetInfo)?;
        state.expect_live(port, Resource::Port)?;
        if info.0 >= state.ports.len() {
            return Err(Status::UNKNOWN_PORT);
        }
        state.port_targets.insert(port, info.0);
        Ok(())
    }

    fn port_open(&self, port: FakeHandle) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::PortOpen)?;
        state.expect_live(port, Resource::Port)?;
        if !state.port_targets.contains_key(&port) {
            return Err(Status::UNKNOWN_PORT);
        }
        state.open_ports.insert(port);
        Ok(())
    }

    fn port_reset(&self, port: FakeHandle) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::PortReset)?;
        if !state.open_ports.contains(&port) {
            return Err(Status::IO);
        }
        let path = state
            .port_targets
            .get(&port)
            .and_then(|&i| state.ports.get(i))
            .cloned();
        if let Some(path) = path {
            state.resets.push(path);
        }
        Ok(())
    }

    fn port_close(&self, port: FakeHandle) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::PortClose)?;
        if state.open_ports.remove(&port) {
            Ok(())
        } else {
            Err(Status::IO)
        }
    }

    fn port_free(&self, port: FakeHandle) -> Result<(), Status> {
        let mut state = self.state();
        state.enter(Call::PortFree)?;
        state.free(port, Resource::Port)?;
        state.port_targets.remove(&port);
        state.open_ports.remove(&port);
        Ok(())
    }
}
