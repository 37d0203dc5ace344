//! Boundary to the native device-control library.
//!
//! The library is reached only through the [`Backend`] trait, one method per
//! native call. Handles are opaque `Copy` values; ownership of what they
//! point to is tracked by the callers in [`crate::camera`] and
//! [`crate::discovery`], never by the backend itself.

mod fake;
#[cfg(feature = "gphoto2")]
mod gphoto2;
mod scoped;
mod status;

pub use fake::{Binding, Call, FakeAbilities, FakeBackend, FakeHandle, FakePortInfo, Resource};
#[cfg(feature = "gphoto2")]
pub use gphoto2::Gphoto2;
pub(crate) use scoped::Scoped;
pub use status::Status;

use std::fmt::Debug;

/// The function contract of the native device-control library.
///
/// Allocation calls hand back a fresh handle that the caller must release
/// exactly once with the matching `*_free` / `*_unref` call. Calls that
/// report a count or an index return it as `usize`; negative native values
/// come back as `Err(Status)`.
pub trait Backend: Clone {
    /// Execution context carried through most calls.
    type Context: Copy + Debug;
    /// Camera handle.
    type Camera: Copy + Debug;
    /// Name/value list filled by autodetection.
    type List: Copy + Debug;
    /// List of per-model ability descriptors.
    type AbilitiesList: Copy + Debug;
    /// One model's ability descriptor.
    type Abilities;
    /// List of known transport ports.
    type PortInfoList: Copy + Debug;
    /// One transport descriptor. Borrowed from its list or camera.
    type PortInfo: Copy;
    /// Low-level port object used for resets.
    type Port: Copy + Debug;

    /// Allocates a context. `None` when the library cannot create one.
    fn context_new(&self) -> Option<Self::Context>;
    /// Drops the caller's reference to a context.
    fn context_unref(&self, context: Self::Context);

    /// Allocates an empty name/value list.
    fn list_new(&self) -> Result<Self::List, Status>;
    /// Frees a name/value list.
    fn list_free(&self, list: Self::List) -> Result<(), Status>;
    /// Number of entries in the list.
    fn list_count(&self, list: Self::List) -> Result<usize, Status>;
    /// Name (camera model) of entry `index`.
    fn list_get_name(&self, list: Self::List, index: usize) -> Result<String, Status>;
    /// Value (port path) of entry `index`.
    fn list_get_value(&self, list: Self::List, index: usize) -> Result<String, Status>;
    /// Fills `list` with the currently connected cameras.
    fn autodetect(&self, list: Self::List, context: Self::Context) -> Result<(), Status>;

    /// Allocates an empty abilities list.
    fn abilities_list_new(&self) -> Result<Self::AbilitiesList, Status>;
    /// Frees an abilities list.
    fn abilities_list_free(&self, list: Self::AbilitiesList) -> Result<(), Status>;
    /// Loads every driver's abilities into `list`.
    fn abilities_list_load(
        &self,
        list: Self::AbilitiesList,
        context: Self::Context,
    ) -> Result<(), Status>;
    /// Index of `model` within the abilities list.
    fn abilities_list_lookup_model(
        &self,
        list: Self::AbilitiesList,
        model: &str,
    ) -> Result<usize, Status>;
    /// Copies the abilities stored at `index`.
    fn abilities_list_get_abilities(
        &self,
        list: Self::AbilitiesList,
        index: usize,
    ) -> Result<Self::Abilities, Status>;

    /// Allocates an empty port info list.
    fn port_info_list_new(&self) -> Result<Self::PortInfoList, Status>;
    /// Frees a port info list.
    fn port_info_list_free(&self, list: Self::PortInfoList) -> Result<(), Status>;
    /// Loads every available transport into `list`.
    fn port_info_list_load(&self, list: Self::PortInfoList) -> Result<(), Status>;
    /// Index of the port with the given path.
    fn port_info_list_lookup_path(
        &self,
        list: Self::PortInfoList,
        path: &str,
    ) -> Result<usize, Status>;
    /// Port info stored at `index`.
    fn port_info_list_get_info(
        &self,
        list: Self::PortInfoList,
        index: usize,
    ) -> Result<Self::PortInfo, Status>;

    /// Allocates a camera handle with a reference count of one.
    fn camera_new(&self) -> Result<Self::Camera, Status>;
    /// Binds a model's abilities to the camera.
    fn camera_set_abilities(
        &self,
        camera: Self::Camera,
        abilities: &Self::Abilities,
    ) -> Result<(), Status>;
    /// Binds a transport to the camera.
    fn camera_set_port_info(&self, camera: Self::Camera, info: Self::PortInfo)
        -> Result<(), Status>;
    /// Transport currently bound to the camera.
    fn camera_get_port_info(&self, camera: Self::Camera) -> Result<Self::PortInfo, Status>;
    /// Opens the connection to the device.
    fn camera_init(&self, camera: Self::Camera, context: Self::Context) -> Result<(), Status>;
    /// Closes the connection to the device without releasing the handle.
    fn camera_exit(&self, camera: Self::Camera, context: Self::Context) -> Result<(), Status>;
    /// Drops the caller's reference to the camera handle.
    fn camera_unref(&self, camera: Self::Camera) -> Result<(), Status>;

    /// Allocates a port object.
    fn port_new(&self) -> Result<Self::Port, Status>;
    /// Points the port object at a transport.
    fn port_set_info(&self, port: Self::Port, info: Self::PortInfo) -> Result<(), Status>;
    /// Opens the port.
    fn port_open(&self, port: Self::Port) -> Result<(), Status>;
    /// Issues a hardware reset on an open port.
    fn port_reset(&self, port: Self::Port) -> Result<(), Status>;
    /// Closes the port.
    fn port_close(&self, port: Self::Port) -> Result<(), Status>;
    /// Frees the port object.
    fn port_free(&self, port: Self::Port) -> Result<(), Status>;
}
