//! libgphoto2 backend.
//!
//! Thin mapping of [`Backend`] onto the C API. Every function here is one
//! native call plus its status check; ownership is handled by the callers.

#![allow(unsafe_code)]

use super::{Backend, Status};
use libgphoto2_sys as sys;
use std::ffi::{CStr, CString};
use std::mem::MaybeUninit;
use std::os::raw::{c_char, c_int};
use std::ptr;

/// Calls a libgphoto2 function and converts its integer result.
macro_rules! gp_call {
    ($func:ident $(, $arg:expr)*) => {
        // SAFETY: arguments are live handles obtained from libgphoto2 or
        // out-pointers to locals, as each call site documents.
        Status::check(unsafe { sys::$func($($arg),*) })
    };
}

/// The native device-control library.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gphoto2;

fn non_null<T>(raw: *mut T) -> Result<*mut T, Status> {
    if raw.is_null() {
        Err(Status::ERROR)
    } else {
        Ok(raw)
    }
}

fn to_c_index(index: usize) -> Result<c_int, Status> {
    c_int::try_from(index).map_err(|_| Status::BAD_PARAMETERS)
}

fn to_c_string(value: &str) -> Result<CString, Status> {
    CString::new(value).map_err(|_| Status::BAD_PARAMETERS)
}

/// Copies a string owned by libgphoto2.
///
/// # Safety
/// `raw` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
unsafe fn copy_string(raw: *const c_char) -> String {
    if raw.is_null() {
        return String::new();
    }
    CStr::from_ptr(raw).to_string_lossy().into_owned()
}

impl Backend for Gphoto2 {
    type Context = *mut sys::GPContext;
    type Camera = *mut sys::Camera;
    type List = *mut sys::CameraList;
    type AbilitiesList = *mut sys::CameraAbilitiesList;
    type Abilities = sys::CameraAbilities;
    type PortInfoList = *mut sys::GPPortInfoList;
    type PortInfo = sys::GPPortInfo;
    type Port = *mut sys::GPPort;

    fn context_new(&self) -> Option<Self::Context> {
        // SAFETY: no preconditions.
        let raw = unsafe { sys::gp_context_new() };
        (!raw.is_null()).then_some(raw)
    }

    fn context_unref(&self, context: Self::Context) {
        // SAFETY: `context` came from `gp_context_new` and is released once.
        unsafe { sys::gp_context_unref(context) }
    }

    fn list_new(&self) -> Result<Self::List, Status> {
        let mut list = ptr::null_mut();
        gp_call!(gp_list_new, &mut list)?;
        non_null(list)
    }

    fn list_free(&self, list: Self::List) -> Result<(), Status> {
        gp_call!(gp_list_free, list).map(drop)
    }

    fn list_count(&self, list: Self::List) -> Result<usize, Status> {
        gp_call!(gp_list_count, list).map(|n| n as usize)
    }

    fn list_get_name(&self, list: Self::List, index: usize) -> Result<String, Status> {
        let mut name: *const c_char = ptr::null();
        gp_call!(gp_list_get_name, list, to_c_index(index)?, &mut name)?;
        // SAFETY: the string is owned by `list`, which outlives this call.
        Ok(unsafe { copy_string(name) })
    }

    fn list_get_value(&self, list: Self::List, index: usize) -> Result<String, Status> {
        let mut value: *const c_char = ptr::null();
        gp_call!(gp_list_get_value, list, to_c_index(index)?, &mut value)?;
        // SAFETY: the string is owned by `list`, which outlives this call.
        Ok(unsafe { copy_string(value) })
    }

    fn autodetect(&self, list: Self::List, context: Self::Context) -> Result<(), Status> {
        gp_call!(gp_camera_autodetect, list, context).map(drop)
    }

    fn abilities_list_new(&self) -> Result<Self::AbilitiesList, Status> {
        let mut list = ptr::null_mut();
        gp_call!(gp_abilities_list_new, &mut list)?;
        non_null(list)
    }

    fn abilities_list_free(&self, list: Self::AbilitiesList) -> Result<(), Status> {
        gp_call!(gp_abilities_list_free, list).map(drop)
    }

    fn abilities_list_load(
        &self,
        list: Self::AbilitiesList,
        context: Self::Context,
    ) -> Result<(), Status> {
        gp_call!(gp_abilities_list_load, list, context).map(drop)
    }

    fn abilities_list_lookup_model(
        &self,
        list: Self::AbilitiesList,
        model: &str,
    ) -> Result<usize, Status> {
        let model = to_c_string(model)?;
        gp_call!(gp_abilities_list_lookup_model, list, model.as_ptr()).map(|i| i as usize)
    }

    fn abilities_list_get_abilities(
        &self,
        list: Self::AbilitiesList,
        index: usize,
    ) -> Result<Self::Abilities, Status> {
        let mut abilities = MaybeUninit::<sys::CameraAbilities>::uninit();
        gp_call!(
            gp_abilities_list_get_abilities,
            list,
            to_c_index(index)?,
            abilities.as_mut_ptr()
        )?;
        // SAFETY: filled in by the successful call above.
        Ok(unsafe { abilities.assume_init() })
    }

    fn port_info_list_new(&self) -> Result<Self::PortInfoList, Status> {
        let mut list = ptr::null_mut();
        gp_call!(gp_port_info_list_new, &mut list)?;
        non_null(list)
    }

    fn port_info_list_free(&self, list: Self::PortInfoList) -> Result<(), Status> {
        gp_call!(gp_port_info_list_free, list).map(drop)
    }

    fn port_info_list_load(&self, list: Self::PortInfoList) -> Result<(), Status> {
        gp_call!(gp_port_info_list_load, list).map(drop)
    }

    fn port_info_list_lookup_path(
        &self,
        list: Self::PortInfoList,
        path: &str,
    ) -> Result<usize, Status> {
        let path = to_c_string(path)?;
        gp_call!(gp_port_info_list_lookup_path, list, path.as_ptr()).map(|i| i as usize)
    }

    fn port_info_list_get_info(
        &self,
        list: Self::PortInfoList,
        index: usize,
    ) -> Result<Self::PortInfo, Status> {
        let mut info: sys::GPPortInfo = ptr::null_mut();
        gp_call!(gp_port_info_list_get_info, list, to_c_index(index)?, &mut info)?;
        non_null(info)
    }

    fn camera_new(&self) -> Result<Self::Camera, Status> {
        let mut camera = ptr::null_mut();
        gp_call!(gp_camera_new, &mut camera)?;
        non_null(camera)
    }

    fn camera_set_abilities(
        &self,
        camera: Self::Camera,
        abilities: &Self::Abilities,
    ) -> Result<(), Status> {
        // SAFETY: `CameraAbilities` is a plain C struct passed by value;
        // a bitwise copy is what C would do.
        let abilities = unsafe { ptr::read(abilities) };
        gp_call!(gp_camera_set_abilities, camera, abilities).map(drop)
    }

    fn camera_set_port_info(
        &self,
        camera: Self::Camera,
        info: Self::PortInfo,
    ) -> Result<(), Status> {
        gp_call!(gp_camera_set_port_info, camera, info).map(drop)
    }

    fn camera_get_port_info(&self, camera: Self::Camera) -> Result<Self::PortInfo, Status> {
        let mut info: sys::GPPortInfo = ptr::null_mut();
        gp_call!(gp_camera_get_port_info, camera, &mut info)?;
        non_null(info)
    }

    fn camera_init(&self, camera: Self::Camera, context: Self::Context) -> Result<(), Status> {
        gp_call!(gp_camera_init, camera, context).map(drop)
    }

    fn camera_exit(&self, camera: Self::Camera, context: Self::Context) -> Result<(), Status> {
        gp_call!(gp_camera_exit, camera, context).map(drop)
    }

    fn camera_unref(&self, camera: Self::Camera) -> Result<(), Status> {
        gp_call!(gp_camera_unref, camera).map(drop)
    }

    fn port_new(&self) -> Result<Self::Port, Status> {
        let mut port = ptr::null_mut();
        gp_call!(gp_port_new, &mut port)?;
        non_null(port)
    }

    fn port_set_info(&self, port: Self::Port, info: Self::PortInfo) -> Result<(), Status> {
        gp_call!(gp_port_set_info, port, info).map(drop)
    }

    fn port_open(&self, port: Self::Port) -> Result<(), Status> {
        gp_call!(gp_port_open, port).map(drop)
    }

    fn port_reset(&self, port: Self::Port) -> Result<(), Status> {
        gp_call!(gp_port_reset, port).map(drop)
    }

    fn port_close(&self, port: Self::Port) -> Result<(), Status> {
        gp_call!(gp_port_close, port).map(drop)
    }

    fn port_free(&self, port: Self::Port) -> Result<(), Status> {
        gp_call!(gp_port_free, port).map(drop)
    }
}
