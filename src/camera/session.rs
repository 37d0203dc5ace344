//! Connected camera and its lifecycle.

use super::{CameraError, Context, Operation};
use crate::native::{Backend, Scoped};

/// The native handle together with the context it was initialized with.
struct Bound<B: Backend> {
    raw: B::Camera,
    context: Context<B>,
}

/// A camera connected through the native library.
///
/// Holds the native camera handle and the [`Context`] it was initialized
/// with. Both are released together, either by [`Camera::free`] or when the
/// value drops; after that every operation reports
/// [`CameraError::Released`] instead of touching the handle.
///
/// A camera must be used from one thread at a time. Every call blocks for
/// the duration of the underlying hardware transaction.
pub struct Camera<B: Backend> {
    bound: Option<Bound<B>>,
}

impl<B: Backend> Camera<B> {
    pub(crate) fn from_parts(raw: B::Camera, context: Context<B>) -> Self {
        Self {
            bound: Some(Bound { raw, context }),
        }
    }

    /// True once the handle and its context have been released.
    pub fn is_released(&self) -> bool {
        self.bound.is_none()
    }

    /// Closes the connection so other applications can access the camera.
    ///
    /// The handle stays valid; the library reconnects on the next access.
    /// Does nothing on a released camera.
    pub fn exit(&self) -> Result<(), CameraError> {
        let Some(bound) = &self.bound else {
            return Ok(());
        };
        bound
            .context
            .backend()
            .camera_exit(bound.raw, bound.context.raw())
            .map_err(CameraError::at(Operation::Exit))
    }

    /// Exits, then releases the handle and the context.
    ///
    /// If exiting fails nothing is released and the camera stays usable.
    /// Once the handle has been unref'd the context is always released, even
    /// when the unref itself reported an error.
    pub fn free(&mut self) -> Result<(), CameraError> {
        self.exit()?;
        let Bound { raw, context } = self.bound.take().ok_or(CameraError::Released)?;

        let unref = context.backend().camera_unref(raw);
        context.free();
        unref.map_err(CameraError::at(Operation::Unref))?;

        tracing::info!("Camera released");
        Ok(())
    }

    /// Resets the camera's USB port.
    ///
    /// Exits the camera, then opens a separate port object on the camera's
    /// transport, issues a hardware reset and closes it again. The port
    /// object is closed and freed on every path; the first failure is the one
    /// returned. Some bodies need this after a crashed session left the port
    /// claimed.
    pub fn reset(&mut self) -> Result<(), CameraError> {
        self.exit()?;
        let bound = self.bound.as_ref().ok_or(CameraError::Released)?;
        let backend = bound.context.backend();

        let port = backend.port_new().map_err(CameraError::at(Operation::PortNew))?;
        let port = Scoped::new(backend, port, "port", B::port_free);

        let info = backend
            .camera_get_port_info(bound.raw)
            .map_err(CameraError::at(Operation::CameraPortInfo))?;
        backend
            .port_set_info(port.get(), info)
            .map_err(CameraError::at(Operation::PortSetInfo))?;

        backend
            .port_open(port.get())
            .map_err(CameraError::at(Operation::PortOpen))?;
        let opened = Scoped::new(backend, port.get(), "open port", B::port_close);

        backend
            .port_reset(opened.get())
            .map_err(CameraError::at(Operation::PortReset))?;

        opened
            .release()
            .map_err(CameraError::at(Operation::PortClose))?;
        port.release().map_err(CameraError::at(Operation::PortFree))?;

        tracing::info!("Camera port reset");
        Ok(())
    }
}

impl<B: Backend> Drop for Camera<B> {
    fn drop(&mut self) {
        let Some(Bound { raw, context }) = self.bound.take() else {
            return;
        };
        let backend = context.backend();
        if let Err(status) = backend.camera_exit(raw, context.raw()) {
            tracing::warn!(status = %status, "Failed to exit camera on drop");
        }
        if let Err(status) = backend.camera_unref(raw) {
            tracing::warn!(status = %status, "Failed to release camera on drop");
        }
    }
}

impl<B: Backend> std::fmt::Debug for Camera<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera")
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}
