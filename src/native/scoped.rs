//! Scoped ownership of a single native handle.

use super::{Backend, Status};

/// Release function for a handle of type `T`.
pub(crate) type Release<B, T> = fn(&B, T) -> Result<(), Status>;

/// Owns one native handle and releases it exactly once.
///
/// The handle is released when the guard drops, unless it was released
/// explicitly with [`Scoped::release`] (which reports the status) or handed
/// over with [`Scoped::into_raw`]. Release failures during drop are logged;
/// the error that caused the early exit is the one the caller sees.
pub(crate) struct Scoped<'b, B: Backend, T: Copy> {
    backend: &'b B,
    raw: T,
    armed: bool,
    what: &'static str,
    release: Release<B, T>,
}

impl<'b, B: Backend, T: Copy> Scoped<'b, B, T> {
    pub(crate) fn new(backend: &'b B, raw: T, what: &'static str, release: Release<B, T>) -> Self {
        Self {
            backend,
            raw,
            armed: true,
            what,
            release,
        }
    }

    #[inline]
    pub(crate) fn get(&self) -> T {
        self.raw
    }

    /// Releases now and reports the native status.
    pub(crate) fn release(mut self) -> Result<(), Status> {
        self.armed = false;
        (self.release)(self.backend, self.raw)
    }

    /// Gives up ownership without releasing.
    pub(crate) fn into_raw(mut self) -> T {
        self.armed = false;
        self.raw
    }
}

impl<B: Backend, T: Copy> Drop for Scoped<'_, B, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(status) = (self.release)(self.backend, self.raw) {
            tracing::warn!(
                resource = self.what,
                status = %status,
                "Failed to release native resource"
            );
        }
    }
}
