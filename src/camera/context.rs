//! Native execution context.

use super::CameraError;
use crate::native::Backend;

/// Owns one native context for a camera session or a discovery call.
///
/// The context is released exactly once: by [`Context::free`], which
/// consumes the value, or on drop.
pub struct Context<B: Backend> {
    backend: B,
    raw: B::Context,
}

impl<B: Backend> Context<B> {
    /// Allocates a native context.
    pub fn new(backend: B) -> Result<Self, CameraError> {
        let raw = backend.context_new().ok_or(CameraError::ContextInit)?;
        Ok(Self { backend, raw })
    }

    /// Releases the native context.
    pub fn free(self) {
        drop(self);
    }

    #[inline]
    pub(crate) fn raw(&self) -> B::Context {
        self.raw
    }

    #[inline]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: Backend> Drop for Context<B> {
    fn drop(&mut self) {
        self.backend.context_unref(self.raw);
        tracing::trace!("Native context released");
    }
}

impl<B: Backend> std::fmt::Debug for Context<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").field("raw", &self.raw).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{Call, FakeBackend, Resource, Status};

    #[test]
    fn test_context_free_releases_once() {
        let backend = FakeBackend::new();
        let context = Context::new(backend.clone()).unwrap();
        assert_eq!(backend.live(Resource::Context), 1);

        context.free();
        assert_eq!(backend.live(Resource::Context), 0);
        assert_eq!(backend.calls(Call::ContextUnref), 1);
        assert_eq!(backend.double_releases(), 0);
    }

    #[test]
    fn test_context_drop_releases() {
        let backend = FakeBackend::new();
        drop(Context::new(backend.clone()).unwrap());
        assert_eq!(backend.calls(Call::ContextUnref), 1);
        assert!(backend.all_released());
    }

    #[test]
    fn test_context_init_failure() {
        let backend = FakeBackend::new();
        backend.fail(Call::ContextNew, Status::NO_MEMORY);
        assert!(matches!(
            Context::new(backend.clone()),
            Err(CameraError::ContextInit)
        ));
        assert_eq!(backend.calls(Call::ContextUnref), 0);
    }
}
