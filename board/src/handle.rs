//! Shared handles to live driver instances.
//!
//! [Handle<T>] owns a strong reference to a driver object using [alloc::sync::Arc]. A driver
//! stack hands one out when it produces an instance (a transport, a controller, an MTD) and the
//! orchestrator keeps one in the [crate::registry] while the subsystem is live. Copies given to
//! a binding driver share the same object.
//!
//! Two handles refer to the same instance iff [Handle::same] holds. Tests rely on this to check
//! that a retry did not produce a fresh instance.
use alloc::sync::Arc;
use core::{
    fmt::{Debug, Formatter},
    ops::Deref,
};

/// Strong owning handle backed by [Arc<T>].
///
/// Cloning the handle increments the reference count; it never copies the driver object.
pub struct Handle<T: ?Sized> {
    inner: Arc<T>,
}

impl<T: ?Sized> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> From<T> for Handle<T> {
    fn from(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }
}

impl<T: ?Sized> From<Arc<T>> for Handle<T> {
    fn from(inner: Arc<T>) -> Self {
        Self { inner }
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: ?Sized + Debug> Debug for Handle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Handle").field(&&*self.inner).finish()
    }
}

impl<T: ?Sized> Handle<T> {
    /// Whether both handles refer to the same driver instance.
    pub fn same(&self, other: &Handle<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of handles currently sharing the instance.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}
