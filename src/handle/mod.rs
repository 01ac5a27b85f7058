//! Opaque Handle Registry
//!
//! Maps small positive integers to native objects so a foreign caller can
//! refer to them without holding pointers. Handles are handed out from a
//! monotonic counter starting at 1 and are never reused while their mapping
//! is live. All operations run under one coarse lock, so the registry may be
//! shared with threads outside the host loop.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use crate::core::error::RegistryError;

/// Opaque integer identifier exposed across the foreign boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Handle(i32);

impl Handle {
    /// Wrap a raw value received from a foreign caller
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw value handed to a foreign caller
    pub const fn as_raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Inner<T> {
    next: i32,
    entries: HashMap<i32, T>,
}

/// Handle ↔ resource association table
pub struct HandleRegistry<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> HandleRegistry<T> {
    /// Create an empty registry whose first handle is 1
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next: 1,
                entries: HashMap::new(),
            }),
        }
    }

    /// Register a resource and return its new handle
    pub fn allocate(&self, resource: T) -> Handle {
        let mut inner = self.inner.lock();

        // The counter only wraps after 2^31 allocations; skip anything still live.
        let mut raw = inner.next;
        while inner.entries.contains_key(&raw) {
            raw = next_raw(raw);
        }
        inner.next = next_raw(raw);
        inner.entries.insert(raw, resource);

        tracing::trace!(handle = raw, live = inner.entries.len(), "Handle allocated");
        Handle(raw)
    }

    /// Remove a mapping, returning the resource it pointed at.
    ///
    /// The resource is handed back rather than dropped so callers control
    /// destruction order. Releasing an unknown handle is a caller bug; it is
    /// logged and reported as `None`.
    pub fn release(&self, handle: Handle) -> Option<T> {
        let removed = self.inner.lock().entries.remove(&handle.0);
        if removed.is_none() {
            tracing::warn!(handle = handle.0, "Release of unregistered handle");
        }
        removed
    }

    /// Whether the handle currently maps to a resource
    pub fn contains(&self, handle: Handle) -> bool {
        self.inner.lock().entries.contains_key(&handle.0)
    }

    /// Number of live mappings
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether no mappings are live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` against the resource while the table lock is held
    pub fn with<R>(&self, handle: Handle, f: impl FnOnce(&T) -> R) -> Result<R, RegistryError> {
        let inner = self.inner.lock();
        inner
            .entries
            .get(&handle.0)
            .map(f)
            .ok_or(RegistryError::NotFound(handle.0))
    }

    /// First live handle whose resource matches `pred`
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<Handle> {
        let inner = self.inner.lock();
        inner
            .entries
            .iter()
            .filter(|(_, resource)| pred(resource))
            .map(|(raw, _)| *raw)
            .min()
            .map(Handle)
    }
}

impl<T: Clone> HandleRegistry<T> {
    /// Look up the resource behind a handle
    pub fn resolve(&self, handle: Handle) -> Result<T, RegistryError> {
        self.with(handle, T::clone)
    }
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn next_raw(raw: i32) -> i32 {
    raw.checked_add(1).unwrap_or(1)
}
