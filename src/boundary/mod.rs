//! Opaque-Handle Boundary
//!
//! Operations an external control layer calls with integer handles. Every
//! operation returns a [`StatusCode`] and writes results through
//! out-parameters; nothing here panics or returns an error type across the
//! boundary. An operation that fails to resolve its handle has no side
//! effects.
//!
//! Skin lifecycle changes are never performed here: they are posted to the
//! host loop, which owns the orchestrator.

pub mod ffi;
mod objects;


pub use objects::{
    MeterKind, MeterObject, NativeObject, SectionObject, SharedMeter, SharedSection, SkinInfo,
    SkinRef,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::error::RegistryError;
use crate::core::utils::normalize_skin_path;
use crate::handle::{Handle, HandleRegistry};
use crate::host::{HostHandle, HostTask};

/// Result of a boundary call
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 0,
    /// Unknown or released handle
    InvalidHandle = 1,
    /// Handle refers to a different kind of object
    WrongKind = 2,
    /// Lookup by name or path found nothing
    NotFound = 3,
    /// The host loop has stopped
    HostUnavailable = 4,
    InvalidArgument = 5,
}

impl StatusCode {
    pub fn is_ok(self) -> bool {
        self == StatusCode::Ok
    }
}

impl From<RegistryError> for StatusCode {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => StatusCode::InvalidHandle,
            RegistryError::WrongKind { .. } => StatusCode::WrongKind,
        }
    }
}

/// Boundary context: the shared handle table plus a route to the host loop
#[derive(Clone)]
pub struct Boundary {
    registry: Arc<HandleRegistry<NativeObject>>,
    host: HostHandle,
    skins_path: PathBuf,
}

impl Boundary {
    pub fn new(
        registry: Arc<HandleRegistry<NativeObject>>,
        host: HostHandle,
        skins_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            host,
            skins_path: skins_path.into(),
        }
    }

    pub fn registry(&self) -> &Arc<HandleRegistry<NativeObject>> {
        &self.registry
    }

    // ---- groups ----------------------------------------------------------

    pub fn group_belongs_to_group(&self, out: &mut bool, handle: i32, group: &str) -> StatusCode {
        write_out(out, self.resolve(handle).map(|o| o.belongs_to_group(group)))
    }

    /// Destroy a section or meter through its group view. Skins are owned
    /// by the host and cannot be destroyed here.
    pub fn group_destroy(&self, handle: i32) -> StatusCode {
        let result = self.resolve(handle).and_then(|object| match object {
            NativeObject::Skin(_) => Err(StatusCode::WrongKind),
            other => Ok(other),
        });
        status(result.map(|object| self.release(handle, object)))
    }

    // ---- sections --------------------------------------------------------

    pub fn section_get_name(&self, out: &mut String, handle: i32) -> StatusCode {
        write_out(out, self.section_op(handle, |s| s.name().to_string()))
    }

    pub fn section_get_original_name(&self, out: &mut String, handle: i32) -> StatusCode {
        write_out(out, self.section_op(handle, |s| s.original_name().to_string()))
    }

    pub fn section_has_dynamic_variables(&self, out: &mut bool, handle: i32) -> StatusCode {
        write_out(out, self.section_op(handle, |s| s.has_dynamic_variables()))
    }

    pub fn section_set_dynamic_variables(&self, handle: i32, value: bool) -> StatusCode {
        status(self.section_op(handle, |s| s.set_dynamic_variables(value)))
    }

    pub fn section_reset_update_counter(&self, handle: i32) -> StatusCode {
        status(self.section_op(handle, |s| s.reset_update_counter()))
    }

    pub fn section_get_update_counter(&self, out: &mut i32, handle: i32) -> StatusCode {
        write_out(out, self.section_op(handle, |s| s.update_counter()))
    }

    pub fn section_get_update_divider(&self, out: &mut i32, handle: i32) -> StatusCode {
        write_out(out, self.section_op(handle, |s| s.update_divider()))
    }

    pub fn section_get_on_update_action(&self, out: &mut String, handle: i32) -> StatusCode {
        write_out(out, self.section_op(handle, |s| s.on_update_action().to_string()))
    }

    /// Post the section's update action as a command scoped to its skin
    pub fn section_do_update_action(&self, handle: i32) -> StatusCode {
        let action = self.section_op(handle, |s| (s.on_update_action().to_string(), s.skin()));
        match action {
            Ok((command, _)) if command.is_empty() => StatusCode::Ok,
            Ok((command, skin)) => self.post(HostTask::ExecuteCommand {
                command,
                scope: Some(skin),
            }),
            Err(code) => code,
        }
    }

    pub fn section_destroy(&self, handle: i32) -> StatusCode {
        let result = self.section(handle).map(NativeObject::Section);
        status(result.map(|object| self.release(handle, object)))
    }

    // ---- meters ----------------------------------------------------------

    /// Create a string meter bound to a skin
    pub fn meter_string_init(&self, out: &mut i32, skin_handle: i32, name: &str) -> StatusCode {
        if name.trim().is_empty() {
            return StatusCode::InvalidArgument;
        }
        let result = self.skin(skin_handle).map(|skin| {
            let meter = MeterObject::new(MeterKind::String, name, skin.id);
            self.registry
                .allocate(NativeObject::Meter(Arc::new(Mutex::new(meter))))
                .as_raw()
        });
        write_out(out, result)
    }

    pub fn meter_destroy(&self, handle: i32) -> StatusCode {
        let result = self.resolve(handle).and_then(|object| match object {
            NativeObject::Meter(_) => Ok(object),
            _ => Err(StatusCode::WrongKind),
        });
        status(result.map(|object| self.release(handle, object)))
    }

    // ---- skins -----------------------------------------------------------

    /// Handle of the active skin at `path`
    pub fn skin_find(&self, out: &mut i32, path: &str) -> StatusCode {
        if path.trim().is_empty() {
            return StatusCode::InvalidArgument;
        }
        let (_, key) = normalize_skin_path(Path::new(path), &self.skins_path);
        let found = self
            .registry
            .find(|object| object.is_skin_key(&key))
            .map(Handle::as_raw)
            .ok_or(StatusCode::NotFound);
        write_out(out, found)
    }

    /// Handle of a named section of a skin
    pub fn skin_get_section(&self, out: &mut i32, skin_handle: i32, name: &str) -> StatusCode {
        let result = self.skin(skin_handle).and_then(|skin| {
            self.registry
                .find(|object| object.is_section_of(skin.id, name))
                .map(Handle::as_raw)
                .ok_or(StatusCode::NotFound)
        });
        write_out(out, result)
    }

    pub fn skin_get_path(&self, out: &mut String, handle: i32) -> StatusCode {
        write_out(out, self.skin(handle).map(|skin| skin.path().display().to_string()))
    }

    pub fn skin_belongs_to_group(&self, out: &mut bool, handle: i32, group: &str) -> StatusCode {
        write_out(out, self.skin(handle).map(|skin| skin.groups.belongs_to(group)))
    }

    pub fn skin_deactivate(&self, handle: i32) -> StatusCode {
        match self.skin(handle) {
            Ok(skin) => self.post(HostTask::Deactivate(skin.id)),
            Err(code) => code,
        }
    }

    pub fn skin_execute_command(&self, handle: i32, command: &str) -> StatusCode {
        match self.skin(handle) {
            Ok(skin) => self.post(HostTask::ExecuteCommand {
                command: command.to_string(),
                scope: Some(skin.id),
            }),
            Err(code) => code,
        }
    }

    // ---- host ------------------------------------------------------------

    pub fn host_activate_skin(&self, path: &str) -> StatusCode {
        match non_empty(path) {
            Some(path) => self.post(HostTask::Activate(path)),
            None => StatusCode::InvalidArgument,
        }
    }

    pub fn host_toggle_skin(&self, path: &str) -> StatusCode {
        match non_empty(path) {
            Some(path) => self.post(HostTask::Toggle(path)),
            None => StatusCode::InvalidArgument,
        }
    }

    pub fn host_refresh_all(&self) -> StatusCode {
        self.post(HostTask::RefreshAll)
    }

    /// Load a layout by name or path; `None` reloads the current one
    pub fn host_load_layout(&self, layout: Option<&str>) -> StatusCode {
        self.post(HostTask::LoadLayout(layout.and_then(non_empty)))
    }

    pub fn host_execute_command(&self, command: &str) -> StatusCode {
        if command.trim().is_empty() {
            return StatusCode::InvalidArgument;
        }
        self.post(HostTask::ExecuteCommand {
            command: command.to_string(),
            scope: None,
        })
    }

    // ---- internals -------------------------------------------------------

    fn resolve(&self, handle: i32) -> Result<NativeObject, StatusCode> {
        self.registry
            .resolve(Handle::from_raw(handle))
            .map_err(StatusCode::from)
    }

    fn section(&self, handle: i32) -> Result<SharedSection, StatusCode> {
        match self.resolve(handle)? {
            NativeObject::Section(section) => Ok(section),
            other => Err(wrong_kind(handle, "section", &other)),
        }
    }

    fn skin(&self, handle: i32) -> Result<SkinRef, StatusCode> {
        match self.resolve(handle)? {
            NativeObject::Skin(skin) => Ok(skin),
            other => Err(wrong_kind(handle, "skin", &other)),
        }
    }

    fn section_op<R>(
        &self,
        handle: i32,
        f: impl FnOnce(&mut SectionObject) -> R,
    ) -> Result<R, StatusCode> {
        let section = self.section(handle)?;
        let mut guard = section.lock();
        Ok(f(&mut *guard))
    }

    /// Resolve, release, then drop: the mapping is gone before the object is
    fn release(&self, handle: i32, object: NativeObject) {
        self.registry.release(Handle::from_raw(handle));
        tracing::debug!(handle, kind = object.kind_name(), "Boundary object destroyed");
        drop(object);
    }

    fn post(&self, task: HostTask) -> StatusCode {
        match self.host.post(task) {
            Ok(()) => StatusCode::Ok,
            Err(_) => StatusCode::HostUnavailable,
        }
    }
}

fn wrong_kind(handle: i32, expected: &'static str, actual: &NativeObject) -> StatusCode {
    let err = RegistryError::WrongKind {
        handle,
        expected,
        actual: actual.kind_name(),
    };
    tracing::debug!("{}", err);
    err.into()
}

fn write_out<T>(out: &mut T, result: Result<T, StatusCode>) -> StatusCode {
    match result {
        Ok(value) => {
            *out = value;
            StatusCode::Ok
        }
        Err(code) => code,
    }
}

fn status(result: Result<(), StatusCode>) -> StatusCode {
    result.err().unwrap_or(StatusCode::Ok)
}

fn non_empty(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| PathBuf::from(value))
}
