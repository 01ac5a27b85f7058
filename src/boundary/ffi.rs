//! C ABI
//!
//! Thin `extern "C"` wrappers over [`Boundary`]. The caller owns the host
//! pointer returned by [`skinhost_initialize`] and passes it to every call;
//! there is no global state. Every function returns a [`StatusCode`] as
//! `i32` and writes results through out-pointers only on success.

use std::ffi::{c_char, CStr};
use std::path::PathBuf;

use super::{Boundary, StatusCode};
use crate::core::config::HostConfig;
use crate::host::HostRuntime;

/// Start a host. `work_dir` may be null to use the configured default.
/// Returns null on failure.
///
/// # Safety
/// `work_dir` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn skinhost_initialize(work_dir: *const c_char) -> *mut HostRuntime {
    let mut config = match HostConfig::load(None) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Host configuration rejected: {}", e);
            return std::ptr::null_mut();
        }
    };
    if let Some(dir) = str_arg(work_dir) {
        config.work_directory = PathBuf::from(dir);
    }

    match HostRuntime::start(config) {
        Ok(runtime) => Box::into_raw(Box::new(runtime)),
        Err(e) => {
            tracing::error!("Host failed to start: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Stop a host and free it.
///
/// # Safety
/// `host` must come from [`skinhost_initialize`] and not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn skinhost_finalize(host: *mut HostRuntime) {
    if !host.is_null() {
        let mut runtime = Box::from_raw(host);
        runtime.stop();
    }
}

/// # Safety
/// `host` must be null or live; `out` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn skinhost_section_get_update_counter(
    host: *const HostRuntime,
    out: *mut i32,
    handle: i32,
) -> i32 {
    with_out(host, out, |b, out| b.section_get_update_counter(out, handle))
}

/// # Safety
/// `host` must be null or live; `out` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn skinhost_section_get_update_divider(
    host: *const HostRuntime,
    out: *mut i32,
    handle: i32,
) -> i32 {
    with_out(host, out, |b, out| b.section_get_update_divider(out, handle))
}

/// # Safety
/// `host` must be null or live; `out` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn skinhost_section_has_dynamic_variables(
    host: *const HostRuntime,
    out: *mut bool,
    handle: i32,
) -> i32 {
    with_out(host, out, |b, out| b.section_has_dynamic_variables(out, handle))
}

/// # Safety
/// `host` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn skinhost_section_set_dynamic_variables(
    host: *const HostRuntime,
    handle: i32,
    value: bool,
) -> i32 {
    with_boundary(host, |b| b.section_set_dynamic_variables(handle, value))
}

/// # Safety
/// `host` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn skinhost_section_reset_update_counter(
    host: *const HostRuntime,
    handle: i32,
) -> i32 {
    with_boundary(host, |b| b.section_reset_update_counter(handle))
}

/// # Safety
/// `host` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn skinhost_section_do_update_action(
    host: *const HostRuntime,
    handle: i32,
) -> i32 {
    with_boundary(host, |b| b.section_do_update_action(handle))
}

/// # Safety
/// `host` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn skinhost_section_destroy(host: *const HostRuntime, handle: i32) -> i32 {
    with_boundary(host, |b| b.section_destroy(handle))
}

/// # Safety
/// `host` must be null or live; `out` must be null or writable; `group`
/// must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn skinhost_group_belongs_to_group(
    host: *const HostRuntime,
    out: *mut bool,
    handle: i32,
    group: *const c_char,
) -> i32 {
    let Some(group) = str_arg(group) else {
        return StatusCode::InvalidArgument as i32;
    };
    with_out(host, out, |b, out| b.group_belongs_to_group(out, handle, group))
}

/// # Safety
/// `host` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn skinhost_group_destroy(host: *const HostRuntime, handle: i32) -> i32 {
    with_boundary(host, |b| b.group_destroy(handle))
}

/// # Safety
/// `host` must be null or live; `out` must be null or writable; `name`
/// must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn skinhost_meter_string_init(
    host: *const HostRuntime,
    out: *mut i32,
    skin_handle: i32,
    name: *const c_char,
) -> i32 {
    let Some(name) = str_arg(name) else {
        return StatusCode::InvalidArgument as i32;
    };
    with_out(host, out, |b, out| b.meter_string_init(out, skin_handle, name))
}

/// # Safety
/// `host` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn skinhost_meter_destroy(host: *const HostRuntime, handle: i32) -> i32 {
    with_boundary(host, |b| b.meter_destroy(handle))
}

/// # Safety
/// `host` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn skinhost_skin_deactivate(host: *const HostRuntime, handle: i32) -> i32 {
    with_boundary(host, |b| b.skin_deactivate(handle))
}

/// # Safety
/// `host` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn skinhost_refresh_all(host: *const HostRuntime) -> i32 {
    with_boundary(host, |b| b.host_refresh_all())
}

/// # Safety
/// `host` must be null or live; `command` must be null or a valid
/// NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn skinhost_execute_command(
    host: *const HostRuntime,
    command: *const c_char,
) -> i32 {
    let Some(command) = str_arg(command) else {
        return StatusCode::InvalidArgument as i32;
    };
    with_boundary(host, |b| b.host_execute_command(command))
}

unsafe fn with_boundary(host: *const HostRuntime, f: impl FnOnce(&Boundary) -> StatusCode) -> i32 {
    match host.as_ref() {
        Some(host) => f(host.boundary()) as i32,
        None => StatusCode::HostUnavailable as i32,
    }
}

unsafe fn with_out<T: Default>(
    host: *const HostRuntime,
    out: *mut T,
    f: impl FnOnce(&Boundary, &mut T) -> StatusCode,
) -> i32 {
    let Some(host) = host.as_ref() else {
        return StatusCode::HostUnavailable as i32;
    };
    if out.is_null() {
        return StatusCode::InvalidArgument as i32;
    }

    let mut value = T::default();
    let status = f(host.boundary(), &mut value);
    if status.is_ok() {
        out.write(value);
    }
    status as i32
}

unsafe fn str_arg<'a>(value: *const c_char) -> Option<&'a str> {
    if value.is_null() {
        return None;
    }
    CStr::from_ptr(value).to_str().ok()
}
