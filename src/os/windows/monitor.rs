//! Windows Monitor Enumeration
//!
//! Lists connected displays in `EnumDisplayMonitors` order, which is the
//! order `DesktopWorkArea@N` indices refer to.

use windows::Win32::Foundation::{BOOL, LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFOEXW,
};

use crate::core::error::WorkAreaError;
use crate::os::{MonitorInfo, Rect};

/// Enumerate all connected monitors
pub fn enumerate_monitors() -> Result<Vec<MonitorInfo>, WorkAreaError> {
    let mut monitors: Vec<MonitorInfo> = Vec::new();
    let monitors_ptr = &mut monitors as *mut Vec<MonitorInfo>;

    let ok = unsafe {
        EnumDisplayMonitors(
            HDC::default(),
            None,
            Some(monitor_enum_callback),
            LPARAM(monitors_ptr as isize),
        )
    };

    if !ok.as_bool() {
        return Err(WorkAreaError::MonitorEnumFailed {
            reason: "EnumDisplayMonitors returned FALSE".to_string(),
        });
    }

    tracing::debug!("Enumerated {} monitors", monitors.len());
    Ok(monitors)
}

fn to_rect(rect: RECT) -> Rect {
    Rect::new(rect.left, rect.top, rect.right, rect.bottom)
}

unsafe extern "system" fn monitor_enum_callback(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _lprect: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let monitors = &mut *(lparam.0 as *mut Vec<MonitorInfo>);

    let mut monitor_info = MONITORINFOEXW::default();
    monitor_info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

    if GetMonitorInfoW(hmonitor, &mut monitor_info.monitorInfo).as_bool() {
        let is_primary = (monitor_info.monitorInfo.dwFlags & 1) != 0; // MONITORINFOF_PRIMARY
        let len = monitor_info
            .szDevice
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(monitor_info.szDevice.len());

        monitors.push(MonitorInfo {
            name: String::from_utf16_lossy(&monitor_info.szDevice[..len]),
            screen: to_rect(monitor_info.monitorInfo.rcMonitor),
            work: to_rect(monitor_info.monitorInfo.rcWork),
            is_primary,
        });
    }

    BOOL(1) // Continue enumeration
}
