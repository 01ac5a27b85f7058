//! Windows work-area control

use std::ffi::c_void;

use windows::Win32::Foundation::{LPARAM, RECT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    SendMessageTimeoutW, SystemParametersInfoW, HWND_BROADCAST, SMTO_ABORTIFHUNG,
    SPI_SETWORKAREA, SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS, WM_SETTINGCHANGE,
};

use crate::core::error::WorkAreaError;
use crate::os::{DisplayEnvironment, MonitorInfo, Rect};

use super::monitor::enumerate_monitors;

/// Timeout for the change broadcast, in milliseconds
const NOTIFY_TIMEOUT_MS: u32 = 1000;

/// Live Win32 display environment
#[derive(Debug, Default)]
pub struct Win32Display;

impl Win32Display {
    pub fn new() -> Self {
        Self
    }
}

impl DisplayEnvironment for Win32Display {
    fn monitors(&self) -> Result<Vec<MonitorInfo>, WorkAreaError> {
        enumerate_monitors()
    }

    fn set_work_area(&mut self, rect: Rect) -> Result<(), WorkAreaError> {
        let mut raw = RECT {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        };

        unsafe {
            SystemParametersInfoW(
                SPI_SETWORKAREA,
                0,
                Some(&mut raw as *mut RECT as *mut c_void),
                SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
            )
        }
        .map_err(|e| WorkAreaError::SetFailed {
            reason: format!("SystemParametersInfoW failed: {:?}", e),
        })
    }

    fn notify_work_area_changed(&mut self) {
        unsafe {
            SendMessageTimeoutW(
                HWND_BROADCAST,
                WM_SETTINGCHANGE,
                WPARAM(SPI_SETWORKAREA.0 as usize),
                LPARAM(0),
                SMTO_ABORTIFHUNG,
                NOTIFY_TIMEOUT_MS,
                None,
            );
        }
    }
}
