//! Windows-specific OS integration
//!
//! This module provides Windows implementations for:
//! - Multi-monitor enumeration
//! - Work-area control via `SystemParametersInfoW(SPI_SETWORKAREA)`

pub mod monitor;
pub mod work_area;

pub use monitor::enumerate_monitors;
pub use work_area::Win32Display;
