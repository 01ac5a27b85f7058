//! OS Integration Layer for SkinHost
//!
//! This module provides the display-device view the work-area coordinator
//! works against:
//! - Monitor enumeration (screen and work rectangles)
//! - Setting the usable work area of a device
//! - Broadcasting work-area changes to other observers

#[cfg(windows)]
pub mod windows;

pub mod stub;


use std::fmt;

use crate::core::error::WorkAreaError;

pub use stub::VirtualDisplay;

/// Device rectangle in edge form (left, top, right, bottom)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Translate by `(dx, dy)`; `None` if an edge leaves the `i32` range
    pub fn offset(&self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self::new(
            self.left.checked_add(dx)?,
            self.top.checked_add(dy)?,
            self.right.checked_add(dx)?,
            self.bottom.checked_add(dy)?,
        ))
    }

    /// Shrink by per-edge insets stored in `margins`; `None` on overflow
    pub fn inset(&self, margins: &Rect) -> Option<Self> {
        Some(Self::new(
            self.left.checked_add(margins.left)?,
            self.top.checked_add(margins.top)?,
            self.right.checked_sub(margins.right)?,
            self.bottom.checked_sub(margins.bottom)?,
        ))
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    pub fn center(&self) -> (i32, i32) {
        (
            self.left.saturating_add(self.width() / 2),
            self.top.saturating_add(self.height() / 2),
        )
    }

    /// Parse `"left,top,right,bottom"`; missing trailing parts read as 0
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = [0i32; 4];
        let mut count = 0;
        for (slot, part) in parts.iter_mut().zip(value.split(',')) {
            *slot = part.trim().parse().ok()?;
            count += 1;
        }
        if count == 0 || value.split(',').count() > 4 {
            return None;
        }
        Some(Self::new(parts[0], parts[1], parts[2], parts[3]))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L={}, T={}, R={}, B={} (W={}, H={})",
            self.left,
            self.top,
            self.right,
            self.bottom,
            self.width(),
            self.height()
        )
    }
}

/// Monitor information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    /// Device name/identifier
    pub name: String,
    /// Full device rectangle in virtual-screen coordinates
    pub screen: Rect,
    /// Current usable rectangle
    pub work: Rect,
    /// Whether this is the primary monitor
    pub is_primary: bool,
}

/// View of the display devices the host can adjust
pub trait DisplayEnvironment: Send {
    /// Devices in enumeration order (device index `n` is element `n - 1`)
    fn monitors(&self) -> Result<Vec<MonitorInfo>, WorkAreaError>;

    /// Set the usable rectangle of the device containing `rect`
    fn set_work_area(&mut self, rect: Rect) -> Result<(), WorkAreaError>;

    /// Tell other observers that cached work-area layout is stale
    fn notify_work_area_changed(&mut self);
}

/// Display environment for the current platform
pub fn platform_display() -> Box<dyn DisplayEnvironment> {
    #[cfg(windows)]
    {
        Box::new(windows::Win32Display::new())
    }

    #[cfg(not(windows))]
    {
        tracing::warn!(
            "Work-area control not supported on {}, using a virtual display",
            std::env::consts::OS
        );
        Box::new(VirtualDisplay::single(Rect::new(0, 0, 1920, 1080)))
    }
}
