//! Desktop Work-Area Coordinator
//!
//! Applies per-device usable-area definitions from the layout's global
//! section and restores the original rectangles on revert.
//!
//! Index 0 is the shared definition: in absolute mode it is used verbatim in
//! virtual-screen coordinates, in margin mode it is inset from the primary
//! device. Indices `1..=N` address devices in enumeration order, so the
//! apply loop runs over `0..=N` inclusive.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use crate::core::error::WorkAreaError;
use crate::layout::Section;
use crate::os::{DisplayEnvironment, MonitorInfo, Rect};

/// Key of the shared definition
pub const WORK_AREA_KEY: &str = "DesktopWorkArea";

/// Key selecting the interpretation mode
pub const WORK_AREA_TYPE_KEY: &str = "DesktopWorkAreaType";

/// How configured rectangles are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkAreaMode {
    /// Final usable rectangle, relative to the device origin
    #[default]
    Absolute,
    /// Per-edge insets subtracted from the device rectangle
    MarginRelative,
}

/// Outcome of one apply pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyReport {
    /// Definitions the environment accepted
    pub applied: usize,
    /// Definitions the environment rejected or that had no target device
    pub failed: usize,
}

/// Computes and applies/reverts work-area adjustments
pub struct DesktopWorkAreaCoordinator {
    environment: Box<dyn DisplayEnvironment>,
    areas: BTreeMap<usize, Rect>,
    mode: WorkAreaMode,
    changed: bool,
    snapshot: Option<Vec<Rect>>,
}

impl DesktopWorkAreaCoordinator {
    pub fn new(environment: Box<dyn DisplayEnvironment>) -> Self {
        Self {
            environment,
            areas: BTreeMap::new(),
            mode: WorkAreaMode::Absolute,
            changed: false,
            snapshot: None,
        }
    }

    /// Forget loaded definitions. The snapshot and the changed flag survive
    /// so a later revert still restores the original rectangles.
    pub fn reset(&mut self) {
        self.areas.clear();
        self.mode = WorkAreaMode::Absolute;
    }

    /// Read `DesktopWorkArea`, `DesktopWorkArea@1..=N` and
    /// `DesktopWorkAreaType` from the global section
    pub fn load_from_config(&mut self, section: Option<&Section>) {
        self.reset();
        let Some(section) = section else {
            return;
        };

        let device_count = match self.environment.monitors() {
            Ok(monitors) => monitors.len(),
            Err(e) => {
                tracing::warn!("Cannot enumerate devices for work-area settings: {}", e);
                0
            }
        };

        for index in 0..=device_count {
            let key = area_key(index);
            let Some(value) = section.get(&key).filter(|v| !v.trim().is_empty()) else {
                continue;
            };

            match Rect::parse(value) {
                Some(rect) => {
                    self.areas.insert(index, rect);
                    self.changed = true;
                }
                None => {
                    let err = WorkAreaError::InvalidRect {
                        key,
                        value: value.to_string(),
                    };
                    tracing::warn!("{}", err);
                }
            }
        }

        let margin = section
            .get(WORK_AREA_TYPE_KEY)
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(0);
        self.mode = if margin != 0 {
            WorkAreaMode::MarginRelative
        } else {
            WorkAreaMode::Absolute
        };
    }

    /// Whether any definition was ever loaded
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn mode(&self) -> WorkAreaMode {
        self.mode
    }

    /// Loaded definition for a device index
    pub fn area(&self, index: usize) -> Option<Rect> {
        self.areas.get(&index).copied()
    }

    /// Whether pre-apply rectangles are being held for revert
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn environment(&self) -> &dyn DisplayEnvironment {
        self.environment.as_ref()
    }

    /// Apply every loaded definition
    pub fn apply(&mut self) -> Result<ApplyReport, WorkAreaError> {
        let monitors = self.environment.monitors()?;

        if self.snapshot.is_none() {
            self.snapshot = Some(monitors.iter().map(|m| m.work).collect());
        }

        tracing::debug!(mode = ?self.mode, "Applying desktop work areas");

        let mut report = ApplyReport::default();
        for index in 0..=monitors.len() {
            let Some(configured) = self.areas.get(&index).copied() else {
                continue;
            };

            let rect = match resolve_rect(configured, index, self.mode, &monitors) {
                Ok(rect) => rect,
                Err(e) => {
                    tracing::warn!("{}", e);
                    report.failed += 1;
                    continue;
                }
            };

            match self.environment.set_work_area(rect) {
                Ok(()) => {
                    report.applied += 1;
                    tracing::debug!("Applying {}: {}", area_key(index), rect);
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("Applying {}: {} => FAIL ({})", area_key(index), rect, e);
                }
            }
        }

        if report.applied > 0 {
            self.environment.notify_work_area_changed();
        }

        Ok(report)
    }

    /// Restore the pre-apply rectangles and drop the snapshot.
    ///
    /// Returns how many devices were restored; 0 when nothing was applied.
    pub fn revert(&mut self) -> usize {
        let Some(snapshot) = self.snapshot.take() else {
            return 0;
        };

        let mut restored = 0;
        for (i, rect) in snapshot.iter().enumerate() {
            match self.environment.set_work_area(*rect) {
                Ok(()) => {
                    restored += 1;
                    tracing::debug!("Resetting WorkArea@{}: {}", i + 1, rect);
                }
                Err(e) => tracing::warn!("Resetting WorkArea@{}: {} => FAIL ({})", i + 1, rect, e),
            }
        }

        self.environment.notify_work_area_changed();
        restored
    }
}

/// Settings key for a device index
pub fn area_key(index: usize) -> String {
    if index == 0 {
        WORK_AREA_KEY.to_string()
    } else {
        format!("{}@{}", WORK_AREA_KEY, index)
    }
}

/// Turn a configured rectangle into the rectangle handed to the environment
pub fn resolve_rect(
    configured: Rect,
    index: usize,
    mode: WorkAreaMode,
    monitors: &[MonitorInfo],
) -> Result<Rect, WorkAreaError> {
    let no_device = || WorkAreaError::NoDevice {
        key: area_key(index),
    };
    let device = if index == 0 {
        None
    } else {
        Some(monitors.get(index - 1).ok_or_else(no_device)?)
    };

    let resolved = match mode {
        WorkAreaMode::MarginRelative => {
            let base = match device {
                Some(device) => device,
                None => monitors
                    .iter()
                    .find(|m| m.is_primary)
                    .or_else(|| monitors.first())
                    .ok_or_else(no_device)?,
            };
            base.screen.inset(&configured)
        }
        WorkAreaMode::Absolute => match device {
            Some(device) => configured.offset(device.screen.left, device.screen.top),
            None => Some(configured),
        },
    };

    resolved.ok_or_else(|| WorkAreaError::OutOfRange {
        key: area_key(index),
        rect: configured.to_string(),
    })
}
