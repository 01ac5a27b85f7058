//! Virtual display environment
//!
//! In-memory devices for platforms without work-area control and for tests.
//! Clones share state, so a test can keep one clone for inspection while the
//! coordinator owns the other.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::error::WorkAreaError;
use crate::os::{DisplayEnvironment, MonitorInfo, Rect};

#[derive(Debug, Default)]
struct VirtualState {
    monitors: Vec<MonitorInfo>,
    applied: Vec<Rect>,
    notifications: usize,
    reject_sets: bool,
}

/// Virtual multi-monitor environment
#[derive(Debug, Clone, Default)]
pub struct VirtualDisplay {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualDisplay {
    /// Devices with the given screen rectangles; the first one is primary and
    /// every work area starts equal to its screen
    pub fn new(screens: &[Rect]) -> Self {
        let monitors = screens
            .iter()
            .enumerate()
            .map(|(i, screen)| MonitorInfo {
                name: format!("\\\\.\\DISPLAY{}", i + 1),
                screen: *screen,
                work: *screen,
                is_primary: i == 0,
            })
            .collect();

        Self {
            state: Arc::new(Mutex::new(VirtualState {
                monitors,
                ..VirtualState::default()
            })),
        }
    }

    /// One primary device
    pub fn single(screen: Rect) -> Self {
        Self::new(&[screen])
    }

    /// Every rectangle passed to `set_work_area`, in call order
    pub fn applied(&self) -> Vec<Rect> {
        self.state.lock().applied.clone()
    }

    /// Number of change notifications sent
    pub fn notifications(&self) -> usize {
        self.state.lock().notifications
    }

    /// Make subsequent `set_work_area` calls fail
    pub fn reject_sets(&self, reject: bool) {
        self.state.lock().reject_sets = reject;
    }

    /// Current work rectangles in device order
    pub fn work_areas(&self) -> Vec<Rect> {
        self.state.lock().monitors.iter().map(|m| m.work).collect()
    }
}

impl DisplayEnvironment for VirtualDisplay {
    fn monitors(&self) -> Result<Vec<MonitorInfo>, WorkAreaError> {
        Ok(self.state.lock().monitors.clone())
    }

    fn set_work_area(&mut self, rect: Rect) -> Result<(), WorkAreaError> {
        let mut state = self.state.lock();
        state.applied.push(rect);

        if state.reject_sets {
            return Err(WorkAreaError::SetFailed {
                reason: "rejected by virtual display".to_string(),
            });
        }

        let (x, y) = rect.center();
        let target = state
            .monitors
            .iter()
            .position(|m| m.screen.contains_point(x, y))
            .or_else(|| state.monitors.iter().position(|m| m.is_primary));

        match target {
            Some(index) => {
                state.monitors[index].work = rect;
                Ok(())
            }
            None => Err(WorkAreaError::SetFailed {
                reason: format!("no device contains {}", rect),
            }),
        }
    }

    fn notify_work_area_changed(&mut self) {
        self.state.lock().notifications += 1;
    }
}
