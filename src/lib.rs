//! SkinHost - desktop widget host
//!
//! This crate provides the host side of a desktop widget engine:
//! - Opaque integer handles for objects shared with a foreign control layer
//! - Skin window lifecycle, layouts and load order
//! - Desktop work-area coordination across monitors
//! - Throttled persistence of network statistics
//! - A single owning host loop fed through a task queue

pub mod boundary;
pub mod command;
pub mod core;
pub mod handle;
pub mod host;
pub mod layout;
pub mod logging;
pub mod os;
pub mod skin;
pub mod stats;
pub mod workarea;

// Re-export commonly used items
pub use boundary::{Boundary, StatusCode};
pub use core::config::HostConfig;
pub use core::error::{HostError, Result};
pub use handle::{Handle, HandleRegistry};
pub use host::{HostHandle, HostLoop, HostRuntime, HostTask};
pub use skin::{SkinId, SkinOrchestrator};
pub use stats::StatsPersistence;
pub use workarea::DesktopWorkAreaCoordinator;
