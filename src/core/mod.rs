//! SkinHost Core Module
//!
//! This module contains the core functionality shared by every component:
//! - Configuration management
//! - Error types and handling
//! - Path utilities

pub mod config;
pub mod error;
pub mod utils;

// Re-export commonly used items
pub use config::HostConfig;
pub use error::{HostError, Result};
