//! Error types for SkinHost
//!
//! One enum per domain, aggregated into [`HostError`]. Nothing in this module
//! crosses the foreign boundary directly: the boundary layer maps every error
//! to a [`crate::boundary::StatusCode`].

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for SkinHost operations
pub type Result<T> = std::result::Result<T, HostError>;

/// Main error type for SkinHost
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Handle registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Skin error: {0}")]
    Skin(#[from] SkinError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Work area error: {0}")]
    WorkArea(#[from] WorkAreaError),

    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Host loop is no longer running")]
    HostUnavailable,
}

/// Handle resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Handle {0} is not registered")]
    NotFound(i32),

    #[error("Handle {handle} refers to a {actual}, expected a {expected}")]
    WrongKind {
        handle: i32,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Skin lifecycle errors
#[derive(Error, Debug)]
pub enum SkinError {
    #[error("Skin file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Unknown skin window: {0}")]
    UnknownWindow(u64),

    #[error("Skin initialization failed for {key}: {reason}")]
    InitializeFailed { key: String, reason: String },

    #[error("Skin {key} was torn down in the current clear cycle")]
    TornDown { key: String },
}

/// Layout store errors
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Layout file not accessible: {path}")]
    NotAccessible { path: PathBuf },

    #[error("Layout read failed: {path}, reason: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("Layout write failed: {path}, reason: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

/// Desktop work-area errors
#[derive(Error, Debug)]
pub enum WorkAreaError {
    #[error("Invalid rectangle for {key}: {value}")]
    InvalidRect { key: String, value: String },

    #[error("{key}: no device to apply against")]
    NoDevice { key: String },

    #[error("{key}: rectangle {rect} leaves the coordinate range")]
    OutOfRange { key: String, rect: String },

    #[error("Monitor enumeration failed: {reason}")]
    MonitorEnumFailed { reason: String },

    #[error("Setting work area failed: {reason}")]
    SetFailed { reason: String },

    #[error("Platform not supported: {platform}")]
    PlatformNotSupported { platform: String },
}

/// Statistics persistence errors
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Statistics store read failed: {0}")]
    ReadFailed(String),

    #[error("Statistics store write failed: {0}")]
    WriteFailed(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config load failed: {0}")]
    LoadFailed(#[from] config::ConfigError),

    #[error("Invalid config value: {field} = {value}")]
    InvalidValue { field: String, value: String },
}

/// Trait for error recovery strategies
pub trait ErrorRecovery {
    /// Check if the error is retryable
    fn is_retryable(&self) -> bool;

    /// Get recovery action suggestion
    fn recovery_action(&self) -> RecoveryAction;
}

/// Recovery action suggestions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry the operation
    Retry,
    /// Skip this item and continue, nothing was changed
    Skip,
    /// Log and continue in best-effort mode
    Degrade,
    /// Surface the failure to the user
    NotifyUser,
    /// Stop the host
    Abort,
}

/// Log `err` at the level its recovery action calls for and return that action
pub fn log_failure<E>(context: &str, err: &E) -> RecoveryAction
where
    E: ErrorRecovery + std::fmt::Display,
{
    let action = err.recovery_action();
    match action {
        RecoveryAction::Skip => tracing::debug!(?action, "{}: {}", context, err),
        RecoveryAction::Retry | RecoveryAction::Degrade => {
            tracing::warn!(?action, "{}: {}", context, err)
        }
        RecoveryAction::NotifyUser | RecoveryAction::Abort => {
            tracing::error!(?action, "{}: {}", context, err)
        }
    }
    action
}

impl ErrorRecovery for HostError {
    fn is_retryable(&self) -> bool {
        match self {
            HostError::Layout(e) => e.is_retryable(),
            HostError::Stats(e) => e.is_retryable(),
            HostError::WorkArea(e) => e.is_retryable(),
            HostError::Io(_) => true,
            _ => false,
        }
    }

    fn recovery_action(&self) -> RecoveryAction {
        match self {
            HostError::Registry(_) => RecoveryAction::Skip,
            HostError::Skin(e) => e.recovery_action(),
            HostError::Layout(e) => e.recovery_action(),
            HostError::WorkArea(e) => e.recovery_action(),
            HostError::Stats(e) => e.recovery_action(),
            HostError::Config(_) => RecoveryAction::NotifyUser,
            HostError::Io(_) => RecoveryAction::Degrade,
            HostError::HostUnavailable => RecoveryAction::Abort,
        }
    }
}

impl ErrorRecovery for SkinError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn recovery_action(&self) -> RecoveryAction {
        match self {
            SkinError::NotFound { .. } => RecoveryAction::NotifyUser,
            SkinError::UnknownWindow(_) => RecoveryAction::Skip,
            SkinError::InitializeFailed { .. } => RecoveryAction::NotifyUser,
            SkinError::TornDown { .. } => RecoveryAction::Skip,
        }
    }
}

impl ErrorRecovery for LayoutError {
    fn is_retryable(&self) -> bool {
        matches!(self, LayoutError::WriteFailed { .. })
    }

    fn recovery_action(&self) -> RecoveryAction {
        match self {
            LayoutError::NotAccessible { .. } => RecoveryAction::NotifyUser,
            _ => RecoveryAction::Degrade,
        }
    }
}

impl ErrorRecovery for WorkAreaError {
    fn is_retryable(&self) -> bool {
        matches!(self, WorkAreaError::SetFailed { .. })
    }

    fn recovery_action(&self) -> RecoveryAction {
        match self {
            WorkAreaError::InvalidRect { .. }
            | WorkAreaError::NoDevice { .. }
            | WorkAreaError::OutOfRange { .. } => RecoveryAction::Skip,
            _ => RecoveryAction::Degrade,
        }
    }
}

impl ErrorRecovery for StatsError {
    fn is_retryable(&self) -> bool {
        true
    }

    fn recovery_action(&self) -> RecoveryAction {
        RecoveryAction::Degrade
    }
}
