//! Statistics Persistence
//!
//! Owns the write-throttling policy for accumulated counters and the reset
//! label. What the counters mean, and how they are laid out in the store,
//! belongs to a [`CounterProvider`].
//!
//! Throttling uses `Instant`, so wall-clock adjustments never force or
//! suppress a write.

mod counters;


pub use counters::TrafficCounters;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::core::error::StatsError;
use crate::layout::LayoutFile;

/// The single section of the statistics store
pub const STATS_SECTION: &str = "Statistics";

/// External counter semantics
pub trait CounterProvider: Send {
    /// Take a new sample
    fn update(&mut self);

    /// Load counters from the store. May replace the reset label with the one
    /// recorded in the store.
    fn read(&mut self, store: &LayoutFile, since: &mut String);

    /// Write counters (and the reset label) into the store
    fn write(&self, store: &mut LayoutFile, since: &str);

    /// Zero every counter
    fn reset(&mut self);
}

/// Rate-limited counter persistence
pub struct StatsPersistence {
    path: PathBuf,
    interval: Duration,
    since: String,
    last_write: Option<Instant>,
    provider: Box<dyn CounterProvider>,
}

impl StatsPersistence {
    pub fn new(path: PathBuf, interval: Duration, provider: Box<dyn CounterProvider>) -> Self {
        Self {
            path,
            interval,
            since: reset_label(Local::now()),
            last_write: None,
            provider,
        }
    }

    /// Store location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Label of the last reset
    pub fn since(&self) -> &str {
        &self.since
    }

    /// Minimum spacing between non-forced writes
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sample the provider
    pub fn update(&mut self) {
        self.provider.update();
    }

    /// Load counters, creating an empty store first if none exists
    pub fn read_stats(&mut self) -> Result<(), StatsError> {
        if !self.path.exists() {
            let mut store = LayoutFile::new();
            store.section_mut(STATS_SECTION);
            store
                .save(&self.path)
                .map_err(|e| StatsError::WriteFailed(e.to_string()))?;
            tracing::debug!(path = %self.path.display(), "Created empty statistics store");
        }

        let store =
            LayoutFile::load(&self.path).map_err(|e| StatsError::ReadFailed(e.to_string()))?;
        self.provider.read(&store, &mut self.since);
        Ok(())
    }

    /// Persist counters unless a write happened within the interval.
    ///
    /// Returns whether the store was written.
    pub fn write_stats(&mut self, force: bool) -> Result<bool, StatsError> {
        self.write_stats_at(Instant::now(), force)
    }

    pub(crate) fn write_stats_at(&mut self, now: Instant, force: bool) -> Result<bool, StatsError> {
        let due = match self.last_write {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        };
        if !force && !due {
            return Ok(false);
        }
        self.last_write = Some(now);

        let mut store = if self.path.exists() {
            LayoutFile::load(&self.path).unwrap_or_else(|e| {
                tracing::warn!("Replacing unreadable statistics store: {}", e);
                LayoutFile::new()
            })
        } else {
            LayoutFile::new()
        };

        self.provider.write(&mut store, &self.since);
        store
            .save(&self.path)
            .map_err(|e| StatsError::WriteFailed(e.to_string()))?;

        tracing::debug!(force, path = %self.path.display(), "Statistics written");
        Ok(true)
    }

    /// Stamp a new reset label and clear the counters
    pub fn reset_stats(&mut self) {
        self.reset_stats_at(Local::now());
    }

    pub(crate) fn reset_stats_at(&mut self, now: DateTime<Local>) {
        self.since = reset_label(now);
        self.provider.reset();
        tracing::info!(since = %self.since, "Statistics reset");
    }
}

/// `asctime`-style label without the trailing newline
pub fn reset_label(now: DateTime<Local>) -> String {
    now.format("%a %b %e %H:%M:%S %Y").to_string()
}
