//! Default counter provider: per-interface traffic totals

use super::{CounterProvider, STATS_SECTION};
use crate::layout::LayoutFile;

/// Cumulative inbound/outbound byte totals per interface.
///
/// Samples are fed through [`TrafficCounters::record`] and folded into the
/// totals on [`CounterProvider::update`]. Interfaces are stored 1-based as
/// `In<n>`/`Out<n>`, with `Count` holding the number of interfaces.
#[derive(Debug, Default)]
pub struct TrafficCounters {
    totals: Vec<(u64, u64)>,
    pending: Vec<(usize, u64, u64)>,
}

impl TrafficCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a traffic delta for an interface (0-based)
    pub fn record(&mut self, interface: usize, bytes_in: u64, bytes_out: u64) {
        self.pending.push((interface, bytes_in, bytes_out));
    }

    /// Totals for an interface (0-based)
    pub fn totals(&self, interface: usize) -> Option<(u64, u64)> {
        self.totals.get(interface).copied()
    }

    pub fn interface_count(&self) -> usize {
        self.totals.len()
    }
}

impl CounterProvider for TrafficCounters {
    fn update(&mut self) {
        for (interface, bytes_in, bytes_out) in self.pending.drain(..) {
            if self.totals.len() <= interface {
                self.totals.resize(interface + 1, (0, 0));
            }
            let entry = &mut self.totals[interface];
            entry.0 = entry.0.saturating_add(bytes_in);
            entry.1 = entry.1.saturating_add(bytes_out);
        }
    }

    fn read(&mut self, store: &LayoutFile, since: &mut String) {
        let Some(section) = store.section(STATS_SECTION) else {
            return;
        };

        if let Some(label) = section.get("Since").filter(|s| !s.is_empty()) {
            *since = label.to_string();
        }

        let count = section
            .get("Count")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);

        let read = |key: String| {
            section
                .get(&key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(0)
        };

        self.totals = (1..=count)
            .map(|n| (read(format!("In{}", n)), read(format!("Out{}", n))))
            .collect();
    }

    fn write(&self, store: &mut LayoutFile, since: &str) {
        let section = store.section_mut(STATS_SECTION);
        section.clear();
        section.set("Since", since);
        section.set("Count", self.totals.len().to_string());
        for (i, (bytes_in, bytes_out)) in self.totals.iter().enumerate() {
            section.set(&format!("In{}", i + 1), bytes_in.to_string());
            section.set(&format!("Out{}", i + 1), bytes_out.to_string());
        }
    }

    fn reset(&mut self) {
        self.totals.clear();
        self.pending.clear();
    }
}
