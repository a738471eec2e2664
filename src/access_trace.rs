use serde::Serialize;

use crate::cache::AccessKind;

/// Cumulative counters as of the end of `cycle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccessTraceEntry {
    pub cycle: u64,
    pub reads: u64,
    pub writes: u64,
    pub hits: u64,
    pub misses: u64,
    pub writebacks: u64,
}

impl AccessTraceEntry {
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Append-only, cycle-ordered log of cumulative cache statistics.
///
/// Only the newest entry is ever mutated, and only while further accesses
/// arrive for its cycle.
#[derive(Debug, Clone, Default)]
pub struct AccessTrace {
    entries: Vec<AccessTraceEntry>,
}

impl AccessTrace {
    pub fn new() -> Self {
        AccessTrace::default()
    }

    pub fn record_access(&mut self, cycle: u64, kind: AccessKind, hit: bool, writeback: bool) {
        match self.entries.last() {
            Some(last) if cycle <= last.cycle => debug_assert!(
                cycle == last.cycle,
                "access at cycle {cycle} after cycle {}",
                last.cycle
            ),
            last => {
                let seed = last.copied().unwrap_or_default();
                self.entries.push(AccessTraceEntry { cycle, ..seed });
            }
        }
        let Some(entry) = self.entries.last_mut() else {
            return;
        };
        match kind {
            AccessKind::Read => entry.reads += 1,
            AccessKind::Write => entry.writes += 1,
        }
        if hit {
            entry.hits += 1;
        } else {
            entry.misses += 1;
        }
        if writeback {
            entry.writebacks += 1;
        }
    }

    /// Entries with `cycle >= from_cycle`, oldest first.
    pub fn query(&self, from_cycle: u64) -> &[AccessTraceEntry] {
        let start = self.entries.partition_point(|e| e.cycle < from_cycle);
        &self.entries[start..]
    }

    /// Entries strictly before `in_progress`; these will not change again.
    pub fn committed(&self, in_progress: u64) -> &[AccessTraceEntry] {
        let end = self.entries.partition_point(|e| e.cycle < in_progress);
        &self.entries[..end]
    }

    pub fn entries(&self) -> &[AccessTraceEntry] {
        &self.entries
    }

    /// Owned copy for observers on another thread.
    pub fn snapshot(&self) -> Vec<AccessTraceEntry> {
        self.entries.clone()
    }

    /// Counters accumulated so far, zero before the first access.
    pub fn totals(&self) -> AccessTraceEntry {
        self.entries.last().copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
