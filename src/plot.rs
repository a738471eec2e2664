//! Ratio series over an [`AccessTrace`], as drawn by a hit-rate plot.
//!
//! The cumulative series divides two running counters at every recorded
//! cycle. The optional windowed series divides the per-entry increments
//! instead, and smooths them with a moving average over the last `window`
//! entries.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::access_trace::{AccessTrace, AccessTraceEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    Writes,
    Reads,
    Hits,
    Misses,
    Writebacks,
    Accesses,
    Unary,
}

impl Variable {
    pub const TRACED: [Variable; 6] = [
        Variable::Writes,
        Variable::Reads,
        Variable::Hits,
        Variable::Misses,
        Variable::Writebacks,
        Variable::Accesses,
    ];

    pub fn of(self, entry: &AccessTraceEntry) -> u64 {
        match self {
            Variable::Writes => entry.writes,
            Variable::Reads => entry.reads,
            Variable::Hits => entry.hits,
            Variable::Misses => entry.misses,
            Variable::Writebacks => entry.writebacks,
            Variable::Accesses => entry.accesses(),
            Variable::Unary => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Variable::Writes => "Writes",
            Variable::Reads => "Reads",
            Variable::Hits => "Hits",
            Variable::Misses => "Misses",
            Variable::Writebacks => "Writebacks",
            Variable::Accesses => "Access count",
            Variable::Unary => "1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioPoint {
    pub cycle: u64,
    /// Percent; 0 when the denominator is 0.
    pub ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatioUpdate {
    pub total: Vec<RatioPoint>,
    pub windowed: Vec<RatioPoint>,
}

fn percent(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 * 100.0 / den as f64
    }
}

#[derive(Debug, Clone)]
pub struct RatioPlot {
    numerator: Variable,
    denominator: Variable,
    window: Option<usize>,
    /// Newest entry plotted; its cycle may still be collecting accesses.
    last_entry: Option<AccessTraceEntry>,
    last_values: Option<(u64, u64)>,
    prev_values: Option<(u64, u64)>,
    recent: VecDeque<f64>,
}

impl Default for RatioPlot {
    /// Hit rate, no moving average.
    fn default() -> Self {
        RatioPlot::new(Variable::Hits, Variable::Accesses, None)
    }
}

impl RatioPlot {
    pub fn new(numerator: Variable, denominator: Variable, window: Option<usize>) -> Self {
        RatioPlot {
            numerator,
            denominator,
            window: window.filter(|&w| w > 0),
            last_entry: None,
            last_values: None,
            prev_values: None,
            recent: VecDeque::new(),
        }
    }

    /// Points for every entry newer than the last one already plotted.
    ///
    /// The last plotted cycle is read again: if it gained accesses since,
    /// its point comes back first and replaces the earlier one.
    pub fn update(&mut self, trace: &AccessTrace) -> RatioUpdate {
        let from = self.last_entry.map_or(0, |e| e.cycle);
        let mut update = RatioUpdate::default();
        for entry in trace.query(from) {
            match self.last_entry {
                Some(last) if last == *entry => continue,
                Some(last) if last.cycle == entry.cycle => {
                    self.recent.pop_back();
                    self.last_values = self.prev_values;
                }
                _ => {}
            }
            let num = self.numerator.of(entry);
            let den = self.denominator.of(entry);
            update.total.push(RatioPoint {
                cycle: entry.cycle,
                ratio: percent(num, den),
            });

            if let Some(window) = self.window {
                let (d_num, d_den) = match self.last_values {
                    Some((prev_num, prev_den)) => {
                        (num.saturating_sub(prev_num), den.saturating_sub(prev_den))
                    }
                    None => (num, den),
                };
                // Unary stays 1 at every point, so its delta is 1 as well
                let d_num = if self.numerator == Variable::Unary { 1 } else { d_num };
                let d_den = if self.denominator == Variable::Unary { 1 } else { d_den };
                if self.recent.len() == window {
                    self.recent.pop_front();
                }
                self.recent.push_back(percent(d_num, d_den));
                let avg = self.recent.iter().sum::<f64>() / self.recent.len() as f64;
                update.windowed.push(RatioPoint {
                    cycle: entry.cycle,
                    ratio: avg,
                });
            }
            self.prev_values = self.last_values;
            self.last_values = Some((num, den));
            self.last_entry = Some(*entry);
        }
        update
    }

    /// Forgets everything plotted so far, e.g. after the cache was
    /// reconfigured.
    pub fn reset(&mut self) {
        self.last_entry = None;
        self.last_values = None;
        self.prev_values = None;
        self.recent.clear();
    }
}

/// Per-variable `(cycle, value)` series for entries at or after `from_cycle`.
pub fn gather(trace: &AccessTrace, from_cycle: u64) -> Vec<(Variable, Vec<(u64, u64)>)> {
    let entries = trace.query(from_cycle);
    Variable::TRACED
        .iter()
        .map(|&var| {
            let series = entries.iter().map(|e| (e.cycle, var.of(e))).collect();
            (var, series)
        })
        .collect()
}

/// Tab separated table of the whole trace, one row per recorded cycle.
pub fn to_tsv(trace: &AccessTrace) -> String {
    let mut out = String::from("cycle");
    for var in Variable::TRACED {
        out.push('\t');
        out.push_str(var.label());
    }
    out.push('\n');
    for entry in trace.entries() {
        out.push_str(&entry.cycle.to_string());
        for var in Variable::TRACED {
            out.push('\t');
            out.push_str(&var.of(entry).to_string());
        }
        out.push('\n');
    }
    out
}
