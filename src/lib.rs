//! Trace-driven simulation of a linear hierarchy of set-associative caches.
//!
//! A [`Cache`] is one level; chaining levels with [`Cache::set_next_level`]
//! builds an L1 -> L2 -> ... hierarchy that forwards misses, write-through
//! writes and writebacks downward. Every level keeps a cycle-indexed
//! [`AccessTrace`] of cumulative counters for hit-rate plots.

pub mod access_trace;
pub mod addr;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod plot;
pub mod replace;
pub mod set;
pub mod trace;
pub mod write;

pub use access_trace::{AccessTrace, AccessTraceEntry};
pub use cache::{AccessKind, AccessResult, Cache, CacheSize, CacheStats};
pub use config::{CacheConfig, HierarchyConfig, LevelConfig, MAX_BITS};
pub use error::{ConfigError, TraceError};
pub use events::{CacheEvent, Subscription};
pub use replace::ReplacementPolicy;
pub use write::{WriteAllocPolicy, WritePolicy};
