pub mod lru;
pub mod random;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::set::CacheSet;

pub use lru::Lru;
pub use random::Random;

/// Victim selection for a single set.
pub trait Replace: fmt::Debug + Send {
    /// Called on every hit.
    fn touch(&mut self, set: &mut CacheSet, way: usize) {
        set.touch(way);
    }

    /// Picks the way to refill on a miss.
    fn select_victim(&mut self, set: &CacheSet) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementPolicy {
    #[serde(alias = "LRU")]
    Lru,
    #[serde(alias = "rand")]
    Random,
}

impl ReplacementPolicy {
    pub fn build(self, rng: fastrand::Rng) -> Box<dyn Replace> {
        match self {
            ReplacementPolicy::Lru => Box::new(Lru::new()),
            ReplacementPolicy::Random => Box::new(Random::new(rng)),
        }
    }
}
