use crate::set::CacheSet;

use super::Replace;

/// Uniform choice over every way, valid or not.
#[derive(Debug)]
pub struct Random {
    rng: fastrand::Rng,
}

impl Random {
    pub fn new(rng: fastrand::Rng) -> Self {
        Random { rng }
    }
}

impl Replace for Random {
    fn select_victim(&mut self, set: &CacheSet) -> usize {
        self.rng.usize(0..set.ways())
    }
}
