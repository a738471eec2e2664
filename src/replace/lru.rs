use crate::set::CacheSet;

use super::Replace;

/// Evicts the first invalid way, or else the least recently stamped one.
/// Ties go to the lowest way index.
#[derive(Debug, Default)]
pub struct Lru {}

impl Lru {
    pub fn new() -> Self {
        Lru {}
    }
}

impl Replace for Lru {
    fn select_victim(&mut self, set: &CacheSet) -> usize {
        let lines = set.lines();
        if let Some(vacant) = lines.iter().position(|l| !l.valid) {
            return vacant;
        }
        // min_by_key keeps the first of equal keys
        lines
            .iter()
            .enumerate()
            .min_by_key(|(_way, l)| l.last_used)
            .map_or(0, |(way, _l)| way)
    }
}
