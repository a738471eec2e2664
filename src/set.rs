use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheLine {
    pub valid: bool,
    pub dirty: bool,
    pub tag: u64,
    /// Set-local stamp of the last fill or hit, for LRU.
    pub last_used: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Hit(usize),
    Miss,
}

/// State of a line at the moment it was evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evicted {
    pub tag: u64,
    pub was_dirty: bool,
}

/// The ways sharing one set index.
#[derive(Debug, Clone)]
pub struct CacheSet {
    lines: Vec<CacheLine>,
    clock: u64,
}

impl CacheSet {
    pub fn new(n_ways: usize) -> Self {
        CacheSet {
            lines: vec![CacheLine::default(); n_ways],
            clock: 0,
        }
    }

    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    pub fn ways(&self) -> usize {
        self.lines.len()
    }

    pub fn lookup(&self, tag: u64) -> Lookup {
        self.lines
            .iter()
            .position(|l| l.valid && l.tag == tag)
            .map_or(Lookup::Miss, Lookup::Hit)
    }

    /// Stamps `way` as the most recently used line of the set.
    pub fn touch(&mut self, way: usize) {
        self.clock += 1;
        self.lines[way].last_used = self.clock;
    }

    pub fn fill(&mut self, way: usize, tag: u64) {
        debug_assert!(
            self.lines
                .iter()
                .enumerate()
                .all(|(w, l)| w == way || !l.valid || l.tag != tag),
            "tag {tag:#x} already resident in another way"
        );
        let line = &mut self.lines[way];
        line.valid = true;
        line.dirty = false;
        line.tag = tag;
        self.touch(way);
    }

    pub fn mark_dirty(&mut self, way: usize) {
        self.lines[way].dirty = true;
    }

    /// Invalidates `way`, returning what it held if it was valid.
    pub fn evict(&mut self, way: usize) -> Option<Evicted> {
        let line = std::mem::take(&mut self.lines[way]);
        line.valid.then_some(Evicted {
            tag: line.tag,
            was_dirty: line.dirty,
        })
    }

    pub fn clear(&mut self) {
        self.lines.fill(CacheLine::default());
        self.clock = 0;
    }

    pub fn valid_count(&self) -> usize {
        self.lines.iter().filter(|l| l.valid).count()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn starts_empty() {
        let set = CacheSet::new(4);
        assert_eq!(set.ways(), 4);
        assert_eq!(set.valid_count(), 0);
        assert_eq!(set.lookup(0), Lookup::Miss);
    }

    #[test]
    fn fill_then_lookup_hits() {
        let mut set = CacheSet::new(2);
        set.fill(1, 0xab);
        assert_eq!(set.lookup(0xab), Lookup::Hit(1));
        assert_eq!(set.lookup(0xac), Lookup::Miss);
        assert!(!set.lines()[1].dirty);
    }

    #[test]
    fn evict_reports_dirty_state() {
        let mut set = CacheSet::new(2);
        set.fill(0, 7);
        set.mark_dirty(0);
        assert_eq!(
            set.evict(0),
            Some(Evicted {
                tag: 7,
                was_dirty: true
            })
        );
        assert_eq!(set.lines()[0], CacheLine::default());
        assert_eq!(set.evict(0), None);
    }

    #[test]
    fn touch_orders_recency() {
        let mut set = CacheSet::new(2);
        set.fill(0, 1);
        set.fill(1, 2);
        assert!(set.lines()[0].last_used < set.lines()[1].last_used);
        set.touch(0);
        assert!(set.lines()[0].last_used > set.lines()[1].last_used);
    }

    #[test]
    fn clear_invalidates_every_way() {
        let mut set = CacheSet::new(4);
        for way in 0..4 {
            set.fill(way, way as u64);
        }
        set.clear();
        assert_eq!(set.valid_count(), 0);
    }
}
