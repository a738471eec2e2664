use std::iter;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::{
    access_trace::{AccessTrace, AccessTraceEntry},
    addr::AddrDecoder,
    config::CacheConfig,
    error::ConfigError,
    events::{CacheEvent, Listeners, Subscription},
    replace::{Replace, ReplacementPolicy},
    set::{CacheSet, Lookup},
    write::{self, WriteAllocPolicy, WritePolicy},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessResult {
    pub hit: bool,
    /// A dirty victim was flushed to make room for this access.
    pub writeback: bool,
}

/// Storage cost of a cache, broken down by what the bits hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheSize {
    pub bits: u64,
    pub components: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub name: String,
    pub reads: u64,
    pub writes: u64,
    pub hits: u64,
    pub misses: u64,
    pub writebacks: u64,
    pub hit_rate: f64,
    pub size_bits: u64,
}

/// One level of a set-associative cache hierarchy.
///
/// Each level exclusively owns the level below it, so a hierarchy is handled
/// through its L1. Misses, write-through writes and writebacks are forwarded
/// down the chain; below the last level sits an implicit backing store that
/// always hits.
#[derive(Debug)]
pub struct Cache {
    name: String,
    config: CacheConfig,
    decoder: AddrDecoder,
    sets: Vec<CacheSet>,
    repl: Box<dyn Replace>,
    rng: fastrand::Rng,
    trace: AccessTrace,
    listeners: Listeners,
    next: Option<Box<Cache>>,
}

fn make_sets(config: &CacheConfig) -> Vec<CacheSet> {
    iter::repeat_with(|| CacheSet::new(config.ways()))
        .take(config.sets())
        .collect()
}

impl Cache {
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Result<Self, ConfigError> {
        Cache::with_rng(name, config, fastrand::Rng::new())
    }

    /// Like [`Cache::new`], but the random replacement policy draws from
    /// `rng`, which makes runs reproducible.
    pub fn with_rng(
        name: impl Into<String>,
        config: CacheConfig,
        mut rng: fastrand::Rng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let repl = config
            .replacement_policy
            .build(fastrand::Rng::with_seed(rng.u64(..)));
        Ok(Cache {
            name: name.into(),
            config,
            decoder: AddrDecoder::new(&config),
            sets: make_sets(&config),
            repl,
            rng,
            trace: AccessTrace::new(),
            listeners: Listeners::default(),
            next: None,
        })
    }

    pub fn access(&mut self, address: u64, kind: AccessKind, cycle: u64) -> AccessResult {
        let addr = self.decoder.split(address);
        let set = &mut self.sets[addr.set];
        let lookup = set.lookup(addr.tag);
        let hit = matches!(lookup, Lookup::Hit(_));
        let action = write::plan(
            kind,
            hit,
            self.config.write_policy,
            self.config.write_alloc_policy,
        );

        let mut writeback = None;
        let way = match lookup {
            Lookup::Hit(way) => {
                self.repl.touch(set, way);
                Some(way)
            }
            Lookup::Miss if action.fill => {
                let victim = self.repl.select_victim(set);
                if let Some(evicted) = set.evict(victim) {
                    if evicted.was_dirty && self.config.write_policy.writes_back() {
                        writeback = Some(self.decoder.block_addr(evicted.tag, addr.set));
                    }
                }
                set.fill(victim, addr.tag);
                Some(victim)
            }
            Lookup::Miss => None,
        };
        if let (true, Some(way)) = (action.mark_dirty, way) {
            set.mark_dirty(way);
        }

        self.trace
            .record_access(cycle, kind, hit, writeback.is_some());
        self.listeners.emit(CacheEvent::HitrateChanged);

        if let Some(next) = self.next.as_deref_mut() {
            if action.forward {
                trace!("{}: forwarding {kind:?} {address:#x} to {}", self.name, next.name);
                next.access(address, kind, cycle);
            }
            if let Some(victim_addr) = writeback {
                trace!("{}: writing back {victim_addr:#x} to {}", self.name, next.name);
                next.access(victim_addr, AccessKind::Write, cycle);
            }
        } else if let Some(victim_addr) = writeback {
            trace!("{}: writing back {victim_addr:#x} to memory", self.name);
        }

        AccessResult {
            hit,
            writeback: writeback.is_some(),
        }
    }

    /// Replaces the geometry and policies, emptying this level and every
    /// level below it. An invalid `config` is rejected and nothing changes.
    pub fn reconfigure(&mut self, config: CacheConfig) -> Result<(), ConfigError> {
        if let Err(err) = config.validate() {
            warn!("{}: rejected configuration: {err}", self.name);
            return Err(err);
        }
        self.config = config;
        self.decoder = AddrDecoder::new(&config);
        self.sets = make_sets(&config);
        self.repl = config
            .replacement_policy
            .build(fastrand::Rng::with_seed(self.rng.u64(..)));
        debug!(
            "{}: reconfigured to {} ways x {} sets x {} bytes",
            self.name,
            config.ways(),
            config.sets(),
            config.block_bytes()
        );
        self.listeners.emit(CacheEvent::ConfigurationChanged);
        self.invalidate();
        Ok(())
    }

    /// Empties every line and clears the access trace, here and below.
    pub fn invalidate(&mut self) {
        self.sets.iter_mut().for_each(CacheSet::clear);
        self.trace.reset();
        debug!("{}: invalidated", self.name);
        self.listeners.emit(CacheEvent::CacheInvalidated);
        if let Some(next) = self.next.as_deref_mut() {
            next.invalidate();
        }
    }

    /// Restarts statistics on every level without touching cache contents.
    pub fn clear_stats(&mut self) {
        self.trace.reset();
        self.listeners.emit(CacheEvent::HitrateChanged);
        if let Some(next) = self.next.as_deref_mut() {
            next.clear_stats();
        }
    }

    pub fn subscribe(&mut self) -> Subscription {
        self.listeners.subscribe()
    }

    /// Links `cache` below this one and hands back the previous link.
    pub fn set_next_level(&mut self, cache: Cache) -> Option<Cache> {
        self.next.replace(Box::new(cache)).map(|prev| *prev)
    }

    pub fn take_next_level(&mut self) -> Option<Cache> {
        self.next.take().map(|prev| *prev)
    }

    pub fn next_level(&self) -> Option<&Cache> {
        self.next.as_deref()
    }

    pub fn next_level_mut(&mut self) -> Option<&mut Cache> {
        self.next.as_deref_mut()
    }

    /// This level followed by every level below it.
    pub fn levels(&self) -> impl Iterator<Item = &Cache> {
        iter::successors(Some(self), |c| c.next_level())
    }

    /// The level `index` steps below this one; `0` is `self`.
    pub fn level(&self, index: usize) -> Option<&Cache> {
        self.levels().nth(index)
    }

    pub fn level_mut(&mut self, index: usize) -> Option<&mut Cache> {
        match index {
            0 => Some(self),
            _ => self.next.as_deref_mut()?.level_mut(index - 1),
        }
    }

    pub fn cache_size(&self) -> CacheSize {
        let config = &self.config;
        let entries = (config.sets() * config.ways()) as u64;
        let mut components = vec![("Valid bits".to_string(), entries)];
        if config.write_policy.writes_back() {
            components.push(("Dirty bits".to_string(), entries));
        }
        if config.replacement_policy == ReplacementPolicy::Lru {
            components.push(("LRU bits".to_string(), config.ways_bits as u64 * entries));
        }
        components.push(("Tag bits".to_string(), config.tag_bits() as u64 * entries));
        components.push((
            "Data bits".to_string(),
            entries * config.block_bytes() as u64 * 8,
        ));
        CacheSize {
            bits: components.iter().map(|(_label, bits)| bits).sum(),
            components,
        }
    }

    pub fn stats(&self) -> CacheStats {
        let totals = self.trace.totals();
        CacheStats {
            name: self.name.clone(),
            reads: totals.reads,
            writes: totals.writes,
            hits: totals.hits,
            misses: totals.misses,
            writebacks: totals.writebacks,
            hit_rate: self.hit_rate(),
            size_bits: self.cache_size().bits,
        }
    }

    pub fn hit_rate(&self) -> f64 {
        let totals = self.trace.totals();
        match totals.accesses() {
            0 => 0.0,
            accesses => totals.hits as f64 / accesses as f64,
        }
    }

    pub fn hits(&self) -> u64 {
        self.trace.totals().hits
    }

    pub fn misses(&self) -> u64 {
        self.trace.totals().misses
    }

    pub fn writebacks(&self) -> u64 {
        self.trace.totals().writebacks
    }

    pub fn reads(&self) -> u64 {
        self.trace.totals().reads
    }

    pub fn writes(&self) -> u64 {
        self.trace.totals().writes
    }

    pub fn access_trace(&self) -> &AccessTrace {
        &self.trace
    }

    pub fn access_trace_entries(&self) -> &[AccessTraceEntry] {
        self.trace.entries()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn sets(&self) -> &[CacheSet] {
        &self.sets
    }

    pub fn ways_bits(&self) -> u32 {
        self.config.ways_bits
    }

    pub fn line_bits(&self) -> u32 {
        self.config.line_bits
    }

    pub fn block_bits(&self) -> u32 {
        self.config.block_bits
    }

    pub fn write_alloc_policy(&self) -> WriteAllocPolicy {
        self.config.write_alloc_policy
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.config.write_policy
    }

    pub fn replacement_policy(&self) -> ReplacementPolicy {
        self.config.replacement_policy
    }
}
