use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    cache::Cache,
    error::ConfigError,
    replace::ReplacementPolicy,
    write::{WriteAllocPolicy, WritePolicy},
};

/// Widest ways/line/block field a cache may be configured with.
pub const MAX_BITS: u32 = 10;

/// Geometry and policies of a single cache level. All sizes are log2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ways_bits: u32,
    pub line_bits: u32,
    pub block_bits: u32,
    pub write_alloc_policy: WriteAllocPolicy,
    pub write_policy: WritePolicy,
    pub replacement_policy: ReplacementPolicy,
    pub address_width: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ways_bits: 1,
            line_bits: 4,
            block_bits: 2,
            write_alloc_policy: WriteAllocPolicy::Allocate,
            write_policy: WritePolicy::WriteBack,
            replacement_policy: ReplacementPolicy::Lru,
            address_width: 32,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("ways_bits", self.ways_bits),
            ("line_bits", self.line_bits),
            ("block_bits", self.block_bits),
        ] {
            if value > MAX_BITS {
                return Err(ConfigError::FieldTooWide {
                    field,
                    value,
                    max: MAX_BITS,
                });
            }
        }
        if !(1..=u64::BITS).contains(&self.address_width) {
            return Err(ConfigError::AddressWidth(self.address_width));
        }
        if self.line_bits + self.block_bits > self.address_width {
            return Err(ConfigError::AddressOverflow {
                line: self.line_bits,
                block: self.block_bits,
                width: self.address_width,
            });
        }
        Ok(())
    }

    pub fn ways(&self) -> usize {
        1 << self.ways_bits
    }

    pub fn sets(&self) -> usize {
        1 << self.line_bits
    }

    pub fn block_bytes(&self) -> usize {
        1 << self.block_bits
    }

    /// Address bits left over for the tag.
    pub fn tag_bits(&self) -> u32 {
        self.address_width
            .saturating_sub(self.line_bits + self.block_bits)
    }
}

/// One level of the JSON hierarchy description. Missing fields fall back to
/// [`CacheConfig::default`]; the address width is shared by all levels.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LevelConfig {
    pub name: String,
    pub ways_bits: Option<u32>,
    pub line_bits: Option<u32>,
    pub block_bits: Option<u32>,
    pub write_alloc_policy: Option<WriteAllocPolicy>,
    pub write_policy: Option<WritePolicy>,
    pub replacement_policy: Option<ReplacementPolicy>,
}

/// A linear L1 -> L2 -> ... hierarchy, as read from JSON.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HierarchyConfig {
    #[serde(default = "default_address_width")]
    pub address_width: u32,
    pub levels: Vec<LevelConfig>,
}

fn default_address_width() -> u32 {
    CacheConfig::default().address_width
}

impl LevelConfig {
    pub fn to_cache_config(&self, address_width: u32) -> CacheConfig {
        let d = CacheConfig::default();
        CacheConfig {
            ways_bits: self.ways_bits.unwrap_or(d.ways_bits),
            line_bits: self.line_bits.unwrap_or(d.line_bits),
            block_bits: self.block_bits.unwrap_or(d.block_bits),
            write_alloc_policy: self.write_alloc_policy.unwrap_or(d.write_alloc_policy),
            write_policy: self.write_policy.unwrap_or(d.write_policy),
            replacement_policy: self.replacement_policy.unwrap_or(d.replacement_policy),
            address_width,
        }
    }
}

impl HierarchyConfig {
    /// Validates every level and links them into a chain owned by the first
    /// level.
    pub fn build(self, rng: &mut fastrand::Rng) -> Result<Cache, ConfigError> {
        let address_width = self.address_width;
        let mut levels = self
            .levels
            .into_iter()
            .map(|lc| {
                let config = lc.to_cache_config(address_width);
                Cache::with_rng(lc.name, config, fastrand::Rng::with_seed(rng.u64(..)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut head = levels.pop().ok_or(ConfigError::EmptyHierarchy)?;
        while let Some(mut upper) = levels.pop() {
            upper.set_next_level(head);
            head = upper;
        }
        debug!(
            "built hierarchy: {}",
            head.levels().map(Cache::name).collect::<Vec<_>>().join(" -> ")
        );
        Ok(head)
    }
}
