use std::collections::HashSet;

use cachesim::{
    AccessKind, Cache, CacheConfig, ReplacementPolicy, WriteAllocPolicy, WritePolicy,
};
use proptest::prelude::*;

fn config_strategy() -> impl Strategy<Value = CacheConfig> {
    (
        0u32..=3,
        0u32..=4,
        0u32..=4,
        prop_oneof![Just(WriteAllocPolicy::Allocate), Just(WriteAllocPolicy::NoAllocate)],
        prop_oneof![Just(WritePolicy::WriteBack), Just(WritePolicy::WriteThrough)],
        prop_oneof![Just(ReplacementPolicy::Lru), Just(ReplacementPolicy::Random)],
    )
        .prop_map(
            |(ways_bits, line_bits, block_bits, write_alloc_policy, write_policy, replacement_policy)| {
                CacheConfig {
                    ways_bits,
                    line_bits,
                    block_bits,
                    write_alloc_policy,
                    write_policy,
                    replacement_policy,
                    address_width: 16,
                }
            },
        )
}

fn access_strategy() -> impl Strategy<Value = Vec<(u64, bool, u64)>> {
    prop::collection::vec((0u64..0x1000, any::<bool>(), 0u64..3), 1..300)
}

fn check_sets(cache: &Cache) {
    for set in cache.sets() {
        assert!(set.valid_count() <= 1 << cache.ways_bits());
        let mut tags = HashSet::new();
        for line in set.lines().iter().filter(|l| l.valid) {
            assert!(tags.insert(line.tag), "tag {:#x} held twice", line.tag);
        }
    }
}

proptest! {
    #[test]
    fn every_access_is_classified_once(
        l1 in config_strategy(),
        l2 in config_strategy(),
        accesses in access_strategy(),
        seed in any::<u64>(),
    ) {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut head = Cache::with_rng("L1", l1, fastrand::Rng::with_seed(rng.u64(..))).unwrap();
        head.set_next_level(Cache::with_rng("L2", l2, rng).unwrap());

        let mut cycle = 0;
        for (address, is_write, step) in accesses {
            cycle += step;
            let kind = if is_write { AccessKind::Write } else { AccessKind::Read };
            let result = head.access(address, kind, cycle);
            prop_assert!(!(result.writeback && l1.write_policy == WritePolicy::WriteThrough));
            for level in head.levels() {
                check_sets(level);
            }
        }

        for level in head.levels() {
            let entries = level.access_trace().entries();
            for e in entries {
                prop_assert_eq!(e.hits + e.misses, e.reads + e.writes);
            }
            prop_assert!(entries.windows(2).all(|w| w[0].cycle < w[1].cycle));
            if level.write_policy() == WritePolicy::WriteThrough {
                prop_assert_eq!(level.writebacks(), 0);
            }
        }
    }

    #[test]
    fn decode_reassembles_address(config in config_strategy(), address in 0u64..0x1_0000) {
        let decoder = cachesim::addr::AddrDecoder::new(&config);
        let a = decoder.split(address);
        prop_assert!(a.set < config.sets());
        prop_assert!(a.offset < config.block_bytes() as u64);
        prop_assert_eq!(decoder.block_addr(a.tag, a.set) | a.offset, address);
    }
}
