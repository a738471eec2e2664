use serde::{Deserialize, Serialize};

use crate::cache::AccessKind;

/// Whether a write miss brings the block into the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum WriteAllocPolicy {
    #[serde(alias = "nwa")]
    NoAllocate = 0,
    #[serde(alias = "wa")]
    Allocate = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    #[serde(alias = "wt")]
    WriteThrough,
    #[serde(alias = "wb")]
    WriteBack,
}

impl WritePolicy {
    /// Dirty lines only exist, and are only flushed on eviction, under
    /// write-back.
    pub fn writes_back(self) -> bool {
        self == WritePolicy::WriteBack
    }
}

/// What one access does to the level it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteAction {
    /// Install the block, evicting a victim if needed.
    pub fill: bool,
    /// Set the dirty bit on the (possibly freshly filled) line.
    pub mark_dirty: bool,
    /// Pass the access on to the next level.
    pub forward: bool,
}

pub fn plan(
    kind: AccessKind,
    hit: bool,
    write_policy: WritePolicy,
    alloc: WriteAllocPolicy,
) -> WriteAction {
    let write_back = write_policy.writes_back();
    match (kind, hit) {
        (AccessKind::Read, true) => WriteAction {
            fill: false,
            mark_dirty: false,
            forward: false,
        },
        (AccessKind::Read, false) => WriteAction {
            fill: true,
            mark_dirty: false,
            forward: true,
        },
        (AccessKind::Write, true) => WriteAction {
            fill: false,
            mark_dirty: write_back,
            forward: !write_back,
        },
        (AccessKind::Write, false) => match alloc {
            WriteAllocPolicy::Allocate => WriteAction {
                fill: true,
                mark_dirty: write_back,
                forward: true,
            },
            WriteAllocPolicy::NoAllocate => WriteAction {
                fill: false,
                mark_dirty: false,
                forward: true,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::cache::AccessKind::{Read, Write};
    use super::WriteAllocPolicy::{Allocate, NoAllocate};
    use super::WritePolicy::{WriteBack, WriteThrough};

    #[rstest]
    #[case(Read, true, WriteBack, Allocate, (false, false, false))]
    #[case(Read, false, WriteThrough, NoAllocate, (true, false, true))]
    #[case(Write, true, WriteBack, NoAllocate, (false, true, false))]
    #[case(Write, true, WriteThrough, Allocate, (false, false, true))]
    #[case(Write, false, WriteBack, Allocate, (true, true, true))]
    #[case(Write, false, WriteThrough, Allocate, (true, false, true))]
    #[case(Write, false, WriteBack, NoAllocate, (false, false, true))]
    fn plans_access(
        #[case] kind: AccessKind,
        #[case] hit: bool,
        #[case] policy: WritePolicy,
        #[case] alloc: WriteAllocPolicy,
        #[case] expected: (bool, bool, bool),
    ) {
        let (fill, mark_dirty, forward) = expected;
        assert_eq!(
            plan(kind, hit, policy, alloc),
            WriteAction {
                fill,
                mark_dirty,
                forward
            }
        );
    }

    #[test]
    fn write_through_never_dirties() {
        for kind in [Read, Write] {
            for hit in [true, false] {
                for alloc in [Allocate, NoAllocate] {
                    assert!(!plan(kind, hit, WriteThrough, alloc).mark_dirty);
                }
            }
        }
    }

    #[test]
    fn alloc_encoding() {
        assert_eq!(NoAllocate as u8, 0);
        assert_eq!(Allocate as u8, 1);
        let parsed: WriteAllocPolicy = serde_json::from_str("\"wa\"").unwrap();
        assert_eq!(parsed, Allocate);
    }
}
