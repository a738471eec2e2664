use crate::config::CacheConfig;

/// An address split into its cache coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addr {
    pub offset: u64,
    pub set: usize,
    pub tag: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct BitSection {
    shift: u32,
    mask: u64,
}

impl BitSection {
    fn new(shift: u32, bits: u32) -> Self {
        let mask = if bits >= u64::BITS {
            u64::MAX
        } else {
            (1 << bits) - 1
        };
        BitSection { shift, mask }
    }

    fn apply(&self, num: u64) -> u64 {
        num.checked_shr(self.shift).unwrap_or(0) & self.mask
    }
}

/// Splits addresses as `tag | set | offset` for one cache geometry.
///
/// Bits above the configured address width stay in the tag, so decoding is
/// total for every `u64`.
#[derive(Debug, Clone, Copy)]
pub struct AddrDecoder {
    offset_sec: BitSection,
    set_sec: BitSection,
    tag_sec: BitSection,
}

impl AddrDecoder {
    pub fn new(config: &CacheConfig) -> Self {
        let offset_sec = BitSection::new(0, config.block_bits);
        let set_sec = BitSection::new(config.block_bits, config.line_bits);
        let tag_sec = BitSection::new(config.block_bits + config.line_bits, u64::BITS);
        AddrDecoder {
            offset_sec,
            set_sec,
            tag_sec,
        }
    }

    pub fn split(&self, addr: u64) -> Addr {
        Addr {
            offset: self.offset_sec.apply(addr),
            set: self.set_sec.apply(addr) as usize,
            tag: self.tag_sec.apply(addr),
        }
    }

    /// Address of the first byte of the block holding `tag` in `set`.
    pub fn block_addr(&self, tag: u64, set: usize) -> u64 {
        tag.checked_shl(self.tag_sec.shift).unwrap_or(0)
            | (set as u64).checked_shl(self.set_sec.shift).unwrap_or(0)
    }
}
