use std::io;

use thiserror::Error;

/// Rejected cache geometry. The cache that was asked to change keeps its
/// previous configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} is {value} bits wide, at most {max} are supported")]
    FieldTooWide {
        field: &'static str,
        value: u32,
        max: u32,
    },
    #[error("address width must be between 1 and 64 bits, got {0}")]
    AddressWidth(u32),
    #[error("{line} line bits + {block} block bits do not fit in a {width}-bit address")]
    AddressOverflow { line: u32, block: u32, width: u32 },
    #[error("a cache hierarchy needs at least one level")]
    EmptyHierarchy,
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("trace line {line}: {reason}")]
    Parse { line: usize, reason: String },
}
