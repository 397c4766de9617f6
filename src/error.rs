//! Error type shared by all kernels.
//!
//! Variants fall into three groups: configuration errors (rejected when a
//! snapshot is built), range errors (rejected before a window is touched)
//! and type errors (an element type without a specialization reached the
//! runtime dispatch). None of them is transient.

use thiserror::Error;

use crate::filters::sample::ElementType;

#[derive(Debug, Error)]
pub enum Error {
    #[error("slope width must be at least 1, got {0}")]
    InvalidSlopeWidth(usize),

    #[error("minimal change must be a non-negative number, got {0}")]
    InvalidMinimalChange(f64),

    #[error("window size must be in 1..={limit}, got {window_size}")]
    InvalidWindowSize { window_size: u64, limit: u64 },

    #[error("maximal sum {max_sum} exceeds the exactly divisible range 0..={limit}")]
    MaxSumTooLarge { max_sum: u64, limit: u64 },

    #[error("window {offset}..{offset}+{length} does not fit a buffer of {len} elements")]
    WindowOutOfRange {
        offset: usize,
        length: usize,
        len: usize,
    },

    #[error("step must be positive")]
    ZeroStep,

    #[error("sum {sum} exceeds the declared maximum {max_sum}")]
    SumOutOfRange { sum: u64, max_sum: u64 },

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("unsupported element type: {0}")]
    UnsupportedElementType(String),

    #[error("{element_type} samples have no bounded unsigned domain for averaging")]
    UnboundedElementType { element_type: ElementType },

    #[error("failed to read config: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
