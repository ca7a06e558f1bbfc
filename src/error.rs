//! Error type shared by every detection primitive.
//!
//! All errors signal caller misconfiguration. They are raised at the point of
//! violation, before any output is produced, and are never transient.

use thiserror::Error;

/// Errors that can occur during statistics, peak search or blink detection.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BlinkError {
    /// Statistics were requested over zero samples
    #[error("statistics requested over an empty sequence")]
    EmptyInput,

    /// A parameter is out of its valid domain
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter {
        /// Name of the offending parameter
        name: &'static str,
        /// Value that was rejected
        value: f64,
    },

    /// A sub-range is empty or lies outside the sequence
    #[error("invalid range {start}..{end} for a sequence of length {len}")]
    InvalidRange {
        /// Inclusive start of the requested range
        start: usize,
        /// Exclusive end of the requested range
        end: usize,
        /// Length of the sequence the range was applied to
        len: usize,
    },

    /// The input signal contains NaN or an infinity
    #[error("non-finite sample at index {index}")]
    NonFiniteSample {
        /// Index of the first offending sample
        index: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, BlinkError>;

impl BlinkError {
    pub(crate) fn invalid(name: &'static str, value: f64) -> Self {
        BlinkError::InvalidParameter { name, value }
    }
}
