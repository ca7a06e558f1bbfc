//! Local maximum search over a sub-range of a sequence.

use crate::error::{BlinkError, Result};

/// Returns the absolute index of the largest value in `sequence[start..end]`.
///
/// Ties resolve to the first occurrence, so the result is reproducible.
///
/// # Errors
///
/// [`BlinkError::InvalidRange`] when `start >= end` or `end` exceeds the
/// sequence length.
///
/// # Example
///
/// ```
/// use blinkstone::argmax_in_range;
///
/// let x = [0.0, 1.0, 3.0, 7.0, 6.0, 2.0, 5.0, 10.0, 9.0, 8.0, 3.0];
/// assert_eq!(argmax_in_range(&x, 5, 10).unwrap(), 7);
/// assert_eq!(argmax_in_range(&x, 0, 5).unwrap(), 3);
/// ```
pub fn argmax_in_range(sequence: &[f64], start: usize, end: usize) -> Result<usize> {
    if start >= end || end > sequence.len() {
        return Err(BlinkError::InvalidRange {
            start,
            end,
            len: sequence.len(),
        });
    }

    let mut best = start;
    for (offset, &value) in sequence[start + 1..end].iter().enumerate() {
        // Strict comparison keeps the earliest index on ties
        if value > sequence[best] {
            best = start + 1 + offset;
        }
    }
    Ok(best)
}
