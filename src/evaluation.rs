//! Numeric contract shared by the table and the search driver.
//!
//! Scores are plain integers in centipawn-like units. The extremes of the
//! range are reserved for mate scores: a value above [`MATE_THRESHOLD`] (or
//! below [`MATED_THRESHOLD`]) encodes "forced mate in N plies" and its exact
//! magnitude depends on the distance from the search root. Ordinary
//! evaluations always stay inside the thresholds, which is what makes the
//! renormalization in [`crate::transposition`] a no-op for them.

/// The relative value of a position, in centipawn (100 CP = 1 "pawn") units,
/// from the point of view of the side to move.
///
/// A compact representation matters here: scores are stored in every
/// [`crate::transposition::TranspositionTable`] record.
pub type Value = i32;

/// Upper bound of the evaluation range; the score of delivering checkmate at
/// the root.
pub const MAX_EVAL: Value = 32_000;

/// Lower bound of the evaluation range; the score of being checkmated at the
/// root.
pub const MIN_EVAL: Value = -MAX_EVAL;

/// `(MATE_THRESHOLD, MAX_EVAL]` and `[MIN_EVAL, MATED_THRESHOLD)` are
/// reserved for mate scores. `[MATED_THRESHOLD, MATE_THRESHOLD]` is for
/// ordinary evaluations.
///
/// The reserved band must be wider than the deepest search
/// ([`crate::transposition::MAX_PLY`]) so that ply-adjusted mate scores never
/// leak into the ordinary range.
const MATE_RANGE: Value = 1_000;

/// Smallest score that is recognized as "forced win" rather than an ordinary
/// evaluation.
pub const MATE_THRESHOLD: Value = MAX_EVAL - MATE_RANGE;

/// Largest score that is recognized as "forced loss" rather than an ordinary
/// evaluation.
pub const MATED_THRESHOLD: Value = -MATE_THRESHOLD;

/// Returns `true` if the score represents a forced mate for either side, not
/// a centipawn evaluation.
#[must_use]
pub const fn is_mate(value: Value) -> bool {
    value > MATE_THRESHOLD || value < MATED_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds() {
        assert!(is_mate(MAX_EVAL));
        assert!(is_mate(MIN_EVAL));
        assert!(is_mate(MATE_THRESHOLD + 1));
        assert!(is_mate(MATED_THRESHOLD - 1));

        assert!(!is_mate(0));
        assert!(!is_mate(MATE_THRESHOLD));
        assert!(!is_mate(MATED_THRESHOLD));
        assert!(!is_mate(42));
        assert!(!is_mate(-42));
    }

    #[test]
    fn mate_band_wider_than_search() {
        assert!(MATE_RANGE >= i32::from(crate::transposition::MAX_PLY));
    }
}
