//! Accuracy score derived from an alignment.
//!
//! The score is the percentage of expected words that were said correctly,
//! rounded to an integer in `[0, 100]`.  The rounding rule for exact halves
//! is configurable through [`RoundingMode`]; all arithmetic is done on exact
//! integers so `7 / 8 = 87.5 %` is a true tie rather than a floating-point
//! approximation of one.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::align::AlignmentResult;

// ---------------------------------------------------------------------------
// RoundingMode
// ---------------------------------------------------------------------------

/// How an exact `.5` percentage is rounded.
///
/// | Correct / expected | Exact % | `HalfUp` | `HalfEven` |
/// |--------------------|---------|----------|------------|
/// | 1 / 8 | 12.5 | 13 | 12 |
/// | 7 / 8 | 87.5 | 88 | 88 |
/// | 1 / 3 | 33.3 | 33 | 33 |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Ties round towards +∞ (what `Math.round` does for positive numbers).
    #[default]
    HalfUp,
    /// Ties round to the nearest even integer (banker's rounding).
    HalfEven,
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Integer accuracy percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const PERFECT: Score = Score(100);

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Reduces an [`AlignmentResult`] to a [`Score`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scorer {
    pub rounding: RoundingMode,
}

impl Scorer {
    pub fn new(rounding: RoundingMode) -> Self {
        Self { rounding }
    }

    /// `round(correct / expected_word_count * 100)`, or `0` when there are
    /// no expected words.
    pub fn score(&self, alignment: &AlignmentResult, expected_word_count: usize) -> Score {
        percentage(alignment.correct_count(), expected_word_count, self.rounding)
    }
}

/// Score with the default [`RoundingMode::HalfUp`] rule.
///
/// ```rust
/// use phono_coach::scoring::{align, score};
/// use phono_coach::text::normalize;
///
/// let expected = normalize("the cat sat", false);
/// let heard = normalize("a cat sit", false);
/// let result = align(&expected, &heard);
/// assert_eq!(score(&result, expected.len()).value(), 33);
/// ```
pub fn score(alignment: &AlignmentResult, expected_word_count: usize) -> Score {
    Scorer::default().score(alignment, expected_word_count)
}

/// Exact rounded percentage of `correct` over `total`, clamped to 100.
fn percentage(correct: usize, total: usize, rounding: RoundingMode) -> Score {
    if total == 0 {
        return Score(0);
    }

    let scaled = correct as u128 * 100;
    let total = total as u128;
    let quotient = scaled / total;
    let twice_remainder = (scaled % total) * 2;

    let rounded = if twice_remainder > total {
        quotient + 1
    } else if twice_remainder < total {
        quotient
    } else {
        match rounding {
            RoundingMode::HalfUp => quotient + 1,
            RoundingMode::HalfEven => quotient + (quotient % 2),
        }
    };

    Score(rounded.min(100) as u8)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
