//! Text-only comparison: normalize both sides, align, score.

use serde::Serialize;

use crate::scoring::{align, AlignmentResult, Score, Scorer};
use crate::text::{normalize, Token};

/// Everything derived from one expected/heard pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub expected: Vec<Token>,
    pub transcribed: Vec<Token>,
    pub alignment: AlignmentResult,
    pub score: Score,
}

/// Compare a target sentence with what the recognizer heard.
///
/// ```rust
/// use phono_coach::pipeline::compare_text;
/// use phono_coach::scoring::Scorer;
///
/// let c = compare_text("The cat sat.", "a cat sit", false, &Scorer::default());
/// assert_eq!(c.score.value(), 33);
/// ```
pub fn compare_text(
    expected: &str,
    transcribed: &str,
    with_punctuation: bool,
    scorer: &Scorer,
) -> Comparison {
    let expected = normalize(expected, with_punctuation);
    let transcribed = normalize(transcribed, with_punctuation);
    let alignment = align(&expected, &transcribed);
    let score = scorer.score(&alignment, expected.len());

    log::debug!(
        "compare: {} expected, {} heard, cost {}, score {score}",
        expected.len(),
        transcribed.len(),
        alignment.cost()
    );

    Comparison {
        expected,
        transcribed,
        alignment,
        score,
    }
}
