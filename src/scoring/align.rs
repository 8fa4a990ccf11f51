//! Word-level edit-distance alignment.
//!
//! [`align`] reconciles the expected token sequence with the transcribed one
//! and classifies every position as [`AlignmentOp::Correct`],
//! [`AlignmentOp::Wrong`], [`AlignmentOp::Missing`] or [`AlignmentOp::Extra`].
//!
//! # Algorithm
//!
//! Classic Levenshtein DP over words with unit costs.  The table is stored
//! flat (`rows × cols`) and every cell records which candidate produced it,
//! so the operation list is rebuilt by walking those recorded steps back
//! from the final cell.
//!
//! ```text
//!            ""   t1   t2   …
//!      ""     0 ← 1 ← 2          ← : Extra   (left)
//!      e1     1   ↖               ↑ : Missing (up)
//!      e2     2                   ↖ : Correct / Wrong (diagonal)
//! ```
//!
//! When several candidates share the minimum cost the **diagonal** step
//! wins, then **up**, then **left**.  That order decides which of several
//! equal-cost alignments gets reported, so it must never change.

use serde::{Deserialize, Serialize};

use crate::text::Token;

// ---------------------------------------------------------------------------
// AlignmentOp
// ---------------------------------------------------------------------------

/// One classified position of an alignment.
///
/// Serialises as `{"type": "correct", "word": …}` etc. so the UI can colour
/// tokens without knowing the Rust types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AlignmentOp {
    /// The expected word was said.
    Correct { word: Token },
    /// A different word was said in place of the expected one.
    Wrong { expected: Token, got: Token },
    /// The expected word has no counterpart in the transcript.
    Missing { expected: Token },
    /// The transcript contains a word with no expected counterpart.
    Extra { got: Token },
}

impl AlignmentOp {
    /// The expected-side word, if this op consumes one.
    pub fn expected(&self) -> Option<&Token> {
        match self {
            AlignmentOp::Correct { word } => Some(word),
            AlignmentOp::Wrong { expected, .. } | AlignmentOp::Missing { expected } => {
                Some(expected)
            }
            AlignmentOp::Extra { .. } => None,
        }
    }

    /// The transcribed-side word, if this op consumes one.
    pub fn got(&self) -> Option<&Token> {
        match self {
            AlignmentOp::Correct { word } => Some(word),
            AlignmentOp::Wrong { got, .. } | AlignmentOp::Extra { got } => Some(got),
            AlignmentOp::Missing { .. } => None,
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, AlignmentOp::Correct { .. })
    }
}

// ---------------------------------------------------------------------------
// AlignmentResult
// ---------------------------------------------------------------------------

/// Per-kind tally of an alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OpCounts {
    pub correct: usize,
    pub wrong: usize,
    pub missing: usize,
    pub extra: usize,
}

/// Ordered alignment plus its total edit cost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentResult {
    ops: Vec<AlignmentOp>,
    cost: u32,
}

impl AlignmentResult {
    pub fn ops(&self) -> &[AlignmentOp] {
        &self.ops
    }

    /// Minimum number of substitutions, insertions and deletions.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn correct_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_correct()).count()
    }

    pub fn counts(&self) -> OpCounts {
        self.ops.iter().fold(OpCounts::default(), |mut acc, op| {
            match op {
                AlignmentOp::Correct { .. } => acc.correct += 1,
                AlignmentOp::Wrong { .. } => acc.wrong += 1,
                AlignmentOp::Missing { .. } => acc.missing += 1,
                AlignmentOp::Extra { .. } => acc.extra += 1,
            }
            acc
        })
    }

    /// Expected-side words in order; reproduces the expected sequence.
    pub fn expected_words(&self) -> impl Iterator<Item = &Token> {
        self.ops.iter().filter_map(AlignmentOp::expected)
    }

    /// Transcribed-side words in order; reproduces the transcribed sequence.
    pub fn transcribed_words(&self) -> impl Iterator<Item = &Token> {
        self.ops.iter().filter_map(AlignmentOp::got)
    }

    pub fn into_ops(self) -> Vec<AlignmentOp> {
        self.ops
    }
}

impl IntoIterator for AlignmentResult {
    type Item = AlignmentOp;
    type IntoIter = std::vec::IntoIter<AlignmentOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

// ---------------------------------------------------------------------------
// DP table
// ---------------------------------------------------------------------------

/// Which neighbour a cell was reached from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Origin,
    Diagonal,
    Up,
    Left,
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    cost: u32,
    step: Step,
}

/// Flat `(rows × cols)` table local to one [`align`] call.
struct Table {
    cells: Vec<Cell>,
    cols: usize,
}

impl Table {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            cells: vec![
                Cell {
                    cost: 0,
                    step: Step::Origin,
                };
                rows * cols
            ],
            cols,
        }
    }

    fn get(&self, i: usize, j: usize) -> Cell {
        self.cells[i * self.cols + j]
    }

    fn set(&mut self, i: usize, j: usize, cell: Cell) {
        self.cells[i * self.cols + j] = cell;
    }
}

// ---------------------------------------------------------------------------
// align
// ---------------------------------------------------------------------------

/// Align `expected` against `transcribed`.
///
/// * Empty `expected` → empty result (nothing to score), whatever
///   `transcribed` holds.
/// * Empty `transcribed` → one [`AlignmentOp::Missing`] per expected word.
///
/// ```rust
/// use phono_coach::scoring::{align, AlignmentOp};
/// use phono_coach::text::Token;
///
/// let expected: Vec<Token> = ["hello", "world"].map(Token::from).to_vec();
/// let heard: Vec<Token> = ["hello"].map(Token::from).to_vec();
///
/// let result = align(&expected, &heard);
/// assert_eq!(result.cost(), 1);
/// assert_eq!(
///     result.ops()[1],
///     AlignmentOp::Missing { expected: Token::from("world") }
/// );
/// ```
pub fn align(expected: &[Token], transcribed: &[Token]) -> AlignmentResult {
    if expected.is_empty() {
        return AlignmentResult::default();
    }

    let rows = expected.len() + 1;
    let cols = transcribed.len() + 1;
    let mut table = Table::new(rows, cols);

    for i in 1..rows {
        table.set(
            i,
            0,
            Cell {
                cost: i as u32,
                step: Step::Up,
            },
        );
    }
    for j in 1..cols {
        table.set(
            0,
            j,
            Cell {
                cost: j as u32,
                step: Step::Left,
            },
        );
    }

    for i in 1..rows {
        for j in 1..cols {
            let substitution = u32::from(expected[i - 1] != transcribed[j - 1]);

            // Candidate order is the tie-break order: a later candidate only
            // replaces the current best when strictly cheaper.
            let candidates = [
                (table.get(i - 1, j - 1).cost + substitution, Step::Diagonal),
                (table.get(i - 1, j).cost + 1, Step::Up),
                (table.get(i, j - 1).cost + 1, Step::Left),
            ];

            let (cost, step) = candidates
                .into_iter()
                .reduce(|best, next| if next.0 < best.0 { next } else { best })
                .unwrap_or((u32::MAX, Step::Origin));

            table.set(i, j, Cell { cost, step });
        }
    }

    let cost = table.get(rows - 1, cols - 1).cost;
    let ops = trace_ops(&table, expected, transcribed);

    log::trace!(
        "align: {} expected × {} transcribed → cost {cost}, {} ops",
        expected.len(),
        transcribed.len(),
        ops.len()
    );

    AlignmentResult { ops, cost }
}

/// Rebuild the operation list of the final cell from the recorded steps.
fn trace_ops(table: &Table, expected: &[Token], transcribed: &[Token]) -> Vec<AlignmentOp> {
    let mut ops = Vec::with_capacity(expected.len().max(transcribed.len()));
    let (mut i, mut j) = (expected.len(), transcribed.len());

    loop {
        match table.get(i, j).step {
            Step::Origin => break,
            Step::Diagonal => {
                let (want, heard) = (&expected[i - 1], &transcribed[j - 1]);
                ops.push(if want == heard {
                    AlignmentOp::Correct { word: want.clone() }
                } else {
                    AlignmentOp::Wrong {
                        expected: want.clone(),
                        got: heard.clone(),
                    }
                });
                i -= 1;
                j -= 1;
            }
            Step::Up => {
                ops.push(AlignmentOp::Missing {
                    expected: expected[i - 1].clone(),
                });
                i -= 1;
            }
            Step::Left => {
                ops.push(AlignmentOp::Extra {
                    got: transcribed[j - 1].clone(),
                });
                j -= 1;
            }
        }
    }

    ops.reverse();
    ops
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<Token> {
        words.iter().map(|w| Token::from(*w)).collect()
    }

    fn correct(w: &str) -> AlignmentOp {
        AlignmentOp::Correct { word: w.into() }
    }

    fn wrong(e: &str, g: &str) -> AlignmentOp {
        AlignmentOp::Wrong {
            expected: e.into(),
            got: g.into(),
        }
    }

    fn missing(e: &str) -> AlignmentOp {
        AlignmentOp::Missing { expected: e.into() }
    }

    fn extra(g: &str) -> AlignmentOp {
        AlignmentOp::Extra { got: g.into() }
    }

    fn assert_invariants(e: &[Token], t: &[Token], result: &AlignmentResult) {
        if e.is_empty() {
            assert!(result.is_empty());
            return;
        }
        let exp: Vec<Token> = result.expected_words().cloned().collect();
        let got: Vec<Token> = result.transcribed_words().cloned().collect();
        assert_eq!(exp, e, "expected side not reproduced");
        assert_eq!(got, t, "transcribed side not reproduced");

        let c = result.counts();
        assert_eq!(result.cost() as usize, c.wrong + c.missing + c.extra);
    }

    // ---- Reference scenarios -------------------------------------------------

    #[test]
    fn substitutions_around_a_match() {
        let e = toks(&["the", "cat", "sat"]);
        let t = toks(&["a", "cat", "sit"]);
        let r = align(&e, &t);
        assert_eq!(r.ops(), [wrong("the", "a"), correct("cat"), wrong("sat", "sit")]);
        assert_eq!(r.cost(), 2);
        assert_invariants(&e, &t, &r);
    }

    #[test]
    fn trailing_word_missing() {
        let e = toks(&["hello", "world"]);
        let t = toks(&["hello"]);
        let r = align(&e, &t);
        assert_eq!(r.ops(), [correct("hello"), missing("world")]);
        assert_eq!(r.cost(), 1);
    }

    #[test]
    fn empty_expected_yields_nothing() {
        let r = align(&[], &toks(&["hi"]));
        assert!(r.is_empty());
        assert_eq!(r.cost(), 0);
    }

    #[test]
    fn both_empty() {
        let r = align(&[], &[]);
        assert!(r.is_empty());
        assert_eq!(r.cost(), 0);
    }

    #[test]
    fn empty_transcript_is_all_missing_in_order() {
        let e = toks(&["one", "two", "three"]);
        let r = align(&e, &[]);
        assert_eq!(r.ops(), [missing("one"), missing("two"), missing("three")]);
        assert_eq!(r.cost(), 3);
    }

    #[test]
    fn identical_sequences_are_all_correct() {
        let e = toks(&["a", "b", "a", "c"]);
        let r = align(&e, &e);
        assert_eq!(r.cost(), 0);
        assert_eq!(r.correct_count(), 4);
        assert!(r.ops().iter().all(AlignmentOp::is_correct));
    }

    #[test]
    fn disjoint_sequences_have_max_len_ops() {
        let e = toks(&["a", "b", "c", "d"]);
        let t = toks(&["w", "x"]);
        let r = align(&e, &t);
        assert_eq!(r.len(), 4);
        assert_eq!(r.cost(), 4);
        assert_invariants(&e, &t, &r);

        let r = align(&t, &e);
        assert_eq!(r.len(), 4);
        assert_invariants(&t, &e, &r);
    }

    // ---- Tie-break order -----------------------------------------------------

    #[test]
    fn tie_prefers_substitution_over_missing_plus_extra() {
        // dp[1][1] = 1 via diagonal; up/left would cost 2.
        let r = align(&toks(&["a"]), &toks(&["b"]));
        assert_eq!(r.ops(), [wrong("a", "b")]);
    }

    #[test]
    fn tie_prefers_diagonal_over_up() {
        // Both [Wrong(a→c), Missing(b)] and [Missing(a), Wrong(b→c)] cost 2.
        // At dp[2][1] the diagonal comes from dp[1][0] (cost 1) + 1 = 2 and
        // up comes from dp[1][1] (cost 1) + 1 = 2: diagonal wins.
        let r = align(&toks(&["a", "b"]), &toks(&["c"]));
        assert_eq!(r.ops(), [missing("a"), wrong("b", "c")]);
        assert_eq!(r.cost(), 2);
    }

    #[test]
    fn swapped_words_report_two_substitutions() {
        // dp[2][2]: diagonal, up and left all cost 2.
        let r = align(&toks(&["a", "b"]), &toks(&["b", "a"]));
        assert_eq!(r.ops(), [wrong("a", "b"), wrong("b", "a")]);
    }

    #[test]
    fn shifted_word_prefers_substitutions_over_gap() {
        // [Missing(x), Correct(a), Extra(y)] costs 2 as well, but every tie
        // along the way resolves to the diagonal.
        let r = align(&toks(&["x", "a"]), &toks(&["a", "y"]));
        assert_eq!(r.ops(), [wrong("x", "a"), wrong("a", "y")]);
        assert_eq!(r.cost(), 2);
    }

    #[test]
    fn extra_word_in_the_middle() {
        let e = toks(&["i", "like", "tea"]);
        let t = toks(&["i", "really", "like", "tea"]);
        let r = align(&e, &t);
        assert_eq!(
            r.ops(),
            [correct("i"), extra("really"), correct("like"), correct("tea")]
        );
        assert_eq!(r.cost(), 1);
    }

    #[test]
    fn extra_word_at_the_end() {
        let e = toks(&["good", "morning"]);
        let t = toks(&["good", "morning", "sir"]);
        let r = align(&e, &t);
        assert_eq!(r.ops(), [correct("good"), correct("morning"), extra("sir")]);
    }

    #[test]
    fn missing_word_in_the_middle() {
        let e = toks(&["see", "you", "later"]);
        let t = toks(&["see", "later"]);
        let r = align(&e, &t);
        assert_eq!(r.ops(), [correct("see"), missing("you"), correct("later")]);
    }

    #[test]
    fn repeated_words_align_to_first_equal_cost_path() {
        let e = toks(&["no", "no"]);
        let t = toks(&["no"]);
        let r = align(&e, &t);
        // dp[2][1]: diagonal from dp[1][0] = 1 + 0 = 1, up from dp[1][1] = 0 + 1 = 1
        // → diagonal wins, so the first "no" is the missing one.
        assert_eq!(r.ops(), [missing("no"), correct("no")]);
    }

    #[test]
    fn transcript_longer_with_no_overlap() {
        let e = toks(&["x"]);
        let t = toks(&["p", "q", "r"]);
        let r = align(&e, &t);
        // Each dp[1][j] ties diagonal with left, so the substitution lands
        // on the last transcribed word.
        assert_eq!(r.ops(), [extra("p"), extra("q"), wrong("x", "r")]);
        assert_invariants(&e, &t, &r);
    }

    // ---- Misc ----------------------------------------------------------------

    #[test]
    fn counts_tally_every_kind() {
        let e = toks(&["a", "b", "c"]);
        let t = toks(&["a", "x", "c", "d"]);
        let r = align(&e, &t);
        assert_eq!(
            r.counts(),
            OpCounts {
                correct: 2,
                wrong: 1,
                missing: 0,
                extra: 1
            }
        );
    }

    #[test]
    fn op_serializes_with_type_tag() {
        let json = serde_json::to_value(wrong("the", "a")).unwrap();
        assert_eq!(json["type"], "wrong");
        assert_eq!(json["expected"], "the");
        assert_eq!(json["got"], "a");

        let json = serde_json::to_value(missing("cat")).unwrap();
        assert_eq!(json["type"], "missing");
    }

    #[test]
    fn invariants_hold_on_a_noisy_sentence() {
        let e = toks(&["she", "sells", "sea", "shells", "by", "the", "sea", "shore"]);
        let t = toks(&["she", "sell", "see", "shells", "the", "sea", "sure", "today"]);
        let r = align(&e, &t);
        assert_invariants(&e, &t, &r);
    }
}
