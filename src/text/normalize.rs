//! Sentence → token normalisation.
//!
//! Two modes are supported:
//!
//! | `keep_punctuation` | Steps |
//! |--------------------|-------|
//! | `false` | lowercase → drop everything except letters, whitespace and `'` → split on whitespace runs → drop empty tokens |
//! | `true`  | lowercase → split on whitespace runs (empty edge tokens are kept) |
//!
//! "Letter" means Unicode General_Category `L`.  Precomposed letters keep
//! their diacritics (`"Café"` normalises to `"café"`), while combining marks
//! (`Mn`/`Mc`, e.g. Thai and Devanagari vowel signs), letter numbers (`Nl`,
//! e.g. `Ⅻ`) and digits are dropped like punctuation.

use std::fmt;
use std::ops::Deref;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Everything that is not a letter, whitespace or an apostrophe.
static NON_WORD_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\s']+").expect("static pattern compiles"));

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A single case-folded word unit.
///
/// Tokens are compared by exact string equality during alignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wrap an already-normalised word.
    pub fn new(word: impl Into<String>) -> Self {
        Self(word.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Token {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(word: &str) -> Self {
        Self(word.to_owned())
    }
}

impl From<String> for Token {
    fn from(word: String) -> Self {
        Self(word)
    }
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

/// Split `text` into comparison tokens.
///
/// Never fails; empty or whitespace-only input produces an empty sequence
/// when `keep_punctuation` is `false`.
///
/// With `keep_punctuation == true` the text is only lowercased and split on
/// whitespace runs, so leading or trailing whitespace yields an empty token
/// at that edge and an empty input yields a single empty token.
///
/// ```rust
/// use phono_coach::text::normalize;
///
/// let kept = normalize("Hello, World!", true);
/// assert_eq!(kept.len(), 2);
/// assert_eq!(kept[0].as_str(), "hello,");
///
/// let stripped = normalize("Hello, World!", false);
/// assert_eq!(stripped[1].as_str(), "world");
/// ```
pub fn normalize(text: &str, keep_punctuation: bool) -> Vec<Token> {
    if keep_punctuation {
        split_whitespace_runs(&text.to_lowercase())
            .into_iter()
            .map(Token::from)
            .collect()
    } else {
        strip_punctuation(text)
            .split_whitespace()
            .map(Token::from)
            .collect()
    }
}

/// Lowercase `text` and drop every character that is not a letter,
/// whitespace, or an apostrophe.
///
/// Whitespace is preserved as-is so the result can still be split into
/// words.
pub fn strip_punctuation(text: &str) -> String {
    NON_WORD_CHARS
        .replace_all(&text.to_lowercase(), "")
        .into_owned()
}

/// Split on runs of whitespace without discarding the empty pieces that
/// appear before leading or after trailing whitespace.
fn split_whitespace_runs(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_run = false;

    for (idx, c) in text.char_indices() {
        if c.is_whitespace() {
            if !in_run {
                pieces.push(&text[start..idx]);
                in_run = true;
            }
        } else if in_run {
            start = idx;
            in_run = false;
        }
    }

    pieces.push(if in_run { "" } else { &text[start..] });
    pieces
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn words(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::as_str).collect()
    }

    // ---- keep_punctuation = false --------------------------------------------

    #[test]
    fn strips_punctuation_and_lowercases() {
        let out = normalize("The cat, SAT on the mat.", false);
        assert_eq!(words(&out), ["the", "cat", "sat", "on", "the", "mat"]);
    }

    #[test]
    fn keeps_apostrophes() {
        let out = normalize("It's John's book", false);
        assert_eq!(words(&out), ["it's", "john's", "book"]);
    }

    #[test]
    fn keeps_accented_and_non_latin_letters() {
        let out = normalize("Café déjà-vu! Привет, мир. ไทย", false);
        assert_eq!(words(&out), ["café", "déjàvu", "привет", "мир", "ไทย"]);
    }

    #[test]
    fn thai_vowel_signs_are_dropped() {
        // U+0E31 and U+0E35 are combining marks (Mn), not letters.
        let out = normalize("สวัสดี ครับ", false);
        assert_eq!(words(&out), ["สวสด", "ครบ"]);
    }

    #[test]
    fn devanagari_combining_marks_are_dropped() {
        let out = normalize("नमस्ते दुनिया", false);
        assert_eq!(words(&out), ["नमसत", "दनय"]);
    }

    #[test]
    fn letter_numbers_are_not_letters() {
        let out = normalize("Chapter Ⅻ begins", false);
        assert_eq!(words(&out), ["chapter", "begins"]);
    }

    #[test]
    fn digits_are_removed() {
        let out = normalize("room 101 please", false);
        assert_eq!(words(&out), ["room", "please"]);
    }

    #[test]
    fn punctuation_only_word_disappears() {
        let out = normalize("well -- okay", false);
        assert_eq!(words(&out), ["well", "okay"]);
    }

    #[test]
    fn empty_and_whitespace_input_give_no_tokens() {
        assert!(normalize("", false).is_empty());
        assert!(normalize("   \t\n ", false).is_empty());
        assert!(normalize("?!.", false).is_empty());
    }

    #[test]
    fn collapses_whitespace_runs() {
        let out = normalize("  hello \t\n  world  ", false);
        assert_eq!(words(&out), ["hello", "world"]);
    }

    // ---- keep_punctuation = true ---------------------------------------------

    #[test]
    fn keep_punctuation_only_lowercases_and_splits() {
        let out = normalize("Hello,  World!", true);
        assert_eq!(words(&out), ["hello,", "world!"]);
    }

    #[test]
    fn keep_punctuation_keeps_empty_edge_tokens() {
        let out = normalize(" a b ", true);
        assert_eq!(words(&out), ["", "a", "b", ""]);
    }

    #[test]
    fn keep_punctuation_empty_input_is_one_empty_token() {
        let out = normalize("", true);
        assert_eq!(words(&out), [""]);
    }

    #[test]
    fn keep_punctuation_single_word() {
        let out = normalize("Word", true);
        assert_eq!(words(&out), ["word"]);
    }

    // ---- strip_punctuation ---------------------------------------------------

    #[test]
    fn strip_punctuation_preserves_spacing() {
        assert_eq!(strip_punctuation("A, b;  C!"), "a b  c");
    }

    // ---- Token ---------------------------------------------------------------

    #[test]
    fn token_derefs_to_str() {
        let t = Token::from("cat");
        assert_eq!(t.len(), 3);
        assert_eq!(t.to_string(), "cat");
    }

    #[test]
    fn token_serializes_as_plain_string() {
        let json = serde_json::to_string(&Token::new("cat")).unwrap();
        assert_eq!(json, "\"cat\"");
    }
}
