//! Sentence normalisation and display helpers.
//!
//! [`normalize`] turns a sentence into the [`Token`] sequence consumed by the
//! alignment engine.  Both the target sentence and the recognised transcript
//! go through the same function so that casing and punctuation never count
//! as a mistake.
//!
//! # Example
//!
//! ```rust
//! use phono_coach::text::normalize;
//!
//! let tokens = normalize("Don't STOP, believing!", false);
//! let words: Vec<&str> = tokens.iter().map(|t| t.as_str()).collect();
//! assert_eq!(words, ["don't", "stop", "believing"]);
//! ```

pub mod normalize;
pub mod timestamp;

pub use normalize::{normalize, strip_punctuation, Token};
pub use timestamp::format_timestamp;
