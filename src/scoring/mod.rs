//! Pronunciation scoring: word alignment and accuracy percentage.
//!
//! # Pipeline
//!
//! ```text
//! expected tokens ─┐
//!                  ├─▶ align() ─▶ AlignmentResult ─▶ Scorer::score() ─▶ Score
//! heard tokens ────┘
//! ```
//!
//! Both stages are pure and reentrant; they can be called from any thread.

pub mod align;
pub mod score;

pub use align::{align, AlignmentOp, AlignmentResult, OpCounts};
pub use score::{score, RoundingMode, Score, Scorer};
