//! Product scoring and feature categorization.
//!
//! Everything in this crate is a pure function of its arguments: the
//! scoring configuration and vocabulary are passed in explicitly and nothing
//! here performs I/O.

pub mod adjust;
pub mod categorize;
pub mod engine;
pub mod error;
pub mod sub_scores;

pub use adjust::{resolve_material_key, select_tier};
pub use categorize::{impact_score, Categorizer};
pub use engine::{compute_score, compute_score_detailed, ScoreFlag, ScoreInput, ScoreOutcome};
pub use error::ScoringError;
pub use sub_scores::derive_sub_scores;
