//! Evaluation results and the arithmetic shared by cache refresh and alias merge.

pub mod merge;
pub mod summary;
pub mod types;

pub use merge::{extend, weighted_scores};
pub use summary::summarize;
pub use types::{
    CommitsSummary, DEFAULT_MODE, Dimension, DimensionScores, EvaluationResult, IdentityWeight,
};
