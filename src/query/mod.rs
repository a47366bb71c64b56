//! Query matching and scoring

pub mod scorer;

pub use scorer::{match_positions, score, Scorer, ScoringWeights};
