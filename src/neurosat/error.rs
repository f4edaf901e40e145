//! Error types for the NeuroSAT core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Incidence matrix does not agree with the declared counts.
    #[error("shape mismatch for {what}: expected {expected:?}, got {got:?}")]
    ShapeMismatch { what: &'static str, expected: Vec<usize>, got: Vec<usize> },

    /// Literal rows must come in complementary pairs.
    #[error("odd number of literal rows: {0}")]
    OddLiteralCount(usize),

    /// Batched instances must have the same number of variables.
    #[error("{n_vars} variables cannot be split evenly into {n_batches} instances")]
    UnevenBatch { n_vars: usize, n_batches: usize },

    /// Incidence matrix must be an F32 matrix of 0/1 entries.
    #[error("invalid incidence matrix: {0}")]
    InvalidIncidence(String),

    #[error("batch has no instances, variables or clauses")]
    EmptyBatch,

    #[error("literal for variable {index} out of range for {n_vars} variables")]
    LiteralOutOfRange { index: usize, n_vars: usize },

    #[error("invalid DIMACS literal: {0}")]
    InvalidLiteral(i64),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("expected {expected} labels, got {got}")]
    LabelCount { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
