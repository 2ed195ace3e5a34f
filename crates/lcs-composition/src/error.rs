//! Solution composition error types

use thiserror::Error;

/// Errors raised by the composition core
///
/// Numeric degeneracies (zero tau sums, flat objectives, near-zero errors) are
/// resolved locally and never show up here. Everything in this enum is a
/// contract violation the caller is expected to treat as a programming error.
#[derive(Error, Debug)]
pub enum CompositionError {
    /// Two parents with different genome lengths were recombined
    #[error("Genome length mismatch: {left} vs {right}")]
    GenomeLengthMismatch {
        /// Length of the first parent
        left: usize,
        /// Length of the second parent
        right: usize,
    },

    /// The pool grew since the genome was created and padding was not applied
    #[error("Genome covers {genome} rules but the pool holds {pool}; pad the genome first")]
    PaddingRequired {
        /// Genome length
        genome: usize,
        /// Rules in the pool
        pool: usize,
    },

    /// A genome selected a rule index the pool does not contain
    #[error("Rule index {index} out of bounds for pool of size {pool}")]
    RuleOutOfBounds {
        /// Offending rule index
        index: usize,
        /// Rules in the pool
        pool: usize,
    },

    /// A sampler was handed an empty Pareto front
    #[error("Pareto front is empty")]
    EmptyParetoFront,

    /// An operation required a non-empty population
    #[error("Population empty")]
    EmptyPopulation,

    /// Sampling weights could not form a distribution
    #[error("Invalid sampling weights: {reason}")]
    InvalidWeights {
        /// Why the weights were rejected
        reason: String,
    },

    /// Array shapes disagree
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Operation that checked the shape
        context: &'static str,
        /// Required length
        expected: usize,
        /// Length found
        actual: usize,
    },

    /// Cache mode was requested but a rule has no matching pass recorded
    #[error("Rule {index} has no cached match set; run a matching pass first")]
    MissingCache {
        /// Rule without a cache
        index: usize,
    },

    /// Fitted state was read from a solution that was never fitted
    #[error("Solution is not fitted")]
    NotFitted,

    /// Configuration rejected by validation
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Validation failure
        message: String,
    },

    /// Configuration could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for composition operations
pub type CompositionResult<T> = Result<T, CompositionError>;
