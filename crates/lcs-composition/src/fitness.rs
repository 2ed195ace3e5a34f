//! Solution fitness functions
//!
//! Every fitness is maximised. Single-objective functions trade accuracy
//! against complexity in one number; [`ErrorComplexityObjectives`] keeps the
//! two apart for Pareto-based selection and sampling.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Fitness of a fitted solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fitness {
    /// Single objective
    Scalar(f64),
    /// Several objectives, each maximised
    Objectives(Vec<f64>),
}

impl Fitness {
    /// Objective vector view; a scalar is a one-objective vector
    pub fn objectives(&self) -> &[f64] {
        match self {
            Fitness::Scalar(value) => std::slice::from_ref(value),
            Fitness::Objectives(values) => values,
        }
    }

    /// Scalar used for ranking; objective vectors rank by their sum
    pub fn total(&self) -> f64 {
        match self {
            Fitness::Scalar(value) => *value,
            Fitness::Objectives(values) => values.iter().sum(),
        }
    }
}

/// Measurements a fitness function sees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessInput {
    /// Floored mean-squared error
    pub error: f64,
    /// Number of selected rules
    pub complexity: usize,
    /// Genome length at fit time
    pub input_size: usize,
}

impl FitnessInput {
    /// Fraction of the pool that is *not* selected
    fn sparsity(&self) -> f64 {
        if self.input_size == 0 {
            return 1.0;
        }
        1.0 - self.complexity as f64 / self.input_size as f64
    }
}

/// Maps fitted measurements to a fitness value
pub trait SolutionFitness: Debug + Send + Sync {
    /// Compute the fitness
    fn evaluate(&self, input: &FitnessInput) -> Fitness;
}

/// `exp(-beta * error)`, mapping an error onto `(0, 1]`
pub fn pseudo_accuracy(error: f64, beta: f64) -> f64 {
    (-beta * error).exp()
}

/// Weighted harmonic combination of accuracy and sparsity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityWu {
    /// Relative weight of accuracy over sparsity
    pub alpha: f64,
    /// Pseudo accuracy steepness
    pub beta: f64,
}

impl Default for ComplexityWu {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            beta: 2.0,
        }
    }
}

impl SolutionFitness for ComplexityWu {
    fn evaluate(&self, input: &FitnessInput) -> Fitness {
        let accuracy = pseudo_accuracy(input.error, self.beta);
        let sparsity = input.sparsity();
        let a2 = self.alpha * self.alpha;
        let denominator = a2 * accuracy + sparsity;
        if denominator <= 0.0 {
            return Fitness::Scalar(0.0);
        }
        Fitness::Scalar((1.0 + a2) * accuracy * sparsity / denominator)
    }
}

/// Linear blend of inaccuracy and complexity, negated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityEmary {
    /// Weight of the inaccuracy term
    pub alpha: f64,
    /// Pseudo accuracy steepness
    pub beta: f64,
}

impl Default for ComplexityEmary {
    fn default() -> Self {
        Self {
            alpha: 0.85,
            beta: 2.0,
        }
    }
}

impl SolutionFitness for ComplexityEmary {
    fn evaluate(&self, input: &FitnessInput) -> Fitness {
        let inaccuracy = 1.0 - pseudo_accuracy(input.error, self.beta);
        let density = 1.0 - input.sparsity();
        Fitness::Scalar(-(self.alpha * inaccuracy + (1.0 - self.alpha) * density))
    }
}

/// BIC-like criterion with the genome length standing in for the sample count
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PseudoBic;

impl SolutionFitness for PseudoBic {
    fn evaluate(&self, input: &FitnessInput) -> Fitness {
        let n = (input.input_size.max(1)) as f64;
        Fitness::Scalar(-(n * input.error.ln() + input.complexity as f64 * n.ln()))
    }
}

/// `[pseudo accuracy, sparsity]` for multi-objective composition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorComplexityObjectives {
    /// Pseudo accuracy steepness
    pub beta: f64,
}

impl Default for ErrorComplexityObjectives {
    fn default() -> Self {
        Self { beta: 2.0 }
    }
}

impl SolutionFitness for ErrorComplexityObjectives {
    fn evaluate(&self, input: &FitnessInput) -> Fitness {
        Fitness::Objectives(vec![
            pseudo_accuracy(input.error, self.beta),
            input.sparsity(),
        ])
    }
}

/// Serializable choice of fitness function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FitnessKind {
    /// [`ComplexityWu`]
    Wu(ComplexityWu),
    /// [`ComplexityEmary`]
    Emary(ComplexityEmary),
    /// [`PseudoBic`]
    PseudoBic,
    /// [`ErrorComplexityObjectives`]
    Objectives(ErrorComplexityObjectives),
}

impl Default for FitnessKind {
    fn default() -> Self {
        FitnessKind::Wu(ComplexityWu::default())
    }
}

impl SolutionFitness for FitnessKind {
    fn evaluate(&self, input: &FitnessInput) -> Fitness {
        match self {
            FitnessKind::Wu(f) => f.evaluate(input),
            FitnessKind::Emary(f) => f.evaluate(input),
            FitnessKind::PseudoBic => PseudoBic.evaluate(input),
            FitnessKind::Objectives(f) => f.evaluate(input),
        }
    }
}
