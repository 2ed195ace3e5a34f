//! Optimizers composing solutions from a rule pool

mod saga;

pub use saga::SelfAdaptingGeneticAlgorithm;

use crate::error::CompositionResult;
use crate::metrics::CompositionMetrics;
use crate::rule::{Rule, RulePool};
use crate::solution::Genotype;
use ndarray::{ArrayView1, ArrayView2};

/// Searches the space of rule subsets for good solutions
pub trait SolutionComposition {
    /// Solution type produced by the optimizer
    type Solution: Genotype;

    /// Run the configured number of generations and return the best solution
    ///
    /// The pool must have been refreshed on `x` beforehand; its cached match
    /// sets are read, never written.
    fn optimize<R: Rule>(
        &mut self,
        pool: &RulePool<R>,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> CompositionResult<Self::Solution>;

    /// Non-dominated solutions found so far
    fn pareto_front(&self) -> Vec<Self::Solution>;

    /// Current metrics
    fn metrics(&self) -> &CompositionMetrics;

    /// Forget population, archive and metrics
    fn reset(&mut self);
}
