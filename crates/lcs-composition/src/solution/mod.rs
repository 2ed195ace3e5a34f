//! Solutions: genomes over the rule pool plus the state cached by fitting

mod self_adaptive;

pub use self_adaptive::{
    SelfAdaptiveSolution, SolutionOverrides, DEFAULT_CROSSOVER_RATE, DEFAULT_MUTATION_RATE,
};

use crate::error::{CompositionError, CompositionResult};
use crate::fitness::{Fitness, FitnessInput, SolutionFitness};
use crate::genome::Genome;
use crate::mixing::MixingModel;
use crate::rule::{Rule, RulePool, ERROR_FLOOR};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything computed by [`Solution::fit`], copied as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedState {
    /// Mean-squared training error, floored at [`ERROR_FLOOR`]
    pub error: f64,
    /// Number of selected rules
    pub complexity: usize,
    /// Genome length at fit time
    pub input_size: usize,
    /// Fitness computed from the above
    pub fitness: Fitness,
}

/// Anything carrying a genome that can be rebuilt around a new one
pub trait Genotype: Clone {
    /// Current genome
    fn genome(&self) -> &Genome;

    /// Unfitted copy holding `genome` and sharing everything else
    fn with_genome(&self, genome: Genome) -> Self;

    /// Fitted state, if any
    fn fitted(&self) -> Option<&FittedState>;
}

/// Number of zero bits a genome needs to cover the current pool
pub fn padding_size<S: Genotype, R: Rule>(solution: &S, pool: &RulePool<R>) -> usize {
    pool.len().saturating_sub(solution.genome().len())
}

/// A subset of the pool combined by a mixing model
#[derive(Debug, Clone)]
pub struct Solution {
    genome: Genome,
    mixing: Arc<dyn MixingModel>,
    fitness: Arc<dyn SolutionFitness>,
    fitted: Option<FittedState>,
}

impl Solution {
    /// Create an unfitted solution
    pub fn new(
        genome: Genome,
        mixing: Arc<dyn MixingModel>,
        fitness: Arc<dyn SolutionFitness>,
    ) -> Self {
        Self {
            genome,
            mixing,
            fitness,
            fitted: None,
        }
    }

    /// Shared mixing model
    pub fn mixing(&self) -> &Arc<dyn MixingModel> {
        &self.mixing
    }

    /// Shared fitness function
    pub fn fitness_function(&self) -> &Arc<dyn SolutionFitness> {
        &self.fitness
    }

    /// Whether [`Solution::fit`] has run since the genome last changed
    #[inline]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fitted state or [`CompositionError::NotFitted`]
    pub fn fitted_state(&self) -> CompositionResult<&FittedState> {
        self.fitted.as_ref().ok_or(CompositionError::NotFitted)
    }

    /// Extend the genome with unselected bits for rules added since creation
    ///
    /// Drops the fitted state when bits were added.
    pub fn pad_to<R: Rule>(&mut self, pool: &RulePool<R>) {
        let k = padding_size(&*self, pool);
        if k > 0 {
            self.genome.pad(k);
            self.fitted = None;
        }
    }

    /// Ensemble prediction of the selected rules
    pub fn predict<R: Rule>(
        &self,
        pool: &RulePool<R>,
        x: ArrayView2<'_, f64>,
        cache: bool,
        rng: &mut StdRng,
    ) -> CompositionResult<Array1<f64>> {
        let subpopulation = pool.subpopulation(&self.genome)?;
        self.mixing.mix(x, &subpopulation, cache, rng)
    }

    /// Evaluate on a training batch and cache error, complexity and fitness
    ///
    /// Uses the rules' cached matching pass, so the pool must have been
    /// refreshed on `x`. The genome has to cover exactly the current pool.
    pub fn fit<R: Rule>(
        &mut self,
        pool: &RulePool<R>,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        rng: &mut StdRng,
    ) -> CompositionResult<&FittedState> {
        if self.genome.len() != pool.len() {
            return Err(CompositionError::PaddingRequired {
                genome: self.genome.len(),
                pool: pool.len(),
            });
        }
        if y.len() != x.nrows() {
            return Err(CompositionError::ShapeMismatch {
                context: "fit targets",
                expected: x.nrows(),
                actual: y.len(),
            });
        }

        let prediction = self.predict(pool, x, true, rng)?;
        let error = mean_squared_error(y, prediction.view()).max(ERROR_FLOOR);
        let input = FitnessInput {
            error,
            complexity: self.genome.count_ones(),
            input_size: self.genome.len(),
        };
        let fitness = self.fitness.evaluate(&input);

        Ok(&*self.fitted.insert(FittedState {
            error,
            complexity: input.complexity,
            input_size: input.input_size,
            fitness,
        }))
    }
}

impl Genotype for Solution {
    fn genome(&self) -> &Genome {
        &self.genome
    }

    fn with_genome(&self, genome: Genome) -> Self {
        Self::new(genome, self.mixing.clone(), self.fitness.clone())
    }

    fn fitted(&self) -> Option<&FittedState> {
        self.fitted.as_ref()
    }
}

fn mean_squared_error(y: ArrayView1<'_, f64>, prediction: ArrayView1<'_, f64>) -> f64 {
    (&y - &prediction).mapv(|d| d * d).mean().unwrap_or(0.0)
}
