//! Solutions carrying their own crossover and mutation parameters
//!
//! Used by the self-adapting genetic algorithm, where operator rates are part
//! of the evolving genotype instead of global settings.

use super::{FittedState, Genotype, Solution};
use crate::crossover::Crossover;
use crate::error::CompositionResult;
use crate::fitness::SolutionFitness;
use crate::genome::Genome;
use crate::mixing::MixingModel;
use crate::rule::{Rule, RulePool};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use std::sync::Arc;

/// Default probability of recombining when acting as primary parent
pub const DEFAULT_CROSSOVER_RATE: f64 = 0.9;
/// Default per-bit flip probability
pub const DEFAULT_MUTATION_RATE: f64 = 0.001;

/// Fields to replace when cloning a [`SelfAdaptiveSolution`]
///
/// An empty override set yields an exact copy, fitted state included. Any
/// override produces an unfitted solution.
#[derive(Debug, Clone, Default)]
pub struct SolutionOverrides {
    /// Replacement genome
    pub genome: Option<Genome>,
    /// Replacement mixing model
    pub mixing: Option<Arc<dyn MixingModel>>,
    /// Replacement fitness function
    pub fitness: Option<Arc<dyn SolutionFitness>>,
    /// Replacement crossover rate
    pub crossover_rate: Option<f64>,
    /// Replacement mutation rate
    pub mutation_rate: Option<f64>,
    /// Replacement crossover operator
    pub crossover: Option<Crossover>,
}

impl SolutionOverrides {
    /// Override only the genome
    pub fn genome(genome: Genome) -> Self {
        Self {
            genome: Some(genome),
            ..Default::default()
        }
    }

    /// Whether nothing is overridden
    pub fn is_empty(&self) -> bool {
        self.genome.is_none()
            && self.mixing.is_none()
            && self.fitness.is_none()
            && self.crossover_rate.is_none()
            && self.mutation_rate.is_none()
            && self.crossover.is_none()
    }
}

/// [`Solution`] extended with an individual crossover rate, mutation rate and
/// crossover operator
#[derive(Debug, Clone)]
pub struct SelfAdaptiveSolution {
    base: Solution,
    crossover_rate: f64,
    mutation_rate: f64,
    crossover: Crossover,
}

impl SelfAdaptiveSolution {
    /// Create an unfitted solution with default operator parameters
    pub fn new(
        genome: Genome,
        mixing: Arc<dyn MixingModel>,
        fitness: Arc<dyn SolutionFitness>,
    ) -> Self {
        Self {
            base: Solution::new(genome, mixing, fitness),
            crossover_rate: DEFAULT_CROSSOVER_RATE,
            mutation_rate: DEFAULT_MUTATION_RATE,
            crossover: Crossover::default(),
        }
    }

    /// Set the operator parameters
    ///
    /// The crossover rate is clamped into `[0, 1]`, the mutation rate to `>= 0`.
    pub fn with_operators(
        mut self,
        crossover_rate: f64,
        mutation_rate: f64,
        crossover: Crossover,
    ) -> Self {
        self.crossover_rate = clamp_rate(crossover_rate);
        self.mutation_rate = mutation_rate.max(0.0);
        self.crossover = crossover;
        self
    }

    /// Probability of recombining when this solution is the primary parent
    #[inline]
    pub fn crossover_rate(&self) -> f64 {
        self.crossover_rate
    }

    /// Per-bit flip probability
    #[inline]
    pub fn mutation_rate(&self) -> f64 {
        self.mutation_rate
    }

    /// Operator used when this solution is the primary parent
    #[inline]
    pub fn crossover(&self) -> Crossover {
        self.crossover
    }

    /// Underlying plain solution
    pub fn base(&self) -> &Solution {
        &self.base
    }

    /// Whether the fitted state is current
    #[inline]
    pub fn is_fitted(&self) -> bool {
        self.base.is_fitted()
    }

    /// Fitted state or an error
    pub fn fitted_state(&self) -> CompositionResult<&FittedState> {
        self.base.fitted_state()
    }

    /// See [`Solution::pad_to`]
    pub fn pad_to<R: Rule>(&mut self, pool: &RulePool<R>) {
        self.base.pad_to(pool);
    }

    /// See [`Solution::predict`]
    pub fn predict<R: Rule>(
        &self,
        pool: &RulePool<R>,
        x: ArrayView2<'_, f64>,
        cache: bool,
        rng: &mut StdRng,
    ) -> CompositionResult<Array1<f64>> {
        self.base.predict(pool, x, cache, rng)
    }

    /// See [`Solution::fit`]
    pub fn fit<R: Rule>(
        &mut self,
        pool: &RulePool<R>,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        rng: &mut StdRng,
    ) -> CompositionResult<&FittedState> {
        self.base.fit(pool, x, y, rng)
    }

    /// Copy with some fields replaced
    ///
    /// Without overrides the copy keeps the fitted state, so it is
    /// indistinguishable from `self` without refitting. The genome is always
    /// an independent copy; mixing and fitness are shared.
    pub fn clone_with(&self, overrides: SolutionOverrides) -> Self {
        if overrides.is_empty() {
            return self.clone();
        }

        let SolutionOverrides {
            genome,
            mixing,
            fitness,
            crossover_rate,
            mutation_rate,
            crossover,
        } = overrides;

        Self {
            base: Solution::new(
                genome.unwrap_or_else(|| self.base.genome().clone()),
                mixing.unwrap_or_else(|| self.base.mixing().clone()),
                fitness.unwrap_or_else(|| self.base.fitness_function().clone()),
            ),
            crossover_rate: crossover_rate.map_or(self.crossover_rate, clamp_rate),
            mutation_rate: mutation_rate.map_or(self.mutation_rate, |r| r.max(0.0)),
            crossover: crossover.unwrap_or(self.crossover),
        }
    }
}

impl Genotype for SelfAdaptiveSolution {
    fn genome(&self) -> &Genome {
        self.base.genome()
    }

    fn with_genome(&self, genome: Genome) -> Self {
        self.clone_with(SolutionOverrides::genome(genome))
    }

    fn fitted(&self) -> Option<&FittedState> {
        self.base.fitted()
    }
}

fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        return 0.0;
    }
    rate.clamp(0.0, 1.0)
}
