//! Population of candidate solutions

use crate::error::{CompositionError, CompositionResult};
use crate::solution::Genotype;
use rand::Rng;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Scalar fitness of a solution, `-inf` when unfitted
pub fn scalar_fitness<S: Genotype>(solution: &S) -> f64 {
    solution
        .fitted()
        .map_or(f64::NEG_INFINITY, |state| state.fitness.total())
}

fn by_fitness<S: Genotype>(a: &S, b: &S) -> Ordering {
    scalar_fitness(a)
        .partial_cmp(&scalar_fitness(b))
        .unwrap_or(Ordering::Equal)
}

/// Population of one generation
#[derive(Debug, Clone)]
pub struct Population<S> {
    /// Individuals in the population
    pub individuals: Vec<S>,
    /// Current generation
    pub generation: u64,
}

impl<S: Genotype + Send + Sync> Population<S> {
    /// Create new empty population
    pub fn new() -> Self {
        Self {
            individuals: Vec::new(),
            generation: 0,
        }
    }

    /// Create population from individuals
    pub fn from_individuals(individuals: Vec<S>) -> Self {
        Self {
            individuals,
            generation: 0,
        }
    }

    /// Get population size
    #[inline]
    pub fn size(&self) -> usize {
        self.individuals.len()
    }

    /// Whether the population holds no individuals
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Fitted individual with the highest scalar fitness
    pub fn best(&self) -> Option<&S> {
        self.individuals
            .iter()
            .filter(|s| s.fitted().is_some())
            .max_by(|a, b| by_fitness(*a, *b))
    }

    /// Fitted individuals sorted by descending fitness, at most `n`
    pub fn select_top(&self, n: usize) -> Vec<&S> {
        let mut ranked: Vec<&S> = self
            .individuals
            .iter()
            .filter(|s| s.fitted().is_some())
            .collect();

        // Use parallel sort for large populations (threshold: 100 individuals)
        if ranked.len() > 100 {
            ranked.par_sort_by(|a, b| by_fitness(*b, *a));
        } else {
            ranked.sort_by(|a, b| by_fitness(*b, *a));
        }

        ranked.truncate(n);
        ranked
    }

    /// Best of `k` individuals drawn with replacement
    pub fn tournament<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> CompositionResult<&S> {
        if self.individuals.is_empty() {
            return Err(CompositionError::EmptyPopulation);
        }
        (0..k.max(1))
            .map(|_| &self.individuals[rng.gen_range(0..self.individuals.len())])
            .max_by(|a, b| by_fitness(*a, *b))
            .ok_or(CompositionError::EmptyPopulation)
    }

    /// Mean scalar fitness of the fitted individuals
    pub fn average_fitness(&self) -> f64 {
        let fitted: Vec<f64> = self
            .individuals
            .iter()
            .filter(|s| s.fitted().is_some())
            .map(scalar_fitness)
            .collect();
        if fitted.is_empty() {
            return 0.0;
        }
        fitted.iter().sum::<f64>() / fitted.len() as f64
    }

    /// Mean pairwise Hamming distance over genome length, in `[0, 1]`
    pub fn diversity(&self) -> f64 {
        let n = self.individuals.len();
        if n < 2 {
            return 0.0;
        }
        let total: usize = (0..n)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..n)
                    .map(|j| {
                        self.individuals[i]
                            .genome()
                            .hamming_distance(self.individuals[j].genome())
                    })
                    .sum::<usize>()
            })
            .sum();
        let len = self
            .individuals
            .iter()
            .map(|s| s.genome().len())
            .max()
            .unwrap_or(0);
        if len == 0 {
            return 0.0;
        }
        let pairs = n * (n - 1) / 2;
        total as f64 / (pairs * len) as f64
    }

    /// Increment generation
    pub fn next_generation(&mut self) {
        self.generation += 1;
    }
}

impl<S: Genotype + Send + Sync> Default for Population<S> {
    fn default() -> Self {
        Self::new()
    }
}
