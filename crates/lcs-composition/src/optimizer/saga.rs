//! Self-adapting genetic algorithm
//!
//! Every individual carries its own crossover rate, mutation rate and
//! crossover operator. Children inherit the mean of their parents' rates,
//! perturbed and clamped, so the operator settings evolve alongside the rule
//! subsets.

use super::SolutionComposition;
use crate::archive::ElitistArchive;
use crate::config::CompositionConfig;
use crate::error::{CompositionError, CompositionResult};
use crate::fitness::SolutionFitness;
use crate::genome::Genome;
use crate::metrics::{CompositionMetrics, GenerationStats, MetricsCollector};
use crate::mixing::MixingModel;
use crate::mutation::{adapt_operators, bit_flips, InheritedOperators};
use crate::population::{scalar_fitness, Population};
use crate::rule::{Rule, RulePool};
use crate::sampler::SolutionSampler;
use crate::solution::{Genotype, SelfAdaptiveSolution};
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Genetic algorithm over [`SelfAdaptiveSolution`]s
#[derive(Debug)]
pub struct SelfAdaptingGeneticAlgorithm {
    config: CompositionConfig,
    mixing: Arc<dyn MixingModel>,
    fitness: Arc<dyn SolutionFitness>,
    population: Population<SelfAdaptiveSolution>,
    archive: ElitistArchive<SelfAdaptiveSolution>,
    metrics: MetricsCollector,
    rng: StdRng,
}

impl SelfAdaptingGeneticAlgorithm {
    /// Create the optimizer with the mixing model and fitness named in `config`
    pub fn new(config: CompositionConfig) -> CompositionResult<Self> {
        let mixing = Arc::new(config.mixing.clone());
        let fitness = Arc::new(config.fitness.clone());
        Self::with_models(config, mixing, fitness)
    }

    /// Create the optimizer with custom mixing and fitness implementations
    pub fn with_models(
        config: CompositionConfig,
        mixing: Arc<dyn MixingModel>,
        fitness: Arc<dyn SolutionFitness>,
    ) -> CompositionResult<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed.unwrap_or_else(rand::random));
        Ok(Self {
            config,
            mixing,
            fitness,
            population: Population::new(),
            archive: ElitistArchive::new(),
            metrics: MetricsCollector::new(),
            rng,
        })
    }

    /// Warm start from existing solutions
    ///
    /// Genomes shorter than the pool are padded on the next `optimize`.
    pub fn with_population(mut self, solutions: Vec<SelfAdaptiveSolution>) -> Self {
        self.population = Population::from_individuals(solutions);
        self
    }

    /// Get configuration
    pub fn config(&self) -> &CompositionConfig {
        &self.config
    }

    /// Current population
    pub fn population(&self) -> &Population<SelfAdaptiveSolution> {
        &self.population
    }

    /// Elitist archive
    pub fn archive(&self) -> &ElitistArchive<SelfAdaptiveSolution> {
        &self.archive
    }

    /// Draw one archived solution with `sampler`
    pub fn sample_front<S: SolutionSampler>(
        &mut self,
        sampler: &S,
    ) -> CompositionResult<SelfAdaptiveSolution> {
        let front = self.archive.solutions();
        sampler.sample(&front, &mut self.rng).cloned()
    }

    fn random_solution(&mut self, len: usize) -> SelfAdaptiveSolution {
        SelfAdaptiveSolution::new(
            Genome::random(len, self.config.initial_density, &mut self.rng),
            self.mixing.clone(),
            self.fitness.clone(),
        )
        .with_operators(
            self.config.crossover_rate,
            self.config.mutation_rate,
            self.config.crossover,
        )
    }

    /// Fill up or pad the population so every genome covers `pool`
    fn prepare_population<R: Rule>(&mut self, pool: &RulePool<R>) {
        for solution in &mut self.population.individuals {
            solution.pad_to(pool);
        }
        while self.population.size() < self.config.population_size {
            let solution = self.random_solution(pool.len());
            self.population.individuals.push(solution);
        }
    }

    /// Pad and refit archived solutions after the pool grew
    fn refresh_archive<R: Rule>(
        &mut self,
        pool: &RulePool<R>,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> CompositionResult<()> {
        let mut members = self.archive.solutions();
        if members.is_empty() {
            return Ok(());
        }
        for member in &mut members {
            member.pad_to(pool);
        }
        self.evaluate(&mut members, pool, x, y)?;
        self.archive
            .rebuild(members, self.metrics.metrics().generation)
    }

    /// Fit every solution with its own random stream
    fn evaluate<R: Rule>(
        &mut self,
        solutions: &mut [SelfAdaptiveSolution],
        pool: &RulePool<R>,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> CompositionResult<()> {
        let seeds: Vec<u64> = (0..solutions.len()).map(|_| self.rng.gen()).collect();
        let fit = |(solution, seed): (&mut SelfAdaptiveSolution, &u64)| {
            let mut rng = StdRng::seed_from_u64(*seed);
            solution.fit(pool, x, y, &mut rng).map(|_| ())
        };

        if self.config.parallel_evaluation {
            solutions
                .par_iter_mut()
                .zip(seeds.par_iter())
                .try_for_each(fit)?;
        } else {
            solutions.iter_mut().zip(seeds.iter()).try_for_each(fit)?;
        }

        debug!(count = solutions.len(), "Evaluated solutions");
        Ok(())
    }

    /// Produce one child from two tournament winners
    fn breed(&mut self) -> CompositionResult<SelfAdaptiveSolution> {
        let k = self.config.tournament_size;
        let a = self.population.tournament(k, &mut self.rng)?;
        let b = self.population.tournament(k, &mut self.rng)?;

        let child = a
            .crossover()
            .apply(a, b, a.crossover_rate(), &mut self.rng)?;
        let child = adapt_operators(
            &child,
            InheritedOperators::from_parents(a, b),
            &self.config.adaptation,
            &mut self.rng,
        );
        Ok(bit_flips(&child, child.mutation_rate(), &mut self.rng))
    }

    fn generation_stats(&self, evaluations: u64) -> GenerationStats {
        let individuals = &self.population.individuals;
        let n = individuals.len().max(1) as f64;
        let best = self.population.best();

        GenerationStats {
            best_fitness: best.map_or(f64::NEG_INFINITY, scalar_fitness),
            average_fitness: self.population.average_fitness(),
            best_error: best
                .and_then(|s| s.fitted())
                .map_or(f64::INFINITY, |state| state.error),
            mean_complexity: individuals
                .iter()
                .map(|s| s.genome().count_ones() as f64)
                .sum::<f64>()
                / n,
            diversity: self.population.diversity(),
            mean_crossover_rate: individuals.iter().map(|s| s.crossover_rate()).sum::<f64>() / n,
            mean_mutation_rate: individuals.iter().map(|s| s.mutation_rate()).sum::<f64>() / n,
            evaluations,
            archive_size: self.archive.len(),
        }
    }

    fn step<R: Rule>(
        &mut self,
        pool: &RulePool<R>,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> CompositionResult<()> {
        self.metrics.start_generation();
        let generation = self.metrics.metrics().generation;

        let elites: Vec<SelfAdaptiveSolution> = self
            .population
            .select_top(self.config.elite_count())
            .into_iter()
            .cloned()
            .collect();

        let offspring = self.config.population_size.saturating_sub(elites.len());
        let mut children = Vec::with_capacity(offspring);
        for _ in 0..offspring {
            children.push(self.breed()?);
        }
        self.evaluate(&mut children, pool, x, y)?;
        self.archive.update(children.iter(), generation)?;

        let mut individuals = elites;
        individuals.extend(children);
        self.population.individuals = individuals;
        self.population.next_generation();

        let stats = self.generation_stats(offspring as u64);
        if generation % self.config.logging.log_interval == 0 {
            info!(
                generation,
                best_fitness = stats.best_fitness,
                average_fitness = stats.average_fitness,
                mean_complexity = stats.mean_complexity,
                archive_size = stats.archive_size,
                crossover_rate = stats.mean_crossover_rate,
                mutation_rate = stats.mean_mutation_rate,
                "Generation complete"
            );
        }
        self.metrics.end_generation(stats);
        Ok(())
    }
}

impl SolutionComposition for SelfAdaptingGeneticAlgorithm {
    type Solution = SelfAdaptiveSolution;

    fn optimize<R: Rule>(
        &mut self,
        pool: &RulePool<R>,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> CompositionResult<SelfAdaptiveSolution> {
        if y.len() != x.nrows() {
            return Err(CompositionError::ShapeMismatch {
                context: "optimize targets",
                expected: x.nrows(),
                actual: y.len(),
            });
        }

        self.prepare_population(pool);
        self.refresh_archive(pool, x, y)?;

        // data may have changed since the last call, so every individual is refitted
        let mut individuals = std::mem::take(&mut self.population.individuals);
        let result = self.evaluate(&mut individuals, pool, x, y);
        self.population.individuals = individuals;
        result?;
        let generation = self.metrics.metrics().generation;
        self.archive
            .update(self.population.individuals.iter(), generation)?;

        for _ in 0..self.config.generations {
            self.step(pool, x, y)?;
        }

        self.population
            .best()
            .cloned()
            .ok_or(CompositionError::EmptyPopulation)
    }

    fn pareto_front(&self) -> Vec<SelfAdaptiveSolution> {
        self.archive.solutions()
    }

    fn metrics(&self) -> &CompositionMetrics {
        self.metrics.metrics()
    }

    fn reset(&mut self) {
        self.population = Population::new();
        self.archive = ElitistArchive::new();
        self.metrics = MetricsCollector::new();
    }
}
