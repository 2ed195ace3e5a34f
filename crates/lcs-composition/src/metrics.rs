//! Per-generation statistics of a composition run

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Snapshot of one generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Best scalar fitness in the population
    pub best_fitness: f64,
    /// Mean scalar fitness
    pub average_fitness: f64,
    /// Training error of the best solution
    pub best_error: f64,
    /// Mean number of selected rules
    pub mean_complexity: f64,
    /// Mean pairwise Hamming distance divided by genome length
    pub diversity: f64,
    /// Mean crossover rate
    pub mean_crossover_rate: f64,
    /// Mean mutation rate
    pub mean_mutation_rate: f64,
    /// Solutions fitted this generation
    pub evaluations: u64,
    /// Size of the elitist archive afterwards
    pub archive_size: usize,
}

/// Running metrics of a composition run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionMetrics {
    /// Generations completed
    pub generation: u32,
    /// Total fits performed
    pub total_evaluations: u64,
    /// Stats of the latest generation
    pub latest: GenerationStats,
    /// Time elapsed
    pub elapsed_time: Duration,
    /// Relative improvement of the best fitness over the last few generations
    pub convergence_rate: f64,
    /// Performance history
    pub history: PerformanceHistory,
}

impl Default for CompositionMetrics {
    fn default() -> Self {
        Self {
            generation: 0,
            total_evaluations: 0,
            latest: GenerationStats::default(),
            elapsed_time: Duration::from_secs(0),
            convergence_rate: 0.0,
            history: PerformanceHistory::default(),
        }
    }
}

/// Performance history tracking
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PerformanceHistory {
    /// Best fitness per generation
    pub best_fitness_history: Vec<f64>,
    /// Average fitness per generation
    pub average_fitness_history: Vec<f64>,
    /// Diversity per generation
    pub diversity_history: Vec<f64>,
    /// Mean (crossover rate, mutation rate) per generation
    pub rate_history: Vec<(f64, f64)>,
    /// Generation times
    pub generation_times: Vec<Duration>,
}

impl PerformanceHistory {
    /// Add generation data
    pub fn add_generation(&mut self, stats: &GenerationStats, generation_time: Duration) {
        self.best_fitness_history.push(stats.best_fitness);
        self.average_fitness_history.push(stats.average_fitness);
        self.diversity_history.push(stats.diversity);
        self.rate_history
            .push((stats.mean_crossover_rate, stats.mean_mutation_rate));
        self.generation_times.push(generation_time);
    }

    /// Relative change of the best fitness over the last `window` generations
    pub fn improvement_rate(&self, window: usize) -> f64 {
        let history = &self.best_fitness_history;
        if window == 0 || history.len() < window + 1 {
            return 0.0;
        }

        let first = history[history.len() - window - 1];
        let last = history[history.len() - 1];
        if first == 0.0 {
            return 0.0;
        }

        (last - first) / first.abs()
    }
}

/// Metrics collector for the optimizer
#[derive(Debug)]
pub struct MetricsCollector {
    start_time: Instant,
    generation_start: Instant,
    metrics: CompositionMetrics,
}

impl MetricsCollector {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            generation_start: Instant::now(),
            metrics: CompositionMetrics::default(),
        }
    }

    /// Start new generation
    pub fn start_generation(&mut self) {
        self.generation_start = Instant::now();
        self.metrics.generation += 1;
    }

    /// End generation and update metrics
    pub fn end_generation(&mut self, stats: GenerationStats) {
        let generation_time = self.generation_start.elapsed();

        self.metrics.total_evaluations += stats.evaluations;
        self.metrics.elapsed_time = self.start_time.elapsed();
        self.metrics.history.add_generation(&stats, generation_time);
        self.metrics.convergence_rate = self.metrics.history.improvement_rate(5).abs();
        self.metrics.latest = stats;
    }

    /// Get current metrics
    pub fn metrics(&self) -> &CompositionMetrics {
        &self.metrics
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
