//! Solution composition for learning classifier systems
//!
//! Rules discovered elsewhere live in an append-only [`RulePool`]. A solution
//! is a bit genome selecting a subset of that pool; its prediction is the
//! mixture of the selected rules' local predictions. This crate provides:
//! - the error/experience mixing model with subpopulation filters and
//!   experience transforms
//! - self-adaptive solutions, crossover and mutation operators
//! - a self-adapting genetic algorithm with an elitist Pareto archive
//! - Pareto samplers and crowding distance

#![warn(missing_docs)]

pub mod archive;
pub mod config;
pub mod crossover;
pub mod crowding;
pub mod error;
pub mod fitness;
pub mod genome;
pub mod metrics;
pub mod mixing;
pub mod mutation;
pub mod optimizer;
pub mod population;
pub mod rule;
pub mod sampler;
pub mod solution;

pub use archive::{dominates, non_dominated_indices, ElitistArchive};
pub use config::{AdaptationConfig, CompositionConfig, LoggingConfig};
pub use crossover::Crossover;
pub use crowding::crowding_distances;
pub use error::{CompositionError, CompositionResult};
pub use fitness::{Fitness, FitnessKind, SolutionFitness};
pub use genome::Genome;
pub use metrics::{CompositionMetrics, GenerationStats};
pub use mixing::{ErrorExperienceHeuristic, ExperienceCalculation, MixingModel, SubpopulationFilter};
pub use optimizer::{SelfAdaptingGeneticAlgorithm, SolutionComposition};
pub use rule::{IntervalRule, Rule, RulePool, RuleRef};
pub use sampler::{DiversitySolutionSampler, PdfSolutionSampler, SolutionSampler};
pub use solution::{Genotype, SelfAdaptiveSolution, Solution, SolutionOverrides};

/// Initialize the composition subsystem
pub fn init() -> CompositionResult<()> {
    tracing::info!("Initializing solution composition subsystem");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composition_init() {
        assert!(init().is_ok());
    }
}
