//! Configuration for solution composition

use crate::crossover::Crossover;
use crate::error::{CompositionError, CompositionResult};
use crate::fitness::FitnessKind;
use crate::mixing::ErrorExperienceHeuristic;
use crate::solution::{DEFAULT_CROSSOVER_RATE, DEFAULT_MUTATION_RATE};
use serde::{Deserialize, Serialize};

/// Settings of the self-adapting genetic algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionConfig {
    /// Generations per `optimize` call
    pub generations: u32,
    /// Population size
    pub population_size: usize,
    /// Fraction of the population carried over unchanged
    pub elitist_ratio: f64,
    /// Probability of a bit being set in a freshly initialised genome
    pub initial_density: f64,
    /// Tournament size for parent selection
    pub tournament_size: usize,
    /// Crossover rate of the initial population
    pub crossover_rate: f64,
    /// Mutation rate of the initial population
    pub mutation_rate: f64,
    /// Crossover operator of the initial population
    pub crossover: Crossover,
    /// Operator self-adaptation
    pub adaptation: AdaptationConfig,
    /// Mixing model shared by all solutions
    pub mixing: ErrorExperienceHeuristic,
    /// Fitness function shared by all solutions
    pub fitness: FitnessKind,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
    /// Evaluate each generation on the rayon pool
    pub parallel_evaluation: bool,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            generations: 32,
            population_size: 32,
            elitist_ratio: 0.17,
            initial_density: 0.5,
            tournament_size: 5,
            crossover_rate: DEFAULT_CROSSOVER_RATE,
            mutation_rate: DEFAULT_MUTATION_RATE,
            crossover: Crossover::default(),
            adaptation: AdaptationConfig::default(),
            mixing: ErrorExperienceHeuristic::default(),
            fitness: FitnessKind::default(),
            seed: None,
            parallel_evaluation: true,
            logging: LoggingConfig::default(),
        }
    }
}

/// Bounds and step size for per-individual operator rates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationConfig {
    /// Log-normal perturbation strength
    pub step: f64,
    /// Lower crossover rate bound
    pub min_crossover_rate: f64,
    /// Upper crossover rate bound
    pub max_crossover_rate: f64,
    /// Lower mutation rate bound
    pub min_mutation_rate: f64,
    /// Upper mutation rate bound
    pub max_mutation_rate: f64,
    /// Probability of switching crossover family
    pub switch_probability: f64,
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            step: 0.2,
            min_crossover_rate: 0.05,
            max_crossover_rate: 1.0,
            min_mutation_rate: 1e-4,
            max_mutation_rate: 0.5,
            switch_probability: 0.05,
        }
    }
}

impl AdaptationConfig {
    fn validate(&self) -> CompositionResult<()> {
        if !(self.step >= 0.0) {
            return Err(invalid("Adaptation step must be non-negative"));
        }
        if !(0.0 <= self.min_crossover_rate
            && self.min_crossover_rate <= self.max_crossover_rate
            && self.max_crossover_rate <= 1.0)
        {
            return Err(invalid(
                "Crossover rate bounds must satisfy 0 <= min <= max <= 1",
            ));
        }
        if !(0.0 <= self.min_mutation_rate && self.min_mutation_rate <= self.max_mutation_rate) {
            return Err(invalid("Mutation rate bounds must satisfy 0 <= min <= max"));
        }
        if !(0.0..=1.0).contains(&self.switch_probability) {
            return Err(invalid("Switch probability must be between 0 and 1"));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log every N generations
    pub log_interval: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { log_interval: 8 }
    }
}

fn invalid(message: &str) -> CompositionError {
    CompositionError::InvalidConfiguration {
        message: message.to_string(),
    }
}

impl CompositionConfig {
    /// Validate configuration
    pub fn validate(&self) -> CompositionResult<()> {
        if self.population_size == 0 {
            return Err(invalid("Population size must be greater than 0"));
        }

        if self.generations == 0 {
            return Err(invalid("Generations must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.elitist_ratio) {
            return Err(invalid("Elitist ratio must be between 0 and 1"));
        }

        if !(0.0..=1.0).contains(&self.initial_density) {
            return Err(invalid("Initial density must be between 0 and 1"));
        }

        if self.tournament_size == 0 {
            return Err(invalid("Tournament size must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(invalid("Crossover rate must be between 0 and 1"));
        }

        if !(self.mutation_rate >= 0.0) {
            return Err(invalid("Mutation rate must be non-negative"));
        }

        if !(self.mixing.experience_weight > 0.0) {
            return Err(invalid("Experience weight must be positive"));
        }

        if self.logging.log_interval == 0 {
            return Err(invalid("Log interval must be greater than 0"));
        }

        self.adaptation.validate()
    }

    /// Number of elites kept each generation
    pub fn elite_count(&self) -> usize {
        ((self.population_size as f64) * self.elitist_ratio).floor() as usize
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> CompositionResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> CompositionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Create a builder for the configuration
    pub fn builder() -> CompositionConfigBuilder {
        CompositionConfigBuilder::default()
    }
}

/// Builder for CompositionConfig
#[derive(Default)]
pub struct CompositionConfigBuilder {
    config: CompositionConfig,
}

impl CompositionConfigBuilder {
    /// Set generations
    pub fn generations(mut self, generations: u32) -> Self {
        self.config.generations = generations;
        self
    }

    /// Set population size
    pub fn population_size(mut self, size: usize) -> Self {
        self.config.population_size = size;
        self
    }

    /// Set elitist ratio
    pub fn elitist_ratio(mut self, ratio: f64) -> Self {
        self.config.elitist_ratio = ratio;
        self
    }

    /// Set initial genome density
    pub fn initial_density(mut self, density: f64) -> Self {
        self.config.initial_density = density;
        self
    }

    /// Set tournament size
    pub fn tournament_size(mut self, size: usize) -> Self {
        self.config.tournament_size = size;
        self
    }

    /// Set initial operator parameters
    pub fn operators(
        mut self,
        crossover_rate: f64,
        mutation_rate: f64,
        crossover: Crossover,
    ) -> Self {
        self.config.crossover_rate = crossover_rate;
        self.config.mutation_rate = mutation_rate;
        self.config.crossover = crossover;
        self
    }

    /// Set adaptation settings
    pub fn adaptation(mut self, adaptation: AdaptationConfig) -> Self {
        self.config.adaptation = adaptation;
        self
    }

    /// Set mixing model
    pub fn mixing(mut self, mixing: ErrorExperienceHeuristic) -> Self {
        self.config.mixing = mixing;
        self
    }

    /// Set fitness function
    pub fn fitness(mut self, fitness: FitnessKind) -> Self {
        self.config.fitness = fitness;
        self
    }

    /// Set seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Enable/disable parallel evaluation
    pub fn parallel_evaluation(mut self, enabled: bool) -> Self {
        self.config.parallel_evaluation = enabled;
        self
    }

    /// Set log interval
    pub fn log_interval(mut self, interval: u32) -> Self {
        self.config.logging.log_interval = interval;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CompositionResult<CompositionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixing::SubpopulationFilter;

    #[test]
    fn test_config_default() {
        let config = CompositionConfig::default();
        assert_eq!(config.generations, 32);
        assert_eq!(config.population_size, 32);
        assert_eq!(config.crossover, Crossover::NPoint { n: 3 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CompositionConfig::default();
        config.population_size = 0;
        assert!(config.validate().is_err());

        config.population_size = 10;
        config.generations = 0;
        assert!(config.validate().is_err());

        config.generations = 10;
        config.elitist_ratio = 1.5;
        assert!(config.validate().is_err());

        config.elitist_ratio = 0.2;
        config.adaptation.min_mutation_rate = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_experience_weight_must_be_positive() {
        for weight in [f64::NAN, 0.0, -1.0] {
            let mut config = CompositionConfig::default();
            config.mixing.experience_weight = weight;
            assert!(
                matches!(
                    config.validate(),
                    Err(CompositionError::InvalidConfiguration { .. })
                ),
                "experience weight {weight} accepted"
            );
        }
    }

    #[test]
    fn test_config_builder() {
        let config = CompositionConfig::builder()
            .generations(64)
            .population_size(16)
            .operators(0.7, 0.01, Crossover::Uniform)
            .seed(42)
            .parallel_evaluation(false)
            .build()
            .unwrap();

        assert_eq!(config.generations, 64);
        assert_eq!(config.population_size, 16);
        assert_eq!(config.crossover, Crossover::Uniform);
        assert_eq!(config.seed, Some(42));
        assert!(!config.parallel_evaluation);
    }

    #[test]
    fn test_builder_rejects_invalid() {
        assert!(CompositionConfig::builder().tournament_size(0).build().is_err());
    }

    #[test]
    fn test_elite_count() {
        let config = CompositionConfig::builder()
            .population_size(32)
            .elitist_ratio(0.17)
            .build()
            .unwrap();
        assert_eq!(config.elite_count(), 5);
    }

    #[test]
    fn test_json_round_trip() {
        let config = CompositionConfig::builder()
            .mixing(ErrorExperienceHeuristic {
                filter: SubpopulationFilter::NBestFitness { rule_amount: 4 },
                ..Default::default()
            })
            .seed(7)
            .build()
            .unwrap();
        let json = config.to_json().unwrap();
        let parsed = CompositionConfig::from_json(&json).unwrap();
        assert_eq!(parsed.mixing, config.mixing);
        assert_eq!(parsed.seed, Some(7));
    }

    #[test]
    fn test_json_rejects_invalid_values() {
        let mut config = CompositionConfig::default();
        config.population_size = 0;
        let json = serde_json::to_string(&config).unwrap();
        assert!(matches!(
            CompositionConfig::from_json(&json),
            Err(CompositionError::InvalidConfiguration { .. })
        ));
    }
}
