//! Mutation of genomes and of self-adaptive operator parameters

use crate::config::AdaptationConfig;
use crate::crossover::Crossover;
use crate::solution::{Genotype, SelfAdaptiveSolution, SolutionOverrides};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Flip every bit independently with probability `mutation_rate`
///
/// Always returns an unfitted copy.
pub fn bit_flips<S, R>(solution: &S, mutation_rate: f64, rng: &mut R) -> S
where
    S: Genotype,
    R: Rng + ?Sized,
{
    let bits = solution
        .genome()
        .as_slice()
        .iter()
        .map(|&bit| bit ^ (rng.gen::<f64>() < mutation_rate))
        .collect::<Vec<bool>>();
    solution.with_genome(bits.into())
}

/// Operator parameters a child inherits from its parents before its own perturbation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InheritedOperators {
    /// Mean of the parents' crossover rates
    pub crossover_rate: f64,
    /// Mean of the parents' mutation rates
    pub mutation_rate: f64,
    /// Primary parent's operator
    pub crossover: Crossover,
}

impl InheritedOperators {
    /// Blend the parameters of the primary parent `a` and secondary parent `b`
    pub fn from_parents(a: &SelfAdaptiveSolution, b: &SelfAdaptiveSolution) -> Self {
        Self {
            crossover_rate: 0.5 * (a.crossover_rate() + b.crossover_rate()),
            mutation_rate: 0.5 * (a.mutation_rate() + b.mutation_rate()),
            crossover: a.crossover(),
        }
    }
}

/// Apply inherited, perturbed operator parameters to `child`
///
/// Both rates are scaled by `exp(step * N(0, 1))` and clamped into the
/// configured bounds; with `switch_probability` the operator family flips.
pub fn adapt_operators<R: Rng + ?Sized>(
    child: &SelfAdaptiveSolution,
    inherited: InheritedOperators,
    config: &AdaptationConfig,
    rng: &mut R,
) -> SelfAdaptiveSolution {
    let mut perturb = |rate: f64| {
        let z: f64 = StandardNormal.sample(&mut *rng);
        rate * (config.step * z).exp()
    };
    let crossover_rate = perturb(inherited.crossover_rate)
        .clamp(config.min_crossover_rate, config.max_crossover_rate);
    let mutation_rate = perturb(inherited.mutation_rate)
        .clamp(config.min_mutation_rate, config.max_mutation_rate);
    let crossover = if rng.gen::<f64>() < config.switch_probability {
        inherited.crossover.alternate()
    } else {
        inherited.crossover
    };

    child.clone_with(SolutionOverrides {
        crossover_rate: Some(crossover_rate),
        mutation_rate: Some(mutation_rate),
        crossover: Some(crossover),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::ComplexityWu;
    use crate::genome::Genome;
    use crate::mixing::ErrorExperienceHeuristic;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn solution(bits: Vec<bool>) -> SelfAdaptiveSolution {
        SelfAdaptiveSolution::new(
            Genome::new(bits),
            Arc::new(ErrorExperienceHeuristic::default()),
            Arc::new(ComplexityWu::default()),
        )
    }

    #[test]
    fn test_bit_flips_extremes() {
        let s = solution(vec![true, false, true, false]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(bit_flips(&s, 0.0, &mut rng).genome(), s.genome());
        assert_eq!(
            bit_flips(&s, 1.0, &mut rng).genome().as_slice(),
            &[false, true, false, true]
        );
    }

    #[test]
    fn test_bit_flips_keeps_operators() {
        let s = solution(vec![true; 8]).with_operators(0.4, 0.2, Crossover::Uniform);
        let mut rng = StdRng::seed_from_u64(1);
        let child = bit_flips(&s, 0.5, &mut rng);
        assert_eq!(child.crossover_rate(), 0.4);
        assert_eq!(child.mutation_rate(), 0.2);
        assert_eq!(child.crossover(), Crossover::Uniform);
        assert!(!child.is_fitted());
    }

    #[test]
    fn test_inherited_operators_average() {
        let a = solution(vec![true]).with_operators(0.8, 0.02, Crossover::Uniform);
        let b = solution(vec![true]).with_operators(0.4, 0.04, Crossover::NPoint { n: 2 });
        let inherited = InheritedOperators::from_parents(&a, &b);
        assert!((inherited.crossover_rate - 0.6).abs() < 1e-12);
        assert!((inherited.mutation_rate - 0.03).abs() < 1e-12);
        assert_eq!(inherited.crossover, Crossover::Uniform);
    }

    #[test]
    fn test_adaptation_without_step_is_identity() {
        let config = AdaptationConfig {
            step: 0.0,
            switch_probability: 0.0,
            ..Default::default()
        };
        let child = solution(vec![true, false]);
        let inherited = InheritedOperators {
            crossover_rate: 0.7,
            mutation_rate: 0.01,
            crossover: Crossover::NPoint { n: 3 },
        };
        let mut rng = StdRng::seed_from_u64(3);
        let adapted = adapt_operators(&child, inherited, &config, &mut rng);
        assert!((adapted.crossover_rate() - 0.7).abs() < 1e-12);
        assert!((adapted.mutation_rate() - 0.01).abs() < 1e-12);
        assert_eq!(adapted.crossover(), Crossover::NPoint { n: 3 });
        assert_eq!(adapted.genome(), child.genome());
    }

    #[test]
    fn test_adaptation_respects_bounds_and_switches() {
        let config = AdaptationConfig {
            step: 5.0,
            switch_probability: 1.0,
            ..Default::default()
        };
        let child = solution(vec![true]);
        let inherited = InheritedOperators {
            crossover_rate: 0.9,
            mutation_rate: 0.3,
            crossover: Crossover::Uniform,
        };
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..50 {
            let adapted = adapt_operators(&child, inherited, &config, &mut rng);
            assert!(adapted.crossover_rate() >= config.min_crossover_rate);
            assert!(adapted.crossover_rate() <= config.max_crossover_rate);
            assert!(adapted.mutation_rate() >= config.min_mutation_rate);
            assert!(adapted.mutation_rate() <= config.max_mutation_rate);
            assert_eq!(adapted.crossover(), Crossover::NPoint { n: 3 });
        }
    }
}
