//! Subpopulation filters bounding which matching rules take part in mixing

use crate::error::{CompositionError, CompositionResult};
use crate::rule::RuleRef;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Strategy choosing the rules that participate in mixing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum SubpopulationFilter {
    /// Keep every rule
    #[default]
    Identity,
    /// Keep the `rule_amount` rules with the highest fitness
    NBestFitness {
        /// Rules kept
        rule_amount: usize,
    },
    /// Keep `rule_amount` rules drawn uniformly without replacement
    NRandom {
        /// Rules kept
        rule_amount: usize,
    },
    /// Keep `rule_amount` rules drawn without replacement, proportional to fitness
    RouletteWheel {
        /// Rules kept
        rule_amount: usize,
    },
}

impl SubpopulationFilter {
    /// Apply the filter
    pub fn apply<'a>(
        &self,
        subpopulation: &[RuleRef<'a>],
        rng: &mut StdRng,
    ) -> CompositionResult<Vec<RuleRef<'a>>> {
        match *self {
            SubpopulationFilter::Identity => Ok(subpopulation.to_vec()),
            SubpopulationFilter::NBestFitness { rule_amount } => {
                Ok(n_best(subpopulation, rule_amount))
            }
            SubpopulationFilter::NRandom { rule_amount } => {
                let amount = rule_amount.min(subpopulation.len());
                Ok(rand::seq::index::sample(rng, subpopulation.len(), amount)
                    .into_iter()
                    .map(|i| subpopulation[i])
                    .collect())
            }
            SubpopulationFilter::RouletteWheel { rule_amount } => {
                roulette_wheel(subpopulation, rule_amount, rng)
            }
        }
    }
}

fn n_best<'a>(subpopulation: &[RuleRef<'a>], rule_amount: usize) -> Vec<RuleRef<'a>> {
    let mut order: Vec<usize> = (0..subpopulation.len()).collect();
    // stable ascending sort, the best rules end up at the tail
    order.sort_by(|&a, &b| {
        subpopulation[a]
            .fitness()
            .partial_cmp(&subpopulation[b].fitness())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let start = order.len().saturating_sub(rule_amount);
    order[start..].iter().map(|&i| subpopulation[i]).collect()
}

fn roulette_wheel<'a>(
    subpopulation: &[RuleRef<'a>],
    rule_amount: usize,
    rng: &mut StdRng,
) -> CompositionResult<Vec<RuleRef<'a>>> {
    if subpopulation.is_empty() {
        return Ok(Vec::new());
    }

    let fitnesses: Vec<f64> = subpopulation.iter().map(|r| r.fitness()).collect();
    if let Some(bad) = fitnesses.iter().find(|f| !(**f >= 0.0) || !f.is_finite()) {
        return Err(CompositionError::InvalidWeights {
            reason: format!("roulette wheel needs finite non-negative fitness, got {}", bad),
        });
    }
    if fitnesses.iter().sum::<f64>() <= 0.0 {
        return Err(CompositionError::InvalidWeights {
            reason: "roulette wheel fitness sums to zero".to_string(),
        });
    }

    // zero-weight rules can never be drawn
    let mut remaining: Vec<usize> = (0..subpopulation.len())
        .filter(|&i| fitnesses[i] > 0.0)
        .collect();
    let amount = rule_amount.min(subpopulation.len());
    let mut chosen = Vec::with_capacity(amount);

    while chosen.len() < amount && !remaining.is_empty() {
        let dist = WeightedIndex::new(remaining.iter().map(|&i| fitnesses[i])).map_err(|e| {
            CompositionError::InvalidWeights {
                reason: format!("roulette wheel distribution: {}", e),
            }
        })?;
        let pick = remaining.swap_remove(dist.sample(rng));
        chosen.push(subpopulation[pick]);
    }

    Ok(chosen)
}
