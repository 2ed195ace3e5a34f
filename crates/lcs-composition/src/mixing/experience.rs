//! Experience transforms applied before mixing weights are computed

use crate::rule::RuleRef;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// How raw rule experience is transformed before weighting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum ExperienceCalculation {
    /// Raw experience values
    #[default]
    Identity,
    /// Clamp into `[lower_bound, upper_bound]`
    Capped {
        /// Smallest experience after clamping
        lower_bound: f64,
        /// Largest experience after clamping
        upper_bound: f64,
    },
    /// Clamp into `[lower_bound * dim, upper_bound * dim]`
    CappedWithDimensionality {
        /// Lower bound per input dimension
        lower_bound: f64,
        /// Upper bound per input dimension
        upper_bound: f64,
    },
}

impl ExperienceCalculation {
    /// Clamp with bounds that leave every value untouched
    pub fn capped_unbounded() -> Self {
        ExperienceCalculation::Capped {
            lower_bound: f64::NEG_INFINITY,
            upper_bound: f64::INFINITY,
        }
    }

    /// Transformed experience for every rule, `dim` being the feature count of the input
    pub fn apply(&self, subpopulation: &[RuleRef<'_>], dim: usize) -> Array1<f64> {
        let experiences: Array1<f64> = subpopulation.iter().map(|r| r.experience()).collect();
        match *self {
            ExperienceCalculation::Identity => experiences,
            ExperienceCalculation::Capped {
                lower_bound,
                upper_bound,
            } => experiences.mapv(|e| clip(e, lower_bound, upper_bound)),
            ExperienceCalculation::CappedWithDimensionality {
                lower_bound,
                upper_bound,
            } => {
                let lower = scale(lower_bound, dim);
                let upper = scale(upper_bound, dim);
                experiences.mapv(|e| clip(e, lower, upper))
            }
        }
    }
}

fn clip(value: f64, lower: f64, upper: f64) -> f64 {
    value.max(lower).min(upper)
}

// infinite bounds stay infinite for dim == 0
fn scale(bound: f64, dim: usize) -> f64 {
    if bound.is_infinite() {
        bound
    } else {
        bound * dim as f64
    }
}
