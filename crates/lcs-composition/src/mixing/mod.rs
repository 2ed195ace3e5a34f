//! Mixing models turning a rule subpopulation into one ensemble prediction

mod experience;
mod filter;

pub use experience::ExperienceCalculation;
pub use filter::SubpopulationFilter;

use crate::error::{CompositionError, CompositionResult};
use crate::rule::{matched_rows, RuleRef};
use ndarray::{Array1, ArrayView2, Axis};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Combines the local predictions of a subpopulation
///
/// Implementations keep no per-call state, so one instance can be shared by
/// parallel evaluations.
pub trait MixingModel: Debug + Send + Sync {
    /// One prediction per row of `x`
    ///
    /// With `cache` set, each rule's match set and prediction from its last
    /// matching pass are reused instead of being recomputed.
    fn mix(
        &self,
        x: ArrayView2<'_, f64>,
        subpopulation: &[RuleRef<'_>],
        cache: bool,
        rng: &mut StdRng,
    ) -> CompositionResult<Array1<f64>>;
}

/// Inverse-error, experience-weighted mixing
///
/// Every rule gets the weight `tau = experience_weight * experience / error`.
/// A row's prediction is the tau-weighted mean over the rules matching it, and
/// rows no rule matches predict 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorExperienceHeuristic {
    /// Bounds which rules take part
    pub filter: SubpopulationFilter,
    /// Experience transform
    pub experience: ExperienceCalculation,
    /// Multiplier on the transformed experience
    pub experience_weight: f64,
}

impl Default for ErrorExperienceHeuristic {
    fn default() -> Self {
        Self {
            filter: SubpopulationFilter::Identity,
            experience: ExperienceCalculation::Identity,
            experience_weight: 1.0,
        }
    }
}

impl ErrorExperienceHeuristic {
    /// Create a heuristic from its parts
    pub fn new(
        filter: SubpopulationFilter,
        experience: ExperienceCalculation,
        experience_weight: f64,
    ) -> Self {
        Self {
            filter,
            experience,
            experience_weight,
        }
    }

    /// Mixing weight of every rule
    pub fn taus(&self, subpopulation: &[RuleRef<'_>], dim: usize) -> Array1<f64> {
        let experiences = self.experience.apply(subpopulation, dim);
        let errors: Array1<f64> = subpopulation.iter().map(|r| r.error()).collect();
        errors.mapv(|e| 1.0 / e) * (experiences * self.experience_weight)
    }

    /// Matched rows and the predictions for them
    fn local_prediction(
        x: ArrayView2<'_, f64>,
        rule: &RuleRef<'_>,
        cache: bool,
    ) -> CompositionResult<(Vec<usize>, Array1<f64>)> {
        if !cache {
            let matched = matched_rows(&rule.matches(x));
            if matched.is_empty() {
                return Ok((matched, Array1::zeros(0)));
            }
            let prediction = rule.predict(x.select(Axis(0), &matched).view());
            return Ok((matched, prediction));
        }

        let match_set = rule
            .match_set()
            .ok_or(CompositionError::MissingCache { index: rule.index })?;
        if match_set.len() != x.nrows() {
            return Err(CompositionError::ShapeMismatch {
                context: "cached match set",
                expected: x.nrows(),
                actual: match_set.len(),
            });
        }
        let matched = matched_rows(match_set);
        let prediction = rule
            .cached_prediction()
            .ok_or(CompositionError::MissingCache { index: rule.index })?;
        if prediction.len() != matched.len() {
            return Err(CompositionError::ShapeMismatch {
                context: "cached prediction",
                expected: matched.len(),
                actual: prediction.len(),
            });
        }
        Ok((matched, prediction.clone()))
    }
}

impl MixingModel for ErrorExperienceHeuristic {
    fn mix(
        &self,
        x: ArrayView2<'_, f64>,
        subpopulation: &[RuleRef<'_>],
        cache: bool,
        rng: &mut StdRng,
    ) -> CompositionResult<Array1<f64>> {
        let input_size = x.nrows();

        if subpopulation.is_empty() {
            return Ok(Array1::zeros(input_size));
        }

        let subpopulation = self.filter.apply(subpopulation, rng)?;
        let taus = self.taus(&subpopulation, x.ncols());

        let mut prediction = Array1::<f64>::zeros(input_size);
        let mut tau_sum = Array1::<f64>::zeros(input_size);
        for (rule, &tau) in subpopulation.iter().zip(taus.iter()) {
            let (matched, local) = Self::local_prediction(x, rule, cache)?;
            for (&row, &value) in matched.iter().zip(local.iter()) {
                prediction[row] += value * tau;
                tau_sum[row] += tau;
            }
        }

        // unmatched rows keep a zero prediction
        tau_sum.mapv_inplace(|s| if s == 0.0 { 1.0 } else { s });
        Ok(prediction / tau_sum)
    }
}
