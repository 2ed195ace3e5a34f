//! Rules and the append-only rule pool
//!
//! Rule discovery lives outside this crate. The composition core only needs
//! the read-side contract in [`Rule`]: a match predicate, a local predictor,
//! the accumulated error and experience, and the cached result of the last
//! matching pass. [`IntervalRule`] is a small concrete rule used by the demo,
//! benchmarks and tests.

use crate::error::{CompositionError, CompositionResult};
use crate::genome::Genome;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::ops::Deref;

/// Lower bound applied to every mean-squared error in the crate
pub const ERROR_FLOOR: f64 = 1e-4;

/// Read-side contract of a rule
pub trait Rule: Debug + Send + Sync {
    /// Boolean mask over the rows of `x` that fall inside the rule's region
    fn matches(&self, x: ArrayView2<'_, f64>) -> Array1<bool>;

    /// Local prediction for every row of `x` (callers pass matched rows only)
    fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64>;

    /// Accumulated prediction error
    fn error(&self) -> f64;

    /// Training exposure
    fn experience(&self) -> f64;

    /// Rule fitness as assigned by rule discovery
    fn fitness(&self) -> f64;

    /// Match mask recorded by the last matching pass
    fn match_set(&self) -> Option<&Array1<bool>>;

    /// Predictions for the matched rows of the last matching pass
    fn cached_prediction(&self) -> Option<&Array1<f64>>;

    /// Matching pass: recompute and cache the match mask and local predictions
    fn refresh(&mut self, x: ArrayView2<'_, f64>);
}

/// A rule borrowed from the pool together with its pool index
#[derive(Debug, Clone, Copy)]
pub struct RuleRef<'a> {
    /// Position of the rule in the pool
    pub index: usize,
    /// The rule itself
    pub rule: &'a dyn Rule,
}

impl<'a> Deref for RuleRef<'a> {
    type Target = dyn Rule + 'a;

    fn deref(&self) -> &Self::Target {
        self.rule
    }
}

/// Linear local model `intercept + coef · x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// Constant term
    pub intercept: f64,
    /// One coefficient per feature
    pub coef: Array1<f64>,
}

impl LinearModel {
    /// Model predicting `value` everywhere
    pub fn constant(value: f64, dim: usize) -> Self {
        Self {
            intercept: value,
            coef: Array1::zeros(dim),
        }
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.dot(&self.coef) + self.intercept
    }
}

#[derive(Debug, Clone)]
struct MatchCache {
    match_set: Array1<bool>,
    prediction: Array1<f64>,
}

/// Hyper-rectangle rule with a linear local model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalRule {
    lower: Array1<f64>,
    upper: Array1<f64>,
    model: LinearModel,
    error: f64,
    experience: f64,
    fitness: f64,
    #[serde(skip)]
    cache: Option<MatchCache>,
}

impl IntervalRule {
    /// Create a rule covering `[lower, upper]` in every dimension
    pub fn new(
        lower: Array1<f64>,
        upper: Array1<f64>,
        model: LinearModel,
    ) -> CompositionResult<Self> {
        if lower.len() != upper.len() {
            return Err(CompositionError::ShapeMismatch {
                context: "rule bounds",
                expected: lower.len(),
                actual: upper.len(),
            });
        }
        if model.coef.len() != lower.len() {
            return Err(CompositionError::ShapeMismatch {
                context: "rule coefficients",
                expected: lower.len(),
                actual: model.coef.len(),
            });
        }

        Ok(Self {
            lower,
            upper,
            model,
            error: f64::INFINITY,
            experience: 0.0,
            fitness: 0.0,
            cache: None,
        })
    }

    /// Rule predicting a constant `value` inside its bounds
    pub fn constant(
        lower: Array1<f64>,
        upper: Array1<f64>,
        value: f64,
    ) -> CompositionResult<Self> {
        let dim = lower.len();
        Self::new(lower, upper, LinearModel::constant(value, dim))
    }

    /// Set the accumulated error
    pub fn with_error(mut self, error: f64) -> Self {
        self.error = error;
        self
    }

    /// Set the experience
    pub fn with_experience(mut self, experience: f64) -> Self {
        self.experience = experience;
        self
    }

    /// Set the rule fitness
    pub fn with_fitness(mut self, fitness: f64) -> Self {
        self.fitness = fitness;
        self
    }

    /// Lower bounds
    pub fn lower(&self) -> ArrayView1<'_, f64> {
        self.lower.view()
    }

    /// Upper bounds
    pub fn upper(&self) -> ArrayView1<'_, f64> {
        self.upper.view()
    }

    /// Run a matching pass on `(x, y)` and derive experience and error from it
    ///
    /// Experience is the number of matched rows. The error is the floored
    /// mean-squared error over those rows, or infinity when nothing matched.
    pub fn evaluate(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> CompositionResult<()> {
        if x.nrows() != y.len() {
            return Err(CompositionError::ShapeMismatch {
                context: "rule evaluation targets",
                expected: x.nrows(),
                actual: y.len(),
            });
        }

        self.refresh(x);
        let Some(cache) = self.cache.as_ref() else {
            return Ok(());
        };

        let matched: Vec<usize> = matched_rows(&cache.match_set);
        self.experience = matched.len() as f64;
        self.error = if matched.is_empty() {
            f64::INFINITY
        } else {
            let targets = y.select(Axis(0), &matched);
            let mse = (&cache.prediction - &targets).mapv(|d| d * d).mean().unwrap_or(0.0);
            mse.max(ERROR_FLOOR)
        };

        Ok(())
    }
}

impl Rule for IntervalRule {
    fn matches(&self, x: ArrayView2<'_, f64>) -> Array1<bool> {
        x.outer_iter()
            .map(|row| {
                row.iter()
                    .zip(self.lower.iter().zip(self.upper.iter()))
                    .all(|(&v, (&lo, &hi))| lo <= v && v <= hi)
            })
            .collect()
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        self.model.predict(x)
    }

    fn error(&self) -> f64 {
        self.error
    }

    fn experience(&self) -> f64 {
        self.experience
    }

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn match_set(&self) -> Option<&Array1<bool>> {
        self.cache.as_ref().map(|c| &c.match_set)
    }

    fn cached_prediction(&self) -> Option<&Array1<f64>> {
        self.cache.as_ref().map(|c| &c.prediction)
    }

    fn refresh(&mut self, x: ArrayView2<'_, f64>) {
        let match_set = self.matches(x);
        let matched = matched_rows(&match_set);
        let prediction = if matched.is_empty() {
            Array1::zeros(0)
        } else {
            self.predict(x.select(Axis(0), &matched).view())
        };
        self.cache = Some(MatchCache {
            match_set,
            prediction,
        });
    }
}

/// Row indices set in a match mask
pub(crate) fn matched_rows(mask: &Array1<bool>) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &m)| m.then_some(i))
        .collect()
}

/// Append-only arena owning every discovered rule
///
/// Solutions refer to rules by position only, so growing the pool never
/// invalidates them; their genomes merely need padding.
#[derive(Debug, Clone)]
pub struct RulePool<R> {
    rules: Vec<R>,
}

impl<R: Rule> RulePool<R> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a pool from existing rules
    pub fn from_rules(rules: Vec<R>) -> Self {
        Self { rules }
    }

    /// Append a rule and return its index
    pub fn push(&mut self, rule: R) -> usize {
        self.rules.push(rule);
        self.rules.len() - 1
    }

    /// Append several rules
    pub fn extend<I: IntoIterator<Item = R>>(&mut self, rules: I) {
        self.rules.extend(rules);
    }

    /// Number of rules
    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the pool is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule at `index`
    pub fn get(&self, index: usize) -> Option<&R> {
        self.rules.get(index)
    }

    /// All rules in insertion order
    pub fn rules(&self) -> &[R] {
        &self.rules
    }

    /// Run the matching pass over every rule
    pub fn refresh(&mut self, x: ArrayView2<'_, f64>) {
        self.rules.par_iter_mut().for_each(|rule| rule.refresh(x));
    }

    /// Rules selected by `genome`
    pub fn subpopulation(&self, genome: &Genome) -> CompositionResult<Vec<RuleRef<'_>>> {
        genome
            .selected()
            .into_iter()
            .map(|index| {
                self.rules
                    .get(index)
                    .map(|rule| RuleRef {
                        index,
                        rule: rule as &dyn Rule,
                    })
                    .ok_or(CompositionError::RuleOutOfBounds {
                        index,
                        pool: self.rules.len(),
                    })
            })
            .collect()
    }
}

impl<R: Rule> Default for RulePool<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn unit_rule(value: f64) -> IntervalRule {
        IntervalRule::constant(array![0.0], array![1.0], value).unwrap()
    }

    #[test]
    fn test_interval_matching_is_inclusive() {
        let rule = unit_rule(1.0);
        let x = array![[-0.5], [0.0], [0.5], [1.0], [1.5]];
        assert_eq!(
            rule.matches(x.view()),
            array![false, true, true, true, false]
        );
    }

    #[test]
    fn test_linear_prediction() {
        let model = LinearModel {
            intercept: 1.0,
            coef: array![2.0, -1.0],
        };
        let rule = IntervalRule::new(array![0.0, 0.0], array![1.0, 1.0], model).unwrap();
        let x = array![[0.5, 0.5], [1.0, 0.0]];
        assert_eq!(rule.predict(x.view()), array![1.5, 3.0]);
    }

    #[test]
    fn test_bounds_shape_checked() {
        let result = IntervalRule::constant(array![0.0, 0.0], array![1.0], 0.0);
        assert!(matches!(
            result,
            Err(CompositionError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_refresh_caches_matched_predictions() {
        let mut rule = unit_rule(3.0);
        assert!(rule.match_set().is_none());

        let x = array![[0.5], [2.0], [0.25]];
        rule.refresh(x.view());

        assert_eq!(rule.match_set(), Some(&array![true, false, true]));
        assert_eq!(rule.cached_prediction(), Some(&array![3.0, 3.0]));
    }

    #[test]
    fn test_evaluate_sets_experience_and_error() {
        let mut rule = unit_rule(1.0);
        let x = array![[0.1], [0.2], [5.0]];
        let y = array![1.0, 3.0, 100.0];
        rule.evaluate(x.view(), y.view()).unwrap();

        assert_eq!(rule.experience(), 2.0);
        // residuals 0 and 2 over two matched rows
        assert!((rule.error() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_without_matches() {
        let mut rule = unit_rule(1.0);
        let x = array![[3.0]];
        rule.evaluate(x.view(), array![1.0].view()).unwrap();
        assert_eq!(rule.experience(), 0.0);
        assert!(rule.error().is_infinite());
    }

    #[test]
    fn test_evaluate_error_is_floored() {
        let mut rule = unit_rule(1.0);
        let x = array![[0.5]];
        rule.evaluate(x.view(), array![1.0].view()).unwrap();
        assert_eq!(rule.error(), ERROR_FLOOR);
    }

    #[test]
    fn test_pool_is_append_only() {
        let mut pool = RulePool::new();
        assert_eq!(pool.push(unit_rule(1.0)), 0);
        assert_eq!(pool.push(unit_rule(2.0)), 1);
        pool.extend(vec![unit_rule(3.0)]);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.get(2).map(|r| r.predict(array![[0.5]].view())[0]), Some(3.0));
    }

    #[test]
    fn test_subpopulation_follows_genome() {
        let pool = RulePool::from_rules(vec![unit_rule(1.0), unit_rule(2.0), unit_rule(3.0)]);
        let subpopulation = pool
            .subpopulation(&Genome::new(vec![true, false, true]))
            .unwrap();
        let indices: Vec<usize> = subpopulation.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 2]);

        let too_long = Genome::new(vec![false, false, false, true]);
        assert!(matches!(
            pool.subpopulation(&too_long),
            Err(CompositionError::RuleOutOfBounds { index: 3, pool: 3 })
        ));
    }

    #[test]
    fn test_pool_refresh_fills_every_cache() {
        let mut pool = RulePool::from_rules(vec![unit_rule(1.0), unit_rule(2.0)]);
        pool.refresh(array![[0.5], [4.0]].view());
        assert!(pool.rules().iter().all(|r| r.match_set().is_some()));
    }
}
