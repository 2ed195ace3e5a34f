//! Draw one representative solution from a Pareto front

use crate::archive::objective_matrix;
use crate::crowding::crowding_distances;
use crate::error::{CompositionError, CompositionResult};
use crate::solution::Genotype;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Lower end of the placeholder coordinates used without projection
const PLACEHOLDER_LOW: f64 = 0.0001;
/// Upper end of the placeholder coordinates used without projection
const PLACEHOLDER_HIGH: f64 = 1.0 - 0.0001;

/// Density evaluated at one coordinate per front member
pub type DensityFn = Arc<dyn Fn(ArrayView1<'_, f64>) -> Array1<f64> + Send + Sync>;

/// Strategy choosing a member of a Pareto front
pub trait SolutionSampler: fmt::Debug + Send + Sync {
    /// Unnormalized selection weight per row of an `(N x M)` objective matrix
    fn weights(&self, objectives: ArrayView2<'_, f64>) -> CompositionResult<Array1<f64>>;

    /// Draw one member of `front`
    ///
    /// Fails with [`CompositionError::EmptyParetoFront`] before anything else
    /// when `front` is empty. Every member must be fitted.
    fn sample<'a, S: Genotype>(
        &self,
        front: &'a [S],
        rng: &mut StdRng,
    ) -> CompositionResult<&'a S>
    where
        Self: Sized,
    {
        if front.is_empty() {
            return Err(CompositionError::EmptyParetoFront);
        }
        let objectives = objective_matrix(front)?;
        let weights = self.weights(objectives.view())?;
        let index = draw(weights.view(), rng)?;
        Ok(&front[index])
    }
}

fn draw(weights: ArrayView1<'_, f64>, rng: &mut StdRng) -> CompositionResult<usize> {
    if let Some(bad) = weights.iter().find(|w| !w.is_finite()) {
        return Err(CompositionError::InvalidWeights {
            reason: format!("non-finite weight {bad}"),
        });
    }
    let dist = WeightedIndex::new(weights.iter()).map_err(|e| CompositionError::InvalidWeights {
        reason: e.to_string(),
    })?;
    Ok(dist.sample(rng))
}

/// Samples according to a caller-supplied density over a 1-D front coordinate
///
/// With `projected` set the coordinate of a member is its first objective
/// divided by the sum of its objectives; otherwise members get evenly spaced
/// coordinates in `(0, 1)` in front order.
#[derive(Clone)]
pub struct PdfSolutionSampler {
    pdf: DensityFn,
    projected: bool,
}

impl fmt::Debug for PdfSolutionSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfSolutionSampler")
            .field("projected", &self.projected)
            .finish_non_exhaustive()
    }
}

impl PdfSolutionSampler {
    /// Create a sampler from any density
    pub fn new(pdf: DensityFn, projected: bool) -> Self {
        Self { pdf, projected }
    }

    /// Every member equally likely
    pub fn uniform(projected: bool) -> Self {
        Self::new(
            Arc::new(|x: ArrayView1<'_, f64>| Array1::<f64>::ones(x.len())),
            projected,
        )
    }

    /// Beta(a, b) kernel
    pub fn beta(a: f64, b: f64, projected: bool) -> Self {
        Self::new(
            Arc::new(move |x: ArrayView1<'_, f64>| {
                x.mapv(|v| v.powf(a - 1.0) * (1.0 - v).powf(b - 1.0))
            }),
            projected,
        )
    }

    /// Normal(mean, std) kernel
    pub fn normal(mean: f64, std: f64, projected: bool) -> Self {
        Self::new(
            Arc::new(move |x: ArrayView1<'_, f64>| {
                x.mapv(|v| (-0.5 * ((v - mean) / std).powi(2)).exp())
            }),
            projected,
        )
    }

    /// Whether coordinates come from the objectives
    pub fn projected(&self) -> bool {
        self.projected
    }

    /// Coordinate of every front member
    pub fn coordinates(&self, objectives: ArrayView2<'_, f64>) -> Array1<f64> {
        let n = objectives.nrows();
        if !self.projected || objectives.ncols() == 0 {
            return Array1::linspace(PLACEHOLDER_LOW, PLACEHOLDER_HIGH, n);
        }
        let sums = objectives.sum_axis(Axis(1));
        objectives.column(0).to_owned() / sums
    }
}

impl SolutionSampler for PdfSolutionSampler {
    fn weights(&self, objectives: ArrayView2<'_, f64>) -> CompositionResult<Array1<f64>> {
        let points = self.coordinates(objectives);
        let weights = (self.pdf)(points.view());
        if weights.len() != points.len() {
            return Err(CompositionError::ShapeMismatch {
                context: "density output",
                expected: points.len(),
                actual: weights.len(),
            });
        }
        Ok(weights)
    }
}

/// Weight of a boundary member relative to the largest interior crowding distance
const BOUNDARY_FACTOR: f64 = 2.0;

/// Favors members in sparsely populated regions of the front
///
/// Weights are crowding distances. Boundary members have an infinite
/// distance and are weighted at twice the largest finite one, so they stay
/// the most likely picks while interior members keep weights proportional
/// to their crowding.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiversitySolutionSampler;

impl SolutionSampler for DiversitySolutionSampler {
    fn weights(&self, objectives: ArrayView2<'_, f64>) -> CompositionResult<Array1<f64>> {
        let distances = crowding_distances(objectives);
        let has_boundary = distances.iter().any(|d| d.is_infinite());
        let max_finite = distances
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(0.0, f64::max);
        if !has_boundary && max_finite <= 0.0 {
            warn!(
                members = distances.len(),
                "front has no spread in any objective, sampling uniformly"
            );
            return Ok(Array1::ones(distances.len()));
        }
        let boundary = if max_finite > 0.0 {
            max_finite * BOUNDARY_FACTOR
        } else {
            1.0
        };
        Ok(distances.mapv(|d| if d.is_infinite() { boundary } else { d }))
    }
}
