//! Pareto dominance and the elitist archive of non-dominated solutions

use crate::error::{CompositionError, CompositionResult};
use crate::solution::Genotype;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Whether `a` Pareto-dominates `b` (all objectives maximised)
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b) {
        if x < y {
            return false;
        }
        if x > y {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Indices of the rows no other row dominates
pub fn non_dominated_indices(objectives: &[&[f64]]) -> Vec<usize> {
    (0..objectives.len())
        .filter(|&i| {
            !objectives
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && dominates(other, objectives[i]))
        })
        .collect()
}

/// A solution kept by the archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedSolution<S> {
    /// Unique identifier
    pub id: String,
    /// Generation the solution entered the archive
    pub generation: u32,
    /// The solution, always fitted
    pub solution: S,
}

/// Archive holding the non-dominated solutions seen so far
///
/// No member dominates another, and no two members share an objective vector.
#[derive(Debug, Clone)]
pub struct ElitistArchive<S> {
    members: Vec<ArchivedSolution<S>>,
}

impl<S> Default for ElitistArchive<S> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
        }
    }
}

impl<S: Genotype> ElitistArchive<S> {
    /// Create an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of archived solutions
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing has been archived yet
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Archived entries in insertion order
    pub fn entries(&self) -> &[ArchivedSolution<S>] {
        &self.members
    }

    /// Archived solutions in insertion order
    pub fn solutions(&self) -> Vec<S> {
        self.members.iter().map(|m| m.solution.clone()).collect()
    }

    /// Offer `candidate`; returns whether it was admitted
    ///
    /// Members the candidate dominates are evicted.
    pub fn offer(&mut self, candidate: &S, generation: u32) -> CompositionResult<bool> {
        let objectives = candidate
            .fitted()
            .ok_or(CompositionError::NotFitted)?
            .fitness
            .objectives()
            .to_vec();

        for member in &self.members {
            let existing = member_objectives(member);
            if existing == objectives.as_slice() || dominates(existing, &objectives) {
                return Ok(false);
            }
        }

        self.members
            .retain(|member| !dominates(&objectives, member_objectives(member)));
        self.members.push(ArchivedSolution {
            id: format!("solution_{}", uuid::Uuid::new_v4()),
            generation,
            solution: candidate.clone(),
        });
        Ok(true)
    }

    /// Offer every candidate; returns how many were admitted
    pub fn update<'a, I>(&mut self, candidates: I, generation: u32) -> CompositionResult<usize>
    where
        I: IntoIterator<Item = &'a S>,
        S: 'a,
    {
        let mut admitted = 0;
        for candidate in candidates {
            if self.offer(candidate, generation)? {
                admitted += 1;
            }
        }
        Ok(admitted)
    }

    /// `(N x M)` matrix of the members' objectives
    pub fn objective_matrix(&self) -> CompositionResult<Array2<f64>> {
        objective_matrix(self.members.iter().map(|m| &m.solution))
    }

    /// Replace all members, e.g. after they were padded and refitted
    pub fn rebuild<I>(&mut self, solutions: I, generation: u32) -> CompositionResult<()>
    where
        I: IntoIterator<Item = S>,
    {
        let solutions: Vec<S> = solutions.into_iter().collect();
        self.members.clear();
        self.update(solutions.iter(), generation)?;
        Ok(())
    }
}

fn member_objectives<S: Genotype>(member: &ArchivedSolution<S>) -> &[f64] {
    member
        .solution
        .fitted()
        .map(|state| state.fitness.objectives())
        .unwrap_or(&[])
}

/// Stack the fitted objectives of `solutions` into an `(N x M)` matrix
pub fn objective_matrix<'a, S, I>(solutions: I) -> CompositionResult<Array2<f64>>
where
    S: Genotype + 'a,
    I: IntoIterator<Item = &'a S>,
{
    let rows = solutions
        .into_iter()
        .map(|s| {
            s.fitted()
                .map(|state| state.fitness.objectives().to_vec())
                .ok_or(CompositionError::NotFitted)
        })
        .collect::<CompositionResult<Vec<Vec<f64>>>>()?;

    let n = rows.len();
    let m = rows.first().map_or(0, Vec::len);
    if let Some(bad) = rows.iter().find(|r| r.len() != m) {
        return Err(CompositionError::ShapeMismatch {
            context: "objective vector",
            expected: m,
            actual: bad.len(),
        });
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n, m), flat).map_err(|_| CompositionError::ShapeMismatch {
        context: "objective matrix",
        expected: n * m,
        actual: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::{Fitness, FitnessInput, SolutionFitness};
    use crate::genome::Genome;
    use crate::mixing::ErrorExperienceHeuristic;
    use crate::rule::{IntervalRule, RulePool};
    use crate::solution::Solution;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    /// Objectives read straight off the genome: (selected count, unselected count)
    #[derive(Debug)]
    struct CountObjectives;

    impl SolutionFitness for CountObjectives {
        fn evaluate(&self, input: &FitnessInput) -> Fitness {
            let ones = input.complexity as f64;
            Fitness::Objectives(vec![ones, input.input_size as f64 - ones - input.error])
        }
    }

    /// Both objectives equal the selected count
    #[derive(Debug)]
    struct Diagonal;

    impl SolutionFitness for Diagonal {
        fn evaluate(&self, input: &FitnessInput) -> Fitness {
            let ones = input.complexity as f64;
            Fitness::Objectives(vec![ones, ones])
        }
    }

    fn fitted_with(bits: Vec<bool>, fitness: Arc<dyn SolutionFitness>) -> Solution {
        let mut pool = RulePool::from_rules(
            (0..bits.len())
                .map(|_| {
                    IntervalRule::constant(array![0.0], array![1.0], 1.0)
                        .unwrap()
                        .with_error(1.0)
                        .with_experience(1.0)
                })
                .collect(),
        );
        let x = array![[0.5]];
        pool.refresh(x.view());
        let mut s = Solution::new(
            Genome::new(bits),
            Arc::new(ErrorExperienceHeuristic::default()),
            fitness,
        );
        let mut rng = StdRng::seed_from_u64(0);
        s.fit(&pool, x.view(), array![1.0].view(), &mut rng).unwrap();
        s
    }

    fn fitted(bits: Vec<bool>) -> Solution {
        fitted_with(bits, Arc::new(CountObjectives))
    }

    #[test]
    fn test_dominates() {
        assert!(dominates(&[2.0, 2.0], &[1.0, 2.0]));
        assert!(!dominates(&[2.0, 2.0], &[2.0, 2.0]));
        assert!(!dominates(&[2.0, 1.0], &[1.0, 2.0]));
    }

    #[test]
    fn test_non_dominated_indices() {
        let rows: Vec<&[f64]> = vec![&[1.0, 3.0], &[2.0, 2.0], &[1.0, 1.0], &[3.0, 0.0]];
        assert_eq!(non_dominated_indices(&rows), vec![0, 1, 3]);
    }

    #[test]
    fn test_archive_keeps_only_non_dominated() {
        let mut archive = ElitistArchive::new();
        // objectives (ones, zeros - error)
        let a = fitted(vec![true, false, false, false]);
        let b = fitted(vec![true, true, false, false]);
        let c = fitted(vec![true, true, true, false]);
        let admitted = archive.update([&a, &b, &c], 0).unwrap();
        assert_eq!(admitted, 3);
        assert_eq!(archive.len(), 3);

        // same objectives as `b`
        assert!(!archive.offer(&fitted(vec![false, true, true, false]), 1).unwrap());

        let matrix = archive.objective_matrix().unwrap();
        for i in 0..matrix.nrows() {
            for j in 0..matrix.nrows() {
                if i != j {
                    let (ri, rj) = (matrix.row(i), matrix.row(j));
                    assert!(!dominates(ri.as_slice().unwrap(), rj.as_slice().unwrap()));
                }
            }
        }
    }

    #[test]
    fn test_dominating_candidate_evicts_members() {
        let mut archive = ElitistArchive::new();
        archive
            .offer(&fitted_with(vec![true, false, false], Arc::new(Diagonal)), 0)
            .unwrap();
        assert!(!archive
            .offer(&fitted_with(vec![false, false, false], Arc::new(Diagonal)), 0)
            .unwrap());

        let strong = fitted_with(vec![true, true, false], Arc::new(Diagonal));
        assert!(archive.offer(&strong, 1).unwrap());
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.entries()[0].generation, 1);
        assert_eq!(archive.entries()[0].solution.genome(), strong.genome());
    }

    #[test]
    fn test_unfitted_candidate_is_rejected() {
        let mut archive = ElitistArchive::new();
        let unfitted = fitted(vec![true]).with_genome(Genome::new(vec![true]));
        assert!(matches!(
            archive.offer(&unfitted, 0),
            Err(CompositionError::NotFitted)
        ));
    }
}
