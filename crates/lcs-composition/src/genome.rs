//! Bit-string genomes selecting rules from the pool

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Boolean selection mask over the rule pool
///
/// Bit `i` is set when rule `i` of the pool participates in the ensemble.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Genome {
    bits: Vec<bool>,
}

impl Genome {
    /// Wrap an existing bit vector
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// All-zero genome of length `n`
    pub fn zeros(n: usize) -> Self {
        Self {
            bits: vec![false; n],
        }
    }

    /// Random genome of length `n` where each bit is set with probability `p`
    pub fn random<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> Self {
        Self {
            bits: (0..n).map(|_| rng.gen::<f64>() <= p).collect(),
        }
    }

    /// Number of bits
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the genome has no bits at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Population count, i.e. the number of selected rules
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Raw bits
    #[inline]
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Mutable raw bits
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [bool] {
        &mut self.bits
    }

    /// Indices of the selected rules, ascending
    pub fn selected(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
            .collect()
    }

    /// Append `k` unselected bits for rules added to the pool since creation
    pub fn pad(&mut self, k: usize) {
        self.bits.resize(self.bits.len() + k, false);
    }

    /// `self[..index] ++ other[index..]`
    ///
    /// Callers guarantee equal lengths.
    pub(crate) fn splice(&self, other: &Genome, index: usize) -> Genome {
        let index = index.min(self.bits.len());
        let mut bits = Vec::with_capacity(self.bits.len());
        bits.extend_from_slice(&self.bits[..index]);
        bits.extend_from_slice(&other.bits[index..]);
        Genome { bits }
    }

    /// Number of positions where the two genomes differ
    ///
    /// Positions past the shorter genome count as differences.
    pub fn hamming_distance(&self, other: &Genome) -> usize {
        let common = self.len().min(other.len());
        let differing = self.bits[..common]
            .iter()
            .zip(&other.bits[..common])
            .filter(|(a, b)| a != b)
            .count();
        differing + self.len().max(other.len()) - common
    }
}

impl From<Vec<bool>> for Genome {
    fn from(bits: Vec<bool>) -> Self {
        Self::new(bits)
    }
}

impl Index<usize> for Genome {
    type Output = bool;

    fn index(&self, index: usize) -> &bool {
        &self.bits[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_extremes() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(Genome::random(32, 1.0, &mut rng).count_ones(), 32);
        assert_eq!(Genome::random(32, -1.0, &mut rng).count_ones(), 0);
    }

    #[test]
    fn test_pad_appends_zeros() {
        let mut genome = Genome::new(vec![true, true]);
        genome.pad(3);
        assert_eq!(genome.as_slice(), &[true, true, false, false, false]);
        assert_eq!(genome.count_ones(), 2);
    }

    #[test]
    fn test_selected_indices() {
        let genome = Genome::new(vec![false, true, false, true]);
        assert_eq!(genome.selected(), vec![1, 3]);
    }

    #[test]
    fn test_splice() {
        let a = Genome::new(vec![true; 4]);
        let b = Genome::zeros(4);
        assert_eq!(a.splice(&b, 1).as_slice(), &[true, false, false, false]);
        assert_eq!(a.splice(&b, 0), b);
        assert_eq!(a.splice(&b, 4), a);
    }

    #[test]
    fn test_hamming_distance() {
        let a = Genome::new(vec![true, false, true]);
        let b = Genome::new(vec![true, true, true, false]);
        assert_eq!(a.hamming_distance(&b), 2);
        assert_eq!(a.hamming_distance(&a), 0);
    }
}
