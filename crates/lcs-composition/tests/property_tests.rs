//! Property tests for operators, mixing and crowding distance

use lcs_composition::{
    crowding_distances, Crossover, ErrorExperienceHeuristic, FitnessKind, Genome, Genotype,
    IntervalRule, MixingModel, RulePool, SelfAdaptiveSolution, SubpopulationFilter,
};
use ndarray::{array, Array2};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

fn solution(bits: Vec<bool>) -> SelfAdaptiveSolution {
    SelfAdaptiveSolution::new(
        Genome::new(bits),
        Arc::new(ErrorExperienceHeuristic::default()),
        Arc::new(FitnessKind::default()),
    )
}

fn crossover_strategy() -> impl Strategy<Value = Crossover> {
    prop_oneof![
        (0usize..8).prop_map(|n| Crossover::NPoint { n }),
        Just(Crossover::Uniform),
    ]
}

proptest! {
    #[test]
    fn prop_crossover_preserves_length_and_parent_bits(
        pair in prop::collection::vec(any::<(bool, bool)>(), 0..64),
        op in crossover_strategy(),
        rate in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let (a_bits, b_bits): (Vec<bool>, Vec<bool>) = pair.into_iter().unzip();
        let a = solution(a_bits.clone());
        let b = solution(b_bits.clone());
        let mut rng = StdRng::seed_from_u64(seed);

        let child = op.apply(&a, &b, rate, &mut rng).unwrap();
        prop_assert_eq!(child.genome().len(), a_bits.len());
        for (i, &bit) in child.genome().as_slice().iter().enumerate() {
            prop_assert!(bit == a_bits[i] || bit == b_bits[i]);
        }
    }

    #[test]
    fn prop_mixing_output_is_finite(
        rules in prop::collection::vec(
            (0.0f64..1.0, 0.0f64..1.0, -10.0f64..10.0, 1e-4f64..5.0, 0.0f64..50.0),
            0..12,
        ),
        rows in prop::collection::vec(0.0f64..1.0, 1..20),
    ) {
        let mut pool = RulePool::new();
        for (a, b, value, error, experience) in rules {
            pool.push(
                IntervalRule::constant(array![a.min(b)], array![a.max(b)], value)
                    .unwrap()
                    .with_error(error)
                    .with_experience(experience),
            );
        }
        let n = rows.len();
        let x = Array2::from_shape_vec((n, 1), rows).unwrap();
        pool.refresh(x.view());

        let subpopulation = pool.subpopulation(&Genome::new(vec![true; pool.len()])).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let prediction = ErrorExperienceHeuristic::default()
            .mix(x.view(), &subpopulation, true, &mut rng)
            .unwrap();
        prop_assert_eq!(prediction.len(), n);
        prop_assert!(prediction.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn prop_filters_never_exceed_rule_amount(
        fitness in prop::collection::vec(0.01f64..10.0, 0..16),
        amount in 0usize..20,
        seed in any::<u64>(),
    ) {
        let pool = RulePool::from_rules(
            fitness
                .iter()
                .map(|&f| {
                    IntervalRule::constant(array![0.0], array![1.0], 0.0)
                        .unwrap()
                        .with_fitness(f)
                })
                .collect(),
        );
        let subpopulation = pool.subpopulation(&Genome::new(vec![true; pool.len()])).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        for filter in [
            SubpopulationFilter::NBestFitness { rule_amount: amount },
            SubpopulationFilter::NRandom { rule_amount: amount },
            SubpopulationFilter::RouletteWheel { rule_amount: amount },
        ] {
            let selected = filter.apply(&subpopulation, &mut rng).unwrap();
            prop_assert_eq!(selected.len(), amount.min(fitness.len()));
            let mut indices: Vec<usize> = selected.iter().map(|r| r.index).collect();
            indices.sort_unstable();
            indices.dedup();
            prop_assert_eq!(indices.len(), selected.len());
        }
    }

    #[test]
    fn prop_tiny_fronts_have_unit_crowding(
        front in prop::collection::vec(prop::collection::vec(-5.0f64..5.0, 3), 0..=2)
    ) {
        let n = front.len();
        let matrix = Array2::from_shape_vec((n, 3), front.into_iter().flatten().collect()).unwrap();
        prop_assert!(crowding_distances(matrix.view()).iter().all(|&d| d == 1.0));
    }
}
