//! Compose a solution for a synthetic piecewise regression problem
//!
//! Usage:
//!   compose-demo [--samples N] [--rules N] [--generations N] [--seed N] [-v]
//!   compose-demo --config saga.json

use anyhow::{Context, Result};
use clap::Parser;
use lcs_composition::{
    CompositionConfig, DiversitySolutionSampler, Genotype, IntervalRule, PdfSolutionSampler,
    RulePool, SelfAdaptingGeneticAlgorithm, SolutionComposition, SolutionSampler,
};
use ndarray::{array, Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "compose-demo", version, about = "Solution composition demo")]
struct Cli {
    /// Training samples
    #[arg(long, default_value_t = 200)]
    samples: usize,

    /// Randomly generated interval rules in the pool
    #[arg(long, default_value_t = 48)]
    rules: usize,

    /// Generations (ignored with --config)
    #[arg(long, default_value_t = 64)]
    generations: u32,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// JSON optimizer configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Piecewise target: a step, a ramp and a plateau
fn target(v: f64) -> f64 {
    if v < 0.3 {
        -1.0
    } else if v < 0.7 {
        5.0 * (v - 0.3)
    } else {
        2.0
    }
}

fn dataset(samples: usize, rng: &mut StdRng) -> Result<(Array2<f64>, Array1<f64>)> {
    let noise = Normal::new(0.0, 0.05).context("noise distribution")?;
    let x = Array2::from_shape_fn((samples, 1), |_| rng.gen::<f64>());
    let y = x.column(0).mapv(|v| target(v) + noise.sample(&mut *rng));
    Ok((x, y))
}

fn rule_pool(
    rules: usize,
    x: &Array2<f64>,
    y: &Array1<f64>,
    rng: &mut StdRng,
) -> Result<RulePool<IntervalRule>> {
    let mut pool = RulePool::new();
    for _ in 0..rules {
        let a: f64 = rng.gen();
        let b: f64 = rng.gen();
        let (lower, upper) = (a.min(b), a.max(b));
        let center = 0.5 * (lower + upper);
        let mut rule = IntervalRule::constant(array![lower], array![upper], target(center))?;
        rule.evaluate(x.view(), y.view())?;
        pool.push(rule);
    }
    pool.refresh(x.view());
    Ok(pool)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    lcs_composition::init()?;

    let config = match cli.config {
        Some(ref path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            CompositionConfig::from_json(&json)?
        }
        None => CompositionConfig::builder()
            .generations(cli.generations)
            .seed(cli.seed)
            .build()?,
    };

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let (x, y) = dataset(cli.samples, &mut rng)?;
    let pool = rule_pool(cli.rules, &x, &y, &mut rng)?;
    info!(samples = cli.samples, rules = pool.len(), "Built training problem");

    let mut saga = SelfAdaptingGeneticAlgorithm::new(config)?;
    let best = saga.optimize(&pool, x.view(), y.view())?;
    let state = best.fitted_state()?;
    println!(
        "best: error={:.4} complexity={} fitness={:.4} rules={:?}",
        state.error,
        state.complexity,
        state.fitness.total(),
        best.genome().selected()
    );

    let front = saga.pareto_front();
    println!("elitist archive ({} solutions):", front.len());
    for solution in &front {
        let state = solution.fitted_state()?;
        println!(
            "  error={:.4} complexity={} crossover_rate={:.3} mutation_rate={:.4}",
            state.error,
            state.complexity,
            solution.crossover_rate(),
            solution.mutation_rate()
        );
    }

    let diverse = saga.sample_front(&DiversitySolutionSampler)?;
    println!(
        "diversity sample: complexity={}",
        diverse.fitted_state()?.complexity
    );

    let beta = PdfSolutionSampler::beta(2.0, 2.0, false);
    let picked = beta.sample(&front, &mut rng)?;
    println!(
        "beta(2, 2) sample: complexity={}",
        picked.fitted_state()?.complexity
    );

    Ok(())
}
