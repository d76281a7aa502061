use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::info;

use super::annealing::anneal;
use super::collisions::collision_details;
use super::problem::ScheduleProblem;
use super::types::RunResult;
use crate::config::SolverConfig;
use crate::error::Result;

/// One seed per run, drawn from the master stream.
fn run_seeds(config: &SolverConfig) -> Vec<u64> {
    let mut master = match config.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    (0..config.run_count).map(|_| master.gen()).collect()
}

/// Runs the annealer `config.run_count` times and returns every result.
///
/// Runs are neither ranked nor deduplicated. Each one gets its own `StdRng`
/// seeded from a master stream, so a seeded config gives the same results
/// whether the runs go sequentially or on the rayon pool.
pub fn run_many(problem: &ScheduleProblem, config: &SolverConfig) -> Result<Vec<RunResult>> {
    let seeds = run_seeds(config);

    info!(
        runs = config.run_count,
        activities = problem.len(),
        parallel = config.parallel,
        "starting annealing runs"
    );

    let single = |seed: u64| -> Result<RunResult> {
        let mut rng = StdRng::seed_from_u64(seed);
        let outcome = anneal(problem, config, &mut rng)?;
        Ok(RunResult {
            collisions: collision_details(&outcome.schedule, problem.index()),
            schedule: problem.index().names_of(&outcome.schedule),
            cost: outcome.cost,
        })
    };

    let results: Vec<RunResult> = if config.parallel {
        seeds.into_par_iter().map(single).collect::<Result<_>>()?
    } else {
        seeds.into_iter().map(single).collect::<Result<_>>()?
    };

    for (run, result) in results.iter().enumerate() {
        info!(run = run + 1, cost = result.cost, "annealing run result");
    }
    Ok(results)
}
