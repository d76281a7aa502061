use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::collisions::collision_details;
use super::exhaustive::ExhaustiveSolver;
use super::orchestrator::run_many;
use super::problem::ScheduleProblem;
use super::types::{ActivityIndex, Constraints, Cost, RunResult};
use crate::config::SolverConfig;
use crate::error::{Result, ScheduleError};

/// Which solver handles a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Annealing,
    Exhaustive,
    /// Exhaustive when it fits the permutation budget, annealing otherwise.
    Auto,
}

/// Per-request overrides of the base [`SolverConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tuning {
    pub max_iterations: Option<usize>,
    pub initial_temperature: Option<f64>,
    pub cooling_rate: Option<f64>,
    pub run_count: Option<usize>,
    pub exhaustive_threshold: Option<u64>,
    pub seed: Option<u64>,
}

impl Tuning {
    pub fn apply(&self, base: &SolverConfig) -> Result<SolverConfig> {
        let config = SolverConfig {
            max_iterations: self.max_iterations.unwrap_or(base.max_iterations),
            initial_temperature: self.initial_temperature.unwrap_or(base.initial_temperature),
            cooling_rate: self.cooling_rate.unwrap_or(base.cooling_rate),
            run_count: self.run_count.unwrap_or(base.run_count),
            exhaustive_threshold: self.exhaustive_threshold.unwrap_or(base.exhaustive_threshold),
            random_seed: self.seed.or(base.random_seed),
            parallel: base.parallel,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Everything an adapter hands to the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub participants: HashMap<String, Vec<String>>,
    #[serde(flatten)]
    pub constraints: Constraints,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub allow_large_exhaustive: bool,
    #[serde(flatten)]
    pub tuning: Tuning,
}

impl SolveRequest {
    pub fn new(activities: Vec<String>, participants: HashMap<String, Vec<String>>) -> Self {
        Self {
            activities,
            participants,
            ..Default::default()
        }
    }
}

/// What comes back from [`plan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum SolveOutcome {
    Annealing {
        results: Vec<RunResult>,
    },
    #[serde(rename_all = "camelCase")]
    Exhaustive {
        min_cost: Cost,
        permutations_checked: u64,
        schedules: Vec<RunResult>,
    },
}

/// Validates the request, picks a solver and runs it.
///
/// Nothing is searched unless every name and constraint checks out.
pub fn plan(request: &SolveRequest, base: &SolverConfig) -> Result<SolveOutcome> {
    let config = request.tuning.apply(base)?;
    let index = ActivityIndex::new(&request.activities, &request.participants)?;
    let problem = ScheduleProblem::new(index, &request.constraints)?;

    let exhaustive = ExhaustiveSolver::new(&problem).with_threshold(config.exhaustive_threshold);
    match request.strategy {
        Strategy::Annealing => annealing(&problem, &config),
        Strategy::Exhaustive if exhaustive.within_budget() || request.allow_large_exhaustive => {
            Ok(exhaustive_outcome(&problem, &exhaustive))
        }
        Strategy::Exhaustive => Err(ScheduleError::ExhaustionBudgetExceeded {
            free_activities: exhaustive.free_count(),
            threshold: exhaustive.threshold(),
        }),
        Strategy::Auto if exhaustive.within_budget() => {
            info!(
                free_activities = exhaustive.free_count(),
                "search space fits the budget, running exhaustive search"
            );
            Ok(exhaustive_outcome(&problem, &exhaustive))
        }
        Strategy::Auto => {
            warn!(
                free_activities = exhaustive.free_count(),
                threshold = exhaustive.threshold(),
                "search space too large for exhaustive search, falling back to annealing"
            );
            annealing(&problem, &config)
        }
    }
}

fn annealing(problem: &ScheduleProblem, config: &SolverConfig) -> Result<SolveOutcome> {
    Ok(SolveOutcome::Annealing {
        results: run_many(problem, config)?,
    })
}

fn exhaustive_outcome(problem: &ScheduleProblem, solver: &ExhaustiveSolver<'_>) -> SolveOutcome {
    let result = solver.solve_unbounded();
    let index = problem.index();
    let schedules = result
        .schedules
        .iter()
        .map(|schedule| RunResult {
            schedule: index.names_of(schedule),
            cost: result.min_cost,
            collisions: collision_details(schedule, index),
        })
        .collect();
    SolveOutcome::Exhaustive {
        min_cost: result.min_cost,
        permutations_checked: result.permutations_checked,
        schedules,
    }
}
