use tracing::{debug, info};

use super::problem::ScheduleProblem;
use super::types::Cost;
use crate::error::{Result, ScheduleError};

/// Default permutation budget before the caller has to opt in.
pub const DEFAULT_EXHAUSTIVE_THRESHOLD: u64 = 1_000_000;

const PROGRESS_INTERVAL: u64 = 100_000;

/// Every schedule tied for the lowest cost.
#[derive(Debug, Clone, PartialEq)]
pub struct ExhaustiveResult {
    pub min_cost: Cost,
    pub schedules: Vec<Vec<usize>>,
    pub permutations_checked: u64,
}

/// Tries every ordering of the free activities across the free slots.
///
/// Exact by construction, so it is only run when `factorial(free)` fits the
/// threshold or the caller calls [`ExhaustiveSolver::solve_unbounded`].
pub struct ExhaustiveSolver<'a> {
    problem: &'a ScheduleProblem,
    threshold: u64,
}

impl<'a> ExhaustiveSolver<'a> {
    pub fn new(problem: &'a ScheduleProblem) -> Self {
        Self {
            problem,
            threshold: DEFAULT_EXHAUSTIVE_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn free_count(&self) -> usize {
        self.problem.swappable_slots().len()
    }

    /// `factorial(free_count)`, or `None` if it does not fit in a `u64`.
    pub fn permutation_count(&self) -> Option<u64> {
        permutation_count(self.free_count())
    }

    pub fn within_budget(&self) -> bool {
        self.permutation_count()
            .map_or(false, |count| count <= self.threshold)
    }

    /// Runs the search if it fits the budget.
    pub fn solve(&self) -> Result<ExhaustiveResult> {
        if !self.within_budget() {
            return Err(ScheduleError::ExhaustionBudgetExceeded {
                free_activities: self.free_count(),
                threshold: self.threshold,
            });
        }
        Ok(self.solve_unbounded())
    }

    /// Runs the search regardless of its size.
    pub fn solve_unbounded(&self) -> ExhaustiveResult {
        let problem = self.problem;
        let free_slots = problem.swappable_slots();
        let mut free = problem.free_activities();
        let mut schedule: Vec<usize> = (0..problem.len())
            .map(|slot| problem.fixed_at(slot).unwrap_or(usize::MAX))
            .collect();

        info!(
            free_activities = free.len(),
            permutations = ?self.permutation_count(),
            "starting exhaustive search"
        );

        let mut min_cost: Option<Cost> = None;
        let mut tied: Vec<Vec<usize>> = Vec::new();
        let mut checked: u64 = 0;

        let mut visit = |order: &[usize]| {
            for (&slot, &activity) in free_slots.iter().zip(order) {
                schedule[slot] = activity;
            }
            let cost = problem.cost(&schedule);
            match min_cost {
                Some(best) if cost > best => {}
                Some(best) if cost == best => tied.push(schedule.clone()),
                _ => {
                    min_cost = Some(cost);
                    tied.clear();
                    tied.push(schedule.clone());
                }
            }
            checked += 1;
            if checked % PROGRESS_INTERVAL == 0 {
                debug!(checked, min_cost = ?min_cost, "exhaustive search progress");
            }
        };

        // Heap's algorithm: each permutation differs from the last by one swap.
        let k = free.len();
        let mut counters = vec![0usize; k];
        visit(&free);
        let mut i = 1;
        while i < k {
            if counters[i] < i {
                if i % 2 == 0 {
                    free.swap(0, i);
                } else {
                    free.swap(counters[i], i);
                }
                visit(&free);
                counters[i] += 1;
                i = 1;
            } else {
                counters[i] = 0;
                i += 1;
            }
        }

        let min_cost = min_cost.unwrap_or(0);
        info!(
            checked,
            min_cost,
            optimal = tied.len(),
            "exhaustive search finished"
        );

        ExhaustiveResult {
            min_cost,
            schedules: tied,
            permutations_checked: checked,
        }
    }
}

/// `n!` with overflow reported as `None`.
pub fn permutation_count(n: usize) -> Option<u64> {
    (1..=n as u64).try_fold(1u64, |acc, x| acc.checked_mul(x))
}
