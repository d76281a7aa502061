//! Simulated annealing over pairwise swaps of unpinned positions.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use tracing::debug;

use super::problem::ScheduleProblem;
use super::seeder::seed_schedule;
use super::types::Cost;
use crate::config::SolverConfig;
use crate::error::Result;

const PROGRESS_INTERVAL: usize = 1000;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    IterationLimit,
    TemperatureFloor,
    /// A zero-cost schedule was found.
    PerfectScore,
    /// Fewer than two positions can move.
    NothingToSwap,
    Cancelled,
}

/// Result of a single iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Accepted,
    Rejected,
    Finished(StopReason),
}

/// Best schedule found by one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnealingOutcome {
    pub schedule: Vec<usize>,
    pub cost: Cost,
    pub iterations: usize,
    pub stop_reason: StopReason,
}

/// State of one annealing run.
///
/// Only slots without a pin are ever swapped, so every state the run moves
/// through keeps bookends and fixed positions in place.
pub struct AnnealingRun<'a> {
    problem: &'a ScheduleProblem,
    swappable: Vec<usize>,
    current: Vec<usize>,
    current_cost: Cost,
    best: Vec<usize>,
    best_cost: Cost,
    temperature: f64,
    cooling_rate: f64,
    max_iterations: usize,
    iteration: usize,
    stopped: Option<StopReason>,
}

impl<'a> AnnealingRun<'a> {
    /// Seeds the run from the constrained seeder.
    pub fn start<R: Rng + ?Sized>(
        problem: &'a ScheduleProblem,
        config: &SolverConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let current = seed_schedule(problem, rng)?;
        let current_cost = problem.cost(&current);
        Ok(Self {
            problem,
            swappable: problem.swappable_slots(),
            best: current.clone(),
            best_cost: current_cost,
            current,
            current_cost,
            temperature: config.initial_temperature,
            cooling_rate: config.cooling_rate,
            max_iterations: config.max_iterations,
            iteration: 0,
            stopped: None,
        })
    }

    pub fn current(&self) -> &[usize] {
        &self.current
    }

    pub fn current_cost(&self) -> Cost {
        self.current_cost
    }

    pub fn best(&self) -> &[usize] {
        &self.best
    }

    pub fn best_cost(&self) -> Cost {
        self.best_cost
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    fn stop(&mut self, reason: StopReason) -> StepOutcome {
        self.stopped = Some(reason);
        StepOutcome::Finished(reason)
    }

    /// Cools, proposes one swap, and applies the Metropolis criterion.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> StepOutcome {
        if let Some(reason) = self.stopped {
            return StepOutcome::Finished(reason);
        }
        if self.swappable.len() < 2 {
            return self.stop(StopReason::NothingToSwap);
        }
        if self.best_cost == 0 {
            return self.stop(StopReason::PerfectScore);
        }
        if self.iteration >= self.max_iterations {
            return self.stop(StopReason::IterationLimit);
        }

        self.iteration += 1;
        self.temperature *= 1.0 - self.cooling_rate;
        if self.temperature <= 0.0 {
            return self.stop(StopReason::TemperatureFloor);
        }

        let count = self.swappable.len();
        let first = rng.gen_range(0..count);
        let mut second = rng.gen_range(0..count - 1);
        if second >= first {
            second += 1;
        }
        let (a, b) = (self.swappable[first], self.swappable[second]);

        self.current.swap(a, b);
        let candidate_cost = self.problem.cost(&self.current);
        let delta = candidate_cost as f64 - self.current_cost as f64;
        let accepted = delta < 0.0 || rng.gen::<f64>() < (-delta / self.temperature).exp();

        let outcome = if accepted {
            self.current_cost = candidate_cost;
            if self.current_cost < self.best_cost {
                self.best.clone_from(&self.current);
                self.best_cost = self.current_cost;
            }
            StepOutcome::Accepted
        } else {
            self.current.swap(a, b);
            StepOutcome::Rejected
        };

        if self.iteration % PROGRESS_INTERVAL == 0 {
            debug!(
                iteration = self.iteration,
                current = self.current_cost,
                best = self.best_cost,
                temperature = self.temperature,
                "annealing progress"
            );
        }
        outcome
    }

    /// Steps until a stop condition holds. `cancel` is checked once per
    /// iteration; a cancelled run still returns its best schedule.
    pub fn run<R: Rng + ?Sized>(
        mut self,
        rng: &mut R,
        cancel: Option<&AtomicBool>,
    ) -> AnnealingOutcome {
        loop {
            if cancel.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
                self.stop(StopReason::Cancelled);
                break;
            }
            if let StepOutcome::Finished(_) = self.step(rng) {
                break;
            }
        }
        self.finish()
    }

    pub fn finish(self) -> AnnealingOutcome {
        let stop_reason = self.stopped.unwrap_or(StopReason::Cancelled);
        debug!(
            iterations = self.iteration,
            best = self.best_cost,
            reason = ?stop_reason,
            "annealing run finished"
        );
        AnnealingOutcome {
            schedule: self.best,
            cost: self.best_cost,
            iterations: self.iteration,
            stop_reason,
        }
    }
}

/// Seeds and runs one full annealing pass.
pub fn anneal<R: Rng + ?Sized>(
    problem: &ScheduleProblem,
    config: &SolverConfig,
    rng: &mut R,
) -> Result<AnnealingOutcome> {
    Ok(AnnealingRun::start(problem, config, rng)?.run(rng, None))
}
