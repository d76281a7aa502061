//! Error types for running-order

use thiserror::Error;

use crate::config::ConfigError;

/// Main error type for scheduling requests.
///
/// Every variant is reported before any search starts, except
/// `ExhaustionBudgetExceeded`, which the caller may answer by opting in or by
/// falling back to annealing.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Unknown or duplicate names, conflicting fixed positions, bad tuning values
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The seeder could not fill every position
    #[error("Infeasible seed: {0}")]
    InfeasibleSeed(String),

    /// Exhaustive search would exceed the permutation budget
    #[error(
        "Exhaustive search over {free_activities} free activities exceeds the budget of \
         {threshold} permutations"
    )]
    ExhaustionBudgetExceeded { free_activities: usize, threshold: u64 },

    /// A caller-supplied schedule is not a permutation of the known activities
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Neither the configured column nor any of its alternates is present
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for scheduling operations
pub type Result<T> = std::result::Result<T, ScheduleError>;
