//! Solver tuning parameters.
//!
//! Defaults match the values the scheduler has always run with. A TOML file
//! can override any subset of them:
//!
//! ```toml
//! max_iterations = 20000
//! cooling_rate = 0.001
//! run_count = 5
//! random_seed = 42
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration file error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tuning for the exhaustive and annealing solvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SolverConfig {
    /// Upper bound on annealing iterations per run.
    pub max_iterations: usize,
    /// Starting temperature of each annealing run.
    pub initial_temperature: f64,
    /// Fraction the temperature drops by every iteration.
    pub cooling_rate: f64,
    /// Largest permutation count the exhaustive solver runs without opt-in.
    pub exhaustive_threshold: u64,
    /// Number of independent annealing runs per request.
    pub run_count: usize,
    /// Seed for the master random stream; entropy when absent.
    pub random_seed: Option<u64>,
    /// Run the independent annealing runs on the rayon pool.
    pub parallel: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            initial_temperature: 1000.0,
            cooling_rate: 0.003,
            exhaustive_threshold: 1_000_000,
            run_count: 3,
            random_seed: None,
            parallel: false,
        }
    }
}

impl SolverConfig {
    /// Loads configuration from a TOML file and validates it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string and validates it.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_run_count(mut self, run_count: usize) -> Self {
        self.run_count = run_count;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Rejects values that would make the annealing schedule meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_temperature.is_finite() || self.initial_temperature <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial_temperature must be positive, got {}",
                self.initial_temperature
            )));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "cooling_rate must be in (0, 1], got {}",
                self.cooling_rate
            )));
        }
        if self.run_count == 0 {
            return Err(ConfigError::Invalid("run_count must be at least 1".to_string()));
        }
        Ok(())
    }
}
