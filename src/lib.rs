//! Orders activities so that members rarely perform back to back.
//!
//! The [`schedule`] module holds the solvers; [`parser`], [`display`] and
//! [`web`] adapt CSV files, console output and HTTP requests to them.

pub mod config;
pub mod display;
pub mod error;
pub mod parser;
pub mod schedule;
pub mod web;

pub use config::SolverConfig;
pub use error::{Result, ScheduleError};
