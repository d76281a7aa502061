pub mod annealing;
pub mod collisions;
pub mod exhaustive;
pub mod orchestrator;
pub mod planner;
pub mod preferences;
pub mod problem;
pub mod seeder;
pub mod types;

pub use annealing::{anneal, AnnealingOutcome, AnnealingRun, StepOutcome, StopReason};
pub use collisions::{collision_details, count_collisions};
pub use exhaustive::{ExhaustiveResult, ExhaustiveSolver};
pub use orchestrator::run_many;
pub use planner::{plan, SolveOutcome, SolveRequest, Strategy, Tuning};
pub use preferences::preference_penalty;
pub use problem::ScheduleProblem;
pub use seeder::{seed_schedule, seed_with_bookends};
pub use types::{
    ActivityIndex, CollisionEvent, Constraints, Cost, FixedPosition, RunResult, Section,
    SectionPreferences,
};
