use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::schedule::{ActivityIndex, CollisionEvent, RunResult, SolveOutcome};

/// One line describing a back-to-back collision
pub fn format_collision(event: &CollisionEvent) -> String {
    format!(
        "Between '{}' and '{}': '{}' performs back-to-back at positions {} and {}",
        event.previous_activity,
        event.current_activity,
        event.member,
        event.position1,
        event.position2
    )
}

fn write_schedule(f: &mut fmt::Formatter<'_>, heading: &str, result: &RunResult) -> fmt::Result {
    writeln!(f, "\n{}", heading)?;
    for (idx, activity) in result.schedule.iter().enumerate() {
        writeln!(f, "{}. {}", idx + 1, activity)?;
    }
    writeln!(f, "\nTotal cost: {}", result.cost)?;
    if result.collisions.is_empty() {
        writeln!(f, "No collisions in this schedule.")?;
    } else {
        writeln!(f, "Collisions detected ({}):", result.collisions.len())?;
        for event in &result.collisions {
            writeln!(f, "  - {}", format_collision(event))?;
        }
    }
    Ok(())
}

impl fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveOutcome::Annealing { results } => {
                writeln!(f, "=== Annealing: {} runs ===", results.len())?;
                for (run, result) in results.iter().enumerate() {
                    write_schedule(f, &format!("Run #{}:", run + 1), result)?;
                }
            }
            SolveOutcome::Exhaustive {
                min_cost,
                permutations_checked,
                schedules,
            } => {
                writeln!(f, "=== Exhaustive search ===")?;
                writeln!(f, "Checked a total of {} permutations.", permutations_checked)?;
                writeln!(f, "Minimum cost found: {}", min_cost)?;
                writeln!(f, "Number of optimal schedules found: {}", schedules.len())?;
                for (idx, result) in schedules.iter().enumerate() {
                    write_schedule(f, &format!("Optimal Schedule #{}:", idx + 1), result)?;
                }
            }
        }
        Ok(())
    }
}

/// Human-readable report of a whole solve
pub fn render_outcome(outcome: &SolveOutcome) -> String {
    outcome.to_string()
}

/// Prints a solve report to stdout
pub fn print_outcome(outcome: &SolveOutcome) {
    print!("{}", outcome);
}

/// Writes a solve report to a file
pub fn write_outcome_to_file<P: AsRef<Path>>(outcome: &SolveOutcome, filename: P) -> Result<()> {
    let mut file = File::create(filename)?;
    write!(file, "{}", outcome)?;
    Ok(())
}

/// Lists every pair of activities that must not run back to back, with the
/// members they share.
pub fn render_conflicts(index: &ActivityIndex) -> String {
    let conflicts = index.conflicts();
    if conflicts.is_empty() {
        return "No activities share members.\n".to_string();
    }
    let mut out = format!("Activities sharing members ({}):\n", conflicts.len());
    for (a, b) in conflicts {
        out.push_str(&format!(
            "  - '{}' and '{}': {}\n",
            index.name(a),
            index.name(b),
            index.shared_members(a, b).join(", ")
        ));
    }
    out
}
