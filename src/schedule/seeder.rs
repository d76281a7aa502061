use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::problem::ScheduleProblem;
use super::types::ActivityIndex;
use crate::error::{Result, ScheduleError};

/// Builds one starting schedule for the search.
///
/// Pinned slots are filled first. Start-preferred activities take the lowest
/// free slots in input order, End-preferred activities take the highest free
/// slots (keeping their input order in the tail), and everything else is
/// shuffled into whatever is left.
pub fn seed_schedule<R: Rng + ?Sized>(
    problem: &ScheduleProblem,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if problem.bookends_only() {
        return Ok(seed_with_bookends(problem.index(), problem.start(), problem.end(), rng));
    }

    let n = problem.len();
    let mut slots: Vec<Option<usize>> = (0..n).map(|slot| problem.fixed_at(slot)).collect();
    let free_slots = problem.swappable_slots();
    let preferences = problem.preferences();

    // Start/End activities are distinct and never pinned, so they fit.
    debug_assert!(preferences.start.len() + preferences.end.len() <= free_slots.len());

    let mut placed = vec![false; n];
    for id in slots.iter().flatten() {
        placed[*id] = true;
    }

    let mut low = 0;
    for &id in &preferences.start {
        slots[free_slots[low]] = Some(id);
        placed[id] = true;
        low += 1;
    }

    let mut high = free_slots.len();
    for &id in preferences.end.iter().rev() {
        high -= 1;
        slots[free_slots[high]] = Some(id);
        placed[id] = true;
    }

    let mut rest: Vec<usize> = (0..n).filter(|&id| !placed[id]).collect();
    debug_assert_eq!(rest.len(), high - low);
    rest.shuffle(rng);
    for (&slot, id) in free_slots[low..high].iter().zip(rest) {
        slots[slot] = Some(id);
    }

    debug!(
        activities = n,
        pinned = n - free_slots.len(),
        start = preferences.start.len(),
        end = preferences.end.len(),
        "seeded constrained schedule"
    );

    slots
        .into_iter()
        .collect::<Option<Vec<usize>>>()
        .ok_or_else(|| ScheduleError::InfeasibleSeed("a position was left empty".to_string()))
}

/// Shuffles every activity except the bookends, then puts `start` first and
/// `end` last.
pub fn seed_with_bookends<R: Rng + ?Sized>(
    index: &ActivityIndex,
    start: Option<usize>,
    end: Option<usize>,
    rng: &mut R,
) -> Vec<usize> {
    let mut schedule: Vec<usize> = (0..index.len())
        .filter(|&id| Some(id) != start && Some(id) != end)
        .collect();
    schedule.shuffle(rng);

    if let Some(id) = start {
        schedule.insert(0, id);
    }
    if let Some(id) = end {
        if Some(id) != start {
            schedule.push(id);
        }
    }
    schedule
}
