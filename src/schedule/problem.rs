use std::collections::HashMap;

use tracing::warn;

use super::collisions::count_collisions;
use super::preferences::{preference_penalty, ResolvedPreferences};
use super::types::{ActivityIndex, Constraints, Cost, Section};
use crate::error::{Result, ScheduleError};

/// A validated request: the activity index plus constraints resolved to ids.
///
/// Precedence between overlapping constraints:
/// - start/end bookends are fixed positions 1 and n;
/// - a fixed position beats a section preference (the preference is dropped);
/// - an activity in two sections, a slot claimed twice or an activity
///   claimed for two slots is rejected.
#[derive(Debug, Clone)]
pub struct ScheduleProblem {
    index: ActivityIndex,
    /// slot -> pinned activity
    fixed: Vec<Option<usize>>,
    preferences: ResolvedPreferences,
    start: Option<usize>,
    end: Option<usize>,
    bookends_only: bool,
}

impl ScheduleProblem {
    /// A problem with no constraints at all.
    pub fn unconstrained(index: ActivityIndex) -> Result<Self> {
        Self::new(index, &Constraints::default())
    }

    pub fn new(index: ActivityIndex, constraints: &Constraints) -> Result<Self> {
        let n = index.len();
        if n == 0 {
            return Err(ScheduleError::Configuration("no activities to schedule".to_string()));
        }

        let lookup = |name: &str, role: &str| {
            index.id_of(name).ok_or_else(|| {
                ScheduleError::Configuration(format!("{} '{}' is not a known activity", role, name))
            })
        };

        let start = constraints
            .start_activity
            .as_deref()
            .map(|name| lookup(name, "start activity"))
            .transpose()?;
        let end = constraints
            .end_activity
            .as_deref()
            .map(|name| lookup(name, "end activity"))
            .transpose()?;

        let mut claims: Vec<(usize, usize)> = Vec::new();
        if let Some(id) = start {
            claims.push((id, 0));
        }
        if let Some(id) = end {
            claims.push((id, n - 1));
        }
        for pin in &constraints.fixed_positions {
            let id = lookup(&pin.activity, "fixed activity")?;
            if pin.position == 0 || pin.position > n {
                return Err(ScheduleError::Configuration(format!(
                    "position {} for '{}' is outside 1..={}",
                    pin.position, pin.activity, n
                )));
            }
            claims.push((id, pin.position - 1));
        }

        let mut fixed: Vec<Option<usize>> = vec![None; n];
        let mut slot_of: HashMap<usize, usize> = HashMap::new();
        for (id, slot) in claims {
            match fixed[slot] {
                Some(holder) if holder != id => {
                    return Err(ScheduleError::Configuration(format!(
                        "position {} is claimed by both '{}' and '{}'",
                        slot + 1,
                        index.name(holder),
                        index.name(id)
                    )));
                }
                _ => {}
            }
            if let Some(&other) = slot_of.get(&id) {
                if other != slot {
                    return Err(ScheduleError::Configuration(format!(
                        "'{}' is pinned to both position {} and position {}",
                        index.name(id),
                        other + 1,
                        slot + 1
                    )));
                }
            }
            fixed[slot] = Some(id);
            slot_of.insert(id, slot);
        }

        let mut preferences = ResolvedPreferences::default();
        let mut section_of: HashMap<usize, Section> = HashMap::new();
        for section in Section::ALL {
            for name in constraints.preferences.get(section) {
                let id = lookup(name, "preferred activity")?;
                match section_of.insert(id, section) {
                    Some(previous) if previous != section => {
                        return Err(ScheduleError::Configuration(format!(
                            "'{}' is preferred in both {} and {}",
                            name, previous, section
                        )));
                    }
                    Some(_) => continue,
                    None => {}
                }
                if let Some(&slot) = slot_of.get(&id) {
                    warn!(
                        activity = %name,
                        position = slot + 1,
                        section = %section,
                        "activity is pinned, ignoring its section preference"
                    );
                    continue;
                }
                preferences.get_mut(section).push(id);
            }
        }

        let bookends_only = constraints.fixed_positions.is_empty() && preferences.is_empty();

        Ok(Self {
            index,
            fixed,
            preferences,
            start,
            end,
            bookends_only,
        })
    }

    pub fn index(&self) -> &ActivityIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Activity pinned at `slot`, if any.
    pub fn fixed_at(&self, slot: usize) -> Option<usize> {
        self.fixed[slot]
    }

    pub fn is_fixed_slot(&self, slot: usize) -> bool {
        self.fixed[slot].is_some()
    }

    pub fn is_fixed_activity(&self, activity: usize) -> bool {
        self.fixed.contains(&Some(activity))
    }

    pub fn start(&self) -> Option<usize> {
        self.start
    }

    pub fn end(&self) -> Option<usize> {
        self.end
    }

    /// True when the only hard constraints are the start/end bookends and
    /// no section preference is active.
    pub fn bookends_only(&self) -> bool {
        self.bookends_only
    }

    pub fn preferences(&self) -> &ResolvedPreferences {
        &self.preferences
    }

    /// Slots the search may swap.
    pub fn swappable_slots(&self) -> Vec<usize> {
        (0..self.len()).filter(|&slot| !self.is_fixed_slot(slot)).collect()
    }

    /// Activities not pinned anywhere, in input order.
    pub fn free_activities(&self) -> Vec<usize> {
        (0..self.len()).filter(|&id| !self.is_fixed_activity(id)).collect()
    }

    /// Collisions, plus the preference penalty when preferences are active.
    pub fn cost(&self, schedule: &[usize]) -> Cost {
        count_collisions(schedule, &self.index) + preference_penalty(schedule, &self.preferences)
    }

    /// True when every pinned slot holds its activity.
    pub fn respects_fixed(&self, schedule: &[usize]) -> bool {
        self.fixed
            .iter()
            .zip(schedule)
            .all(|(pin, &actual)| pin.map_or(true, |id| id == actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::types::{FixedPosition, SectionPreferences};

    fn index_of(names: &[&str]) -> ActivityIndex {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let map: HashMap<String, Vec<String>> =
            names.iter().map(|n| (n.clone(), vec![format!("{}-member", n)])).collect();
        ActivityIndex::new(&names, &map).unwrap()
    }

    #[test]
    fn test_bookends_become_fixed_slots() {
        let constraints = Constraints {
            start_activity: Some("B".into()),
            end_activity: Some("A".into()),
            ..Default::default()
        };
        let problem = ScheduleProblem::new(index_of(&["A", "B", "C", "D"]), &constraints).unwrap();
        assert_eq!(problem.fixed_at(0), Some(1));
        assert_eq!(problem.fixed_at(3), Some(0));
        assert_eq!(problem.swappable_slots(), vec![1, 2]);
        assert_eq!(problem.free_activities(), vec![2, 3]);
        assert!(problem.bookends_only());
    }

    #[test]
    fn test_unknown_names_rejected() {
        let constraints = Constraints {
            start_activity: Some("Nope".into()),
            ..Default::default()
        };
        let err = ScheduleProblem::new(index_of(&["A", "B"]), &constraints).unwrap_err();
        assert!(matches!(err, ScheduleError::Configuration(_)));

        let constraints = Constraints {
            preferences: SectionPreferences {
                middle: vec!["Nope".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(ScheduleProblem::new(index_of(&["A", "B"]), &constraints).is_err());
    }

    #[test]
    fn test_conflicting_fixed_positions_rejected() {
        let constraints = Constraints {
            fixed_positions: vec![FixedPosition::new("A", 2), FixedPosition::new("B", 2)],
            ..Default::default()
        };
        assert!(ScheduleProblem::new(index_of(&["A", "B", "C"]), &constraints).is_err());

        let constraints = Constraints {
            start_activity: Some("A".into()),
            fixed_positions: vec![FixedPosition::new("A", 3)],
            ..Default::default()
        };
        assert!(ScheduleProblem::new(index_of(&["A", "B", "C"]), &constraints).is_err());
    }

    #[test]
    fn test_same_start_and_end_rejected() {
        let constraints = Constraints {
            start_activity: Some("A".into()),
            end_activity: Some("A".into()),
            ..Default::default()
        };
        assert!(ScheduleProblem::new(index_of(&["A", "B"]), &constraints).is_err());
        assert!(ScheduleProblem::new(index_of(&["A"]), &constraints).is_ok());
    }

    #[test]
    fn test_repeated_identical_pin_is_fine() {
        let constraints = Constraints {
            start_activity: Some("A".into()),
            fixed_positions: vec![FixedPosition::new("A", 1)],
            ..Default::default()
        };
        let problem = ScheduleProblem::new(index_of(&["A", "B", "C"]), &constraints).unwrap();
        assert_eq!(problem.fixed_at(0), Some(0));
        assert!(!problem.bookends_only());
    }

    #[test]
    fn test_position_out_of_range() {
        for position in [0, 4] {
            let constraints = Constraints {
                fixed_positions: vec![FixedPosition::new("A", position)],
                ..Default::default()
            };
            let err = ScheduleProblem::new(index_of(&["A", "B", "C"]), &constraints).unwrap_err();
            assert!(matches!(err, ScheduleError::Configuration(_)));
        }
    }

    #[test]
    fn test_fixed_position_beats_preference() {
        let constraints = Constraints {
            fixed_positions: vec![FixedPosition::new("C", 1)],
            preferences: SectionPreferences {
                end: vec!["C".into(), "B".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        let problem = ScheduleProblem::new(index_of(&["A", "B", "C"]), &constraints).unwrap();
        assert_eq!(problem.preferences().end, vec![1]);
    }

    #[test]
    fn test_activity_in_two_sections_rejected() {
        let constraints = Constraints {
            preferences: SectionPreferences {
                start: vec!["A".into()],
                end: vec!["A".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(ScheduleProblem::new(index_of(&["A", "B", "C"]), &constraints).is_err());
    }

    #[test]
    fn test_empty_activity_list_rejected() {
        let index = ActivityIndex::new(&[], &HashMap::new()).unwrap();
        assert!(ScheduleProblem::unconstrained(index).is_err());
    }

    #[test]
    fn test_cost_adds_penalty() {
        let constraints = Constraints {
            preferences: SectionPreferences {
                start: vec!["C".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        let problem = ScheduleProblem::new(index_of(&["A", "B", "C"]), &constraints).unwrap();
        assert_eq!(problem.cost(&[2, 0, 1]), 0);
        assert_eq!(problem.cost(&[0, 1, 2]), 1);
        assert!(problem.respects_fixed(&[0, 1, 2]));
    }
}
