use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// Collision count, plus the preference penalty when preferences are active
pub type Cost = usize;

/// Read-only activity → member mapping shared by every run of a request.
///
/// Activities and members are interned to dense ids; solver schedules are
/// `Vec<usize>` of activity ids and only become names again at the boundary.
#[derive(Debug, Clone)]
pub struct ActivityIndex {
    names: Vec<String>,
    lookup: HashMap<String, usize>,
    members: Vec<Vec<usize>>,
    member_names: Vec<String>,
}

impl ActivityIndex {
    /// Builds the index, rejecting duplicate names and activities without a
    /// participant entry. Duplicate members inside one activity are collapsed.
    pub fn new(activities: &[String], participants: &HashMap<String, Vec<String>>) -> Result<Self> {
        let mut lookup = HashMap::with_capacity(activities.len());
        let mut member_lookup: HashMap<&str, usize> = HashMap::new();
        let mut member_names = Vec::new();
        let mut members = Vec::with_capacity(activities.len());

        for (id, name) in activities.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ScheduleError::Configuration(format!(
                    "activity at position {} has an empty name",
                    id + 1
                )));
            }
            if lookup.insert(name.clone(), id).is_some() {
                return Err(ScheduleError::Configuration(format!(
                    "activity '{}' is listed more than once",
                    name
                )));
            }

            let listed = participants.get(name).ok_or_else(|| {
                ScheduleError::Configuration(format!(
                    "no participant entry for activity '{}'",
                    name
                ))
            })?;

            let mut ids: Vec<usize> = Vec::with_capacity(listed.len());
            for member in listed {
                let next_id = member_names.len();
                let member_id = *member_lookup.entry(member.as_str()).or_insert_with(|| {
                    member_names.push(member.clone());
                    next_id
                });
                if !ids.contains(&member_id) {
                    ids.push(member_id);
                }
            }
            members.push(ids);
        }

        Ok(Self {
            names: activities.to_vec(),
            lookup,
            members,
            member_names,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.member_names.len()
    }

    pub fn name(&self, id: usize) -> &str {
        &self.names[id]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// Member ids of an activity, without duplicates.
    pub fn members(&self, id: usize) -> &[usize] {
        &self.members[id]
    }

    pub fn member_name(&self, member: usize) -> &str {
        &self.member_names[member]
    }

    /// Case-insensitive lookup returning the canonical activity name.
    pub fn find_ignore_case(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        self.names
            .iter()
            .find(|n| n.to_lowercase() == wanted)
            .map(String::as_str)
    }

    /// Converts a name-based schedule to ids, checking that it is a
    /// permutation of exactly the known activities.
    pub fn resolve(&self, schedule: &[String]) -> Result<Vec<usize>> {
        if schedule.len() != self.len() {
            return Err(ScheduleError::InvalidSchedule(format!(
                "expected {} activities, got {}",
                self.len(),
                schedule.len()
            )));
        }
        let mut seen = vec![false; self.len()];
        schedule
            .iter()
            .map(|name| {
                let id = self.id_of(name).ok_or_else(|| {
                    ScheduleError::InvalidSchedule(format!("unknown activity '{}'", name))
                })?;
                if std::mem::replace(&mut seen[id], true) {
                    return Err(ScheduleError::InvalidSchedule(format!(
                        "activity '{}' appears more than once",
                        name
                    )));
                }
                Ok(id)
            })
            .collect()
    }

    pub fn names_of(&self, order: &[usize]) -> Vec<String> {
        order.iter().map(|&id| self.names[id].clone()).collect()
    }

    /// Pairs `(a, b)` with `a < b` of activities sharing at least one member,
    /// sorted. A zero-cost schedule never places such a pair side by side.
    pub fn conflicts(&self) -> Vec<(usize, usize)> {
        let mut activities_of: Vec<Vec<usize>> = vec![Vec::new(); self.member_count()];
        for (activity, members) in self.members.iter().enumerate() {
            for &member in members {
                activities_of[member].push(activity);
            }
        }

        let mut pairs: Vec<(usize, usize)> = Vec::new();
        for activities in &activities_of {
            for (i, &a) in activities.iter().enumerate() {
                pairs.extend(activities[i + 1..].iter().map(|&b| (a, b)));
            }
        }
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Members of `a` that also take part in `b`.
    pub fn shared_members(&self, a: usize, b: usize) -> Vec<&str> {
        self.members[a]
            .iter()
            .filter(|m| self.members[b].contains(*m))
            .map(|&m| self.member_name(m))
            .collect()
    }
}

/// One third of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    Start,
    Middle,
    End,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Start, Section::Middle, Section::End];

    /// Section holding 0-based `index` in a schedule of length `len`.
    /// Thirds are `[0, n/3)`, `[n/3, 2n/3)`, `[2n/3, n)` with integer division.
    pub fn of_index(index: usize, len: usize) -> Section {
        if index < len / 3 {
            Section::Start
        } else if index < 2 * len / 3 {
            Section::Middle
        } else {
            Section::End
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Start => write!(f, "Start"),
            Section::Middle => write!(f, "Middle"),
            Section::End => write!(f, "End"),
        }
    }
}

/// Soft preferences: activity names per section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionPreferences {
    #[serde(rename = "Start", default)]
    pub start: Vec<String>,
    #[serde(rename = "Middle", default)]
    pub middle: Vec<String>,
    #[serde(rename = "End", default)]
    pub end: Vec<String>,
}

impl SectionPreferences {
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.middle.is_empty() && self.end.is_empty()
    }

    pub fn get(&self, section: Section) -> &[String] {
        match section {
            Section::Start => &self.start,
            Section::Middle => &self.middle,
            Section::End => &self.end,
        }
    }
}

/// Pins an activity to a 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPosition {
    pub activity: String,
    pub position: usize,
}

impl FixedPosition {
    pub fn new(activity: impl Into<String>, position: usize) -> Self {
        Self {
            activity: activity.into(),
            position,
        }
    }
}

/// Hard and soft constraints of a request, still name-based.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default)]
    pub start_activity: Option<String>,
    #[serde(default)]
    pub end_activity: Option<String>,
    #[serde(default)]
    pub fixed_positions: Vec<FixedPosition>,
    #[serde(default)]
    pub preferences: SectionPreferences,
}

/// A member performing in two adjacent activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionEvent {
    pub member: String,
    pub previous_activity: String,
    pub current_activity: String,
    /// 1-based position of `previous_activity`
    pub position1: usize,
    /// Always `position1 + 1`
    pub position2: usize,
}

/// Outcome of one annealing run, ready for the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub schedule: Vec<String>,
    pub cost: Cost,
    pub collisions: Vec<CollisionEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participants(pairs: &[(&str, &[&str])]) -> (Vec<String>, HashMap<String, Vec<String>>) {
        let names = pairs.iter().map(|(n, _)| n.to_string()).collect();
        let map = pairs
            .iter()
            .map(|(n, ms)| (n.to_string(), ms.iter().map(|m| m.to_string()).collect()))
            .collect();
        (names, map)
    }

    #[test]
    fn test_duplicate_members_collapsed() {
        let (names, map) = participants(&[("A", &["m1", "m1", "m2"]), ("B", &["m2"])]);
        let index = ActivityIndex::new(&names, &map).unwrap();
        assert_eq!(index.members(0).len(), 2);
        assert_eq!(index.member_count(), 2);
        assert_eq!(index.members(1), &[index.members(0)[1]]);
    }

    #[test]
    fn test_missing_participant_entry() {
        let (mut names, map) = participants(&[("A", &["m1"])]);
        names.push("B".to_string());
        let err = ActivityIndex::new(&names, &map).unwrap_err();
        assert!(matches!(err, ScheduleError::Configuration(_)));
    }

    #[test]
    fn test_duplicate_activity_rejected() {
        let (mut names, map) = participants(&[("A", &["m1"])]);
        names.push("A".to_string());
        assert!(ActivityIndex::new(&names, &map).is_err());
    }

    #[test]
    fn test_resolve_rejects_malformed_schedules() {
        let (names, map) = participants(&[("A", &["m1"]), ("B", &["m2"]), ("C", &["m3"])]);
        let index = ActivityIndex::new(&names, &map).unwrap();

        let ok = index.resolve(&["C".into(), "A".into(), "B".into()]).unwrap();
        assert_eq!(ok, vec![2, 0, 1]);

        let short = index.resolve(&["A".into(), "B".into()]);
        assert!(matches!(short, Err(ScheduleError::InvalidSchedule(_))));

        let dup = index.resolve(&["A".into(), "A".into(), "B".into()]);
        assert!(matches!(dup, Err(ScheduleError::InvalidSchedule(_))));

        let unknown = index.resolve(&["A".into(), "B".into(), "Z".into()]);
        assert!(matches!(unknown, Err(ScheduleError::InvalidSchedule(_))));
    }

    #[test]
    fn test_find_ignore_case() {
        let (names, map) = participants(&[("Opening Number", &["m1"])]);
        let index = ActivityIndex::new(&names, &map).unwrap();
        assert_eq!(index.find_ignore_case(" opening number "), Some("Opening Number"));
        assert_eq!(index.find_ignore_case("closing"), None);
    }

    #[test]
    fn test_conflict_pairs() {
        let (names, map) = participants(&[
            ("A", &["m1", "m2"]),
            ("B", &["m2"]),
            ("C", &["m3"]),
            ("D", &["m1", "m2", "m3"]),
        ]);
        let index = ActivityIndex::new(&names, &map).unwrap();
        assert_eq!(index.conflicts(), vec![(0, 1), (0, 3), (1, 3), (2, 3)]);
        assert_eq!(index.shared_members(0, 3), vec!["m1", "m2"]);
        assert!(index.shared_members(0, 2).is_empty());
    }

    #[test]
    fn test_section_thirds() {
        // n = 7: [0, 2), [2, 4), [4, 7)
        let sections: Vec<Section> = (0..7).map(|i| Section::of_index(i, 7)).collect();
        assert_eq!(
            sections,
            vec![
                Section::Start,
                Section::Start,
                Section::Middle,
                Section::Middle,
                Section::End,
                Section::End,
                Section::End,
            ]
        );
    }

    #[test]
    fn test_preferences_json_keys() {
        let prefs: SectionPreferences =
            serde_json::from_str(r#"{"Start": ["A"], "End": ["C"]}"#).unwrap();
        assert_eq!(prefs.start, vec!["A"]);
        assert!(prefs.middle.is_empty());
        assert_eq!(prefs.get(Section::End), &["C".to_string()]);
    }
}
