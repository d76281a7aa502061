use super::types::Section;

/// Section preferences resolved to activity ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPreferences {
    pub start: Vec<usize>,
    pub middle: Vec<usize>,
    pub end: Vec<usize>,
}

impl ResolvedPreferences {
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.middle.is_empty() && self.end.is_empty()
    }

    pub fn get(&self, section: Section) -> &[usize] {
        match section {
            Section::Start => &self.start,
            Section::Middle => &self.middle,
            Section::End => &self.end,
        }
    }

    pub fn get_mut(&mut self, section: Section) -> &mut Vec<usize> {
        match section {
            Section::Start => &mut self.start,
            Section::Middle => &mut self.middle,
            Section::End => &mut self.end,
        }
    }
}

/// One point for every preferred activity sitting outside its section.
///
/// Activities missing from `schedule` add nothing.
pub fn preference_penalty(schedule: &[usize], preferences: &ResolvedPreferences) -> usize {
    if preferences.is_empty() {
        return 0;
    }
    let len = schedule.len();
    let mut penalty = 0;
    for section in Section::ALL {
        for activity in preferences.get(section) {
            if let Some(position) = schedule.iter().position(|a| a == activity) {
                if Section::of_index(position, len) != section {
                    penalty += 1;
                }
            }
        }
    }
    penalty
}
