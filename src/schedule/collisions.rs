use super::types::{ActivityIndex, CollisionEvent, Cost};
use crate::error::Result;

/// Walks the schedule once, calling `on_collision(member, position)` for each
/// member that also appeared in the activity at `position - 1`.
///
/// A member's last-seen position is updated whether or not they collided, so
/// three consecutive appearances produce two collisions.
fn walk_adjacent<F>(schedule: &[usize], index: &ActivityIndex, mut on_collision: F)
where
    F: FnMut(usize, usize),
{
    let mut last_seen: Vec<Option<usize>> = vec![None; index.member_count()];
    for (position, &activity) in schedule.iter().enumerate() {
        for &member in index.members(activity) {
            if position > 0 && last_seen[member] == Some(position - 1) {
                on_collision(member, position);
            }
            last_seen[member] = Some(position);
        }
    }
}

/// Number of back-to-back collisions in an id schedule
pub fn count_collisions(schedule: &[usize], index: &ActivityIndex) -> Cost {
    let mut collisions = 0;
    walk_adjacent(schedule, index, |_, _| collisions += 1);
    collisions
}

/// One event per back-to-back collision, in schedule order
pub fn collision_details(schedule: &[usize], index: &ActivityIndex) -> Vec<CollisionEvent> {
    let mut events = Vec::new();
    walk_adjacent(schedule, index, |member, position| {
        events.push(CollisionEvent {
            member: index.member_name(member).to_string(),
            previous_activity: index.name(schedule[position - 1]).to_string(),
            current_activity: index.name(schedule[position]).to_string(),
            position1: position,
            position2: position + 1,
        });
    });
    events
}

/// `count_collisions` for a name-based schedule supplied by a caller
pub fn count_named(schedule: &[String], index: &ActivityIndex) -> Result<Cost> {
    let ids = index.resolve(schedule)?;
    Ok(count_collisions(&ids, index))
}

/// `collision_details` for a name-based schedule supplied by a caller
pub fn details_named(schedule: &[String], index: &ActivityIndex) -> Result<Vec<CollisionEvent>> {
    let ids = index.resolve(schedule)?;
    Ok(collision_details(&ids, index))
}
