use chrono::NaiveDate;
use uuid::Uuid;

use crate::model::Task;

/// Stack tasks into rows so no two overlapping tasks share a row.
///
/// Greedy interval partitioning: tasks are visited by (start, end, id) and
/// placed in the first lane whose last task ends before this one starts.
/// Returns `(task id, lane index)` in visiting order.
pub fn assign_lanes<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Vec<(Uuid, usize)> {
    let mut ordered: Vec<&Task> = tasks.into_iter().collect();
    ordered.sort_by(|a, b| (a.start, a.end, a.id).cmp(&(b.start, b.end, b.id)));

    let mut lane_ends: Vec<NaiveDate> = Vec::new();
    let mut placed = Vec::with_capacity(ordered.len());

    for task in ordered {
        let lane = match lane_ends.iter().position(|end| *end < task.start) {
            Some(lane) => {
                lane_ends[lane] = task.end;
                lane
            }
            None => {
                lane_ends.push(task.end);
                lane_ends.len() - 1
            }
        };
        placed.push((task.id, lane));
    }
    placed
}

pub fn lane_count(lanes: &[(Uuid, usize)]) -> usize {
    lanes.iter().map(|(_, lane)| lane + 1).max().unwrap_or(0)
}
