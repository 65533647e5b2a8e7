use std::collections::BTreeSet;

use crate::model::timeline::ViewWindow;
use crate::model::{Task, TaskPriority, TaskStatus};

/// Priority and status sets a task must belong to in order to be shown.
///
/// Membership is strict: an empty set hides everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub priorities: BTreeSet<TaskPriority>,
    pub statuses: BTreeSet<TaskStatus>,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            priorities: TaskPriority::all().iter().copied().collect(),
            statuses: TaskStatus::all().iter().copied().collect(),
        }
    }
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.priorities.contains(&task.priority) && self.statuses.contains(&task.status)
    }

    pub fn toggle_priority(&mut self, priority: TaskPriority) {
        if !self.priorities.remove(&priority) {
            self.priorities.insert(priority);
        }
    }

    pub fn toggle_status(&mut self, status: TaskStatus) {
        if !self.statuses.remove(&status) {
            self.statuses.insert(status);
        }
    }
}

/// Tasks passing `filter` whose range overlaps the window (inclusive).
pub fn visible_items<'a>(
    tasks: &'a [Task],
    filter: &'a TaskFilter,
    window: &'a ViewWindow,
) -> impl Iterator<Item = &'a Task> + 'a {
    tasks
        .iter()
        .filter(move |task| filter.matches(task) && window.overlaps(task))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimelineConfig;
    use crate::model::timeline::Granularity;
    use chrono::{NaiveDate, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Jun 12 2024 is a Wednesday, so a Wednesday week padded by two days
    /// spans Jun 10 to Jun 20.
    fn jun_10_to_20() -> ViewWindow {
        let config = TimelineConfig {
            week_start: Weekday::Wed,
            week_padding_days: 2,
            ..Default::default()
        };
        ViewWindow::new(date(2024, 6, 12), Granularity::Week, &config)
    }

    #[test]
    fn padded_week_window_spans_jun_10_to_20() {
        let window = jun_10_to_20();
        assert_eq!(window.first_day(), Some(date(2024, 6, 10)));
        assert_eq!(window.last_day(), Some(date(2024, 6, 20)));
        assert_eq!(window.days().len(), 11);
    }

    #[test]
    fn partial_overlap_is_visible() {
        let window = jun_10_to_20();
        let tasks = vec![
            Task::new("overlaps", date(2024, 6, 18), date(2024, 6, 25)),
            Task::new("before", date(2024, 6, 1), date(2024, 6, 5)),
            Task::new("touches start", date(2024, 6, 1), date(2024, 6, 10)),
            Task::new("touches end", date(2024, 6, 20), date(2024, 6, 30)),
            Task::new("covers", date(2024, 5, 1), date(2024, 7, 1)),
        ];
        let filter = TaskFilter::default();
        let titles: Vec<&str> = visible_items(&tasks, &filter, &window)
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, ["overlaps", "touches start", "touches end", "covers"]);
    }

    #[test]
    fn membership_filters() {
        let window = jun_10_to_20();
        let mut urgent = Task::new("urgent", date(2024, 6, 12), date(2024, 6, 12));
        urgent.priority = TaskPriority::Urgent;
        let mut done = Task::new("done", date(2024, 6, 12), date(2024, 6, 12));
        done.status = TaskStatus::Completed;
        let tasks = vec![urgent, done];

        let mut filter = TaskFilter::default();
        filter.toggle_priority(TaskPriority::Urgent);
        let titles: Vec<&str> = visible_items(&tasks, &filter, &window)
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, ["done"]);

        filter.toggle_priority(TaskPriority::Urgent);
        filter.toggle_status(TaskStatus::Completed);
        let titles: Vec<&str> = visible_items(&tasks, &filter, &window)
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, ["urgent"]);

        filter.statuses.clear();
        assert_eq!(visible_items(&tasks, &filter, &window).count(), 0);
    }
}
