use chrono::{Duration, NaiveDate};
use egui::Color32;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Placeholder title for items created without one.
pub const DEFAULT_TITLE: &str = "New task";

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
}

impl TaskStatus {
    pub fn all() -> &'static [TaskStatus] {
        &[
            TaskStatus::NotStarted,
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::OnHold,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not started",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::OnHold => "On hold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Normal,
    Urgent,
}

impl TaskPriority {
    pub fn all() -> &'static [TaskPriority] {
        &[TaskPriority::Normal, TaskPriority::Urgent]
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskPriority::Normal => "Normal",
            TaskPriority::Urgent => "Urgent",
        }
    }

    pub fn color(self) -> Color32 {
        match self {
            TaskPriority::Normal => Color32::from_rgb(66, 133, 244),
            TaskPriority::Urgent => Color32::from_rgb(229, 57, 53),
        }
    }
}

/// A scheduled item on the timeline.
///
/// Dates are calendar days; `end >= start` holds for every task that has
/// passed editor validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub description: String,
    /// Explicit bar color. Falls back to the priority color when unset.
    #[serde(default, with = "color_serde")]
    pub color: Option<Color32>,
}

impl Task {
    /// Create a task with a fresh local id and default status/priority.
    pub fn new(title: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self::from_draft(Uuid::new_v4(), TaskDraft::new(title, start, end))
    }

    /// Materialise a draft under the given id.
    pub fn from_draft(id: Uuid, draft: TaskDraft) -> Self {
        let title = if draft.title.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            draft.title
        };
        Self {
            id,
            title,
            start: draft.start,
            end: draft.end,
            status: draft.status,
            priority: draft.priority,
            description: draft.description,
            color: draft.color,
        }
    }

    pub fn display_color(&self) -> Color32 {
        self.color.unwrap_or_else(|| self.priority.color())
    }

    /// Number of calendar days covered, inclusive.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Editable fields of this task.
    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            start: self.start,
            end: self.end,
            status: self.status,
            priority: self.priority,
            description: self.description.clone(),
            color: self.color,
        }
    }

    /// Overwrite the editable fields, keeping the id.
    pub fn apply(&mut self, draft: TaskDraft) {
        *self = Task::from_draft(self.id, draft);
    }
}

/// The field set exchanged with the detail editor and the persistence backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "color_serde")]
    pub color: Option<Color32>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            title: title.into(),
            start,
            end,
            status: TaskStatus::NotStarted,
            priority: TaskPriority::Normal,
            description: String::new(),
            color: None,
        }
    }

    /// Candidate for click-to-create: `span_days` days starting at `start`.
    pub fn quick(start: NaiveDate, span_days: i64) -> Self {
        let end = start + Duration::days(span_days.max(1) - 1);
        Self::new(DEFAULT_TITLE, start, end)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.end < self.start {
            return Err(ValidationError::EndBeforeStart);
        }
        Ok(())
    }
}

/// Serde helper for `Option<Color32>` stored as an RGBA array.
mod color_serde {
    use egui::Color32;
    use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(color: &Option<Color32>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        color
            .map(|c| [c.r(), c.g(), c.b(), c.a()])
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Color32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rgba: Option<[u8; 4]> = Deserialize::deserialize(deserializer)?;
        Ok(rgba.map(|[r, g, b, a]| Color32::from_rgba_premultiplied(r, g, b, a)))
    }
}
