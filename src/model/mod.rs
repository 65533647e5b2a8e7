pub mod filter;
pub mod labels;
pub mod lanes;
pub mod task;
pub mod timeline;

pub use filter::{visible_items, TaskFilter};
pub use task::{Task, TaskDraft, TaskPriority, TaskStatus};
pub use timeline::{compute_visible_days, Granularity, ViewWindow};
