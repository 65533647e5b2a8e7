//! Interactive planner timeline.
//!
//! The core is UI-agnostic: [`model`] computes the visible day range,
//! pixel geometry, labels and lanes; [`interaction`] turns pointer events
//! into date changes; [`store`] applies them optimistically and reconciles
//! with an injected backend. [`ui`] and [`app`] host it in egui.

pub mod app;
pub mod config;
pub mod error;
pub mod interaction;
pub mod io;
pub mod logging;
pub mod model;
pub mod store;
pub mod ui;

pub use config::TimelineConfig;
pub use error::{InteractionError, PersistenceError, StorageError, ValidationError};
pub use interaction::{DragMode, DragUpdate, InteractionController, Release};
pub use model::{Granularity, Task, TaskDraft, TaskFilter, TaskPriority, TaskStatus, ViewWindow};
pub use store::ItemStoreAdapter;
