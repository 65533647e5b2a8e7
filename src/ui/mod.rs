pub mod task_editor;
pub mod theme;
pub mod timeline;
pub mod toolbar;
