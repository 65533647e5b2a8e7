use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::APP_NAME;
use crate::error::StorageError;
use crate::model::Task;

const TASKS_FILE: &str = "tasks.json";

/// Local JSON copy of the task collection, used when no durable backend
/// is available.
#[derive(Debug, Clone)]
pub struct OfflineStore {
    path: PathBuf,
}

impl OfflineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform data directory.
    pub fn default_location() -> Self {
        let dir = directories::ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir.join(TASKS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save all tasks as pretty JSON, creating parent directories.
    pub fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let json = serde_json::to_string_pretty(tasks).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(|source| self.io_error(source))?;
        debug!(path = %self.path.display(), count = tasks.len(), "saved offline tasks");
        Ok(())
    }

    /// Load tasks. A missing file means an empty collection.
    pub fn load(&self) -> Result<Option<Vec<Task>>, StorageError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        let tasks: Vec<Task> = serde_json::from_str(&json).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), count = tasks.len(), "loaded offline tasks");
        Ok(Some(tasks))
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
