//! Collaborators the store talks to, and the jobs it sends them.

use futures::future::{FutureExt, LocalBoxFuture};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::model::{Task, TaskDraft};

/// Durable task storage, typically a REST resource.
///
/// Futures are `'static` so they can run on a local executor while the
/// store stays mutable.
pub trait TaskBackend {
    fn create(&self, draft: TaskDraft) -> LocalBoxFuture<'static, Result<Task, PersistenceError>>;
    fn update(
        &self,
        id: Uuid,
        draft: TaskDraft,
    ) -> LocalBoxFuture<'static, Result<Task, PersistenceError>>;
    fn delete(&self, id: Uuid) -> LocalBoxFuture<'static, Result<(), PersistenceError>>;
}

/// Whether a durable backend may be used right now (e.g. signed in).
pub trait Session {
    fn backend_available(&self) -> bool;
}

/// A session whose availability is fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct StaticSession(pub bool);

impl Session for StaticSession {
    fn backend_available(&self) -> bool {
        self.0
    }
}

/// Fire-and-forget user notifications.
pub trait Notifier {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        info!("{message}");
    }

    fn error(&self, message: &str) {
        error!("{message}");
    }
}

/// A remote call issued after an optimistic local mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncJob {
    Create { temp_id: Uuid, draft: TaskDraft },
    Update { id: Uuid, draft: TaskDraft, seq: u64 },
    Delete { id: Uuid },
}

/// The backend's answer to a [`SyncJob`].
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Created {
        temp_id: Uuid,
        result: Result<Task, PersistenceError>,
    },
    Updated {
        id: Uuid,
        seq: u64,
        result: Result<Task, PersistenceError>,
    },
    Deleted {
        id: Uuid,
        result: Result<(), PersistenceError>,
    },
}

/// Start the backend call for `job`.
pub fn dispatch(backend: &dyn TaskBackend, job: SyncJob) -> LocalBoxFuture<'static, SyncOutcome> {
    match job {
        SyncJob::Create { temp_id, draft } => {
            let call = backend.create(draft);
            async move {
                SyncOutcome::Created {
                    temp_id,
                    result: call.await,
                }
            }
            .boxed_local()
        }
        SyncJob::Update { id, draft, seq } => {
            let call = backend.update(id, draft);
            async move {
                SyncOutcome::Updated {
                    id,
                    seq,
                    result: call.await,
                }
            }
            .boxed_local()
        }
        SyncJob::Delete { id } => {
            let call = backend.delete(id);
            async move {
                SyncOutcome::Deleted {
                    id,
                    result: call.await,
                }
            }
            .boxed_local()
        }
    }
}
