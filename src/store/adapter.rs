use std::rc::Rc;

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::interaction::DragUpdate;
use crate::model::{visible_items, Task, TaskDraft, TaskFilter, ViewWindow};
use crate::store::sync::{
    dispatch, LogNotifier, Notifier, Session, StaticSession, SyncJob, SyncOutcome, TaskBackend,
};
use crate::store::tasks::{FollowUp, TaskStore};

/// How a backend response was folded into local state.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    Created(Task),
    Updated(Task),
    Deleted(Uuid),
    /// An older response arrived after a newer update was issued.
    Stale(Uuid),
    /// The item disappeared locally before the response arrived.
    Dropped(Uuid),
}

pub type SyncResult = Result<Settled, PersistenceError>;

/// Optimistic front for the task collection.
///
/// Every operation mutates memory first and unconditionally, then, if a
/// backend is configured and the session allows it, persists remotely.
/// Remote failures never roll local state back; they are logged, sent to
/// the notifier and returned to the caller.
pub struct ItemStoreAdapter {
    store: TaskStore,
    backend: Option<Rc<dyn TaskBackend>>,
    session: Rc<dyn Session>,
    notifier: Rc<dyn Notifier>,
    pool: LocalPool,
    spawner: LocalSpawner,
    outcomes_tx: UnboundedSender<SyncOutcome>,
    outcomes_rx: UnboundedReceiver<SyncOutcome>,
    in_flight: usize,
}

impl ItemStoreAdapter {
    /// An adapter with no backend: all operations are local only.
    pub fn offline(tasks: Vec<Task>) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        let (outcomes_tx, outcomes_rx) = unbounded();
        Self {
            store: TaskStore::new(tasks),
            backend: None,
            session: Rc::new(StaticSession(false)),
            notifier: Rc::new(LogNotifier),
            pool,
            spawner,
            outcomes_tx,
            outcomes_rx,
            in_flight: 0,
        }
    }

    pub fn with_backend(mut self, backend: Rc<dyn TaskBackend>, session: Rc<dyn Session>) -> Self {
        self.backend = Some(backend);
        self.session = session;
        self
    }

    pub fn with_notifier(mut self, notifier: Rc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.store.get(id)
    }

    /// Like [`get`](Self::get), but also follows a temporary id whose
    /// create has settled. Hosts holding ids across frames use this.
    pub fn find(&self, id: Uuid) -> Option<&Task> {
        self.store.find(id)
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Whether remote calls are made right now.
    pub fn is_online(&self) -> bool {
        self.remote().is_some()
    }

    /// Number of backend calls that have not been folded back yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn visible_items<'a>(
        &'a self,
        filter: &'a TaskFilter,
        window: &'a ViewWindow,
    ) -> impl Iterator<Item = &'a Task> + 'a {
        visible_items(self.store.tasks(), filter, window)
    }

    fn remote(&self) -> Option<Rc<dyn TaskBackend>> {
        if self.session.backend_available() {
            self.backend.clone()
        } else {
            None
        }
    }

    // --- Optimistic local mutations ---

    /// Live drag path: memory only, no persistence.
    pub fn apply_drag(&mut self, update: DragUpdate) -> Option<Task> {
        let mut task = self.store.find(update.task_id)?.clone();
        update.apply_to(&mut task);
        self.store.replace_local(&task)
    }

    fn create_local(&mut self, draft: TaskDraft) -> (Task, Option<SyncJob>) {
        let task = self.store.insert_local(draft);
        info!(id = %task.id, title = %task.title, "task created locally");
        if self.remote().is_none() {
            return (task, None);
        }
        self.store.mark_pending_create(task.id);
        let job = SyncJob::Create {
            temp_id: task.id,
            draft: task.draft(),
        };
        (task, Some(job))
    }

    fn update_local(&mut self, task: &Task) -> Option<Option<SyncJob>> {
        let stored = self.store.replace_local(task)?;
        info!(id = %stored.id, start = %stored.start, end = %stored.end, "task updated locally");
        // Updates to an id the server has not confirmed yet are sent once the
        // create settles.
        if self.remote().is_none() || self.store.is_pending_create(stored.id) {
            return Some(None);
        }
        if self.store.take_unsynced(stored.id) {
            info!(id = %stored.id, "re-sending rejected create");
            self.store.mark_pending_create(stored.id);
            return Some(Some(SyncJob::Create {
                temp_id: stored.id,
                draft: stored.draft(),
            }));
        }
        let seq = self.store.next_update_seq(stored.id);
        Some(Some(SyncJob::Update {
            id: stored.id,
            draft: stored.draft(),
            seq,
        }))
    }

    fn delete_local(&mut self, id: Uuid) -> Option<Option<SyncJob>> {
        let id = self.store.resolve(id);
        let pending = self.store.is_pending_create(id);
        let removed = self.store.remove_local(id)?;
        let local_only = self.store.take_unsynced(id);
        info!(id = %id, title = %removed.title, "task deleted locally");
        if self.remote().is_none() || pending || local_only {
            return Some(None);
        }
        Some(Some(SyncJob::Delete { id }))
    }

    // --- Queued persistence (non-blocking) ---

    /// Insert immediately; the create call runs on the next [`poll`](Self::poll).
    pub fn submit_create(&mut self, draft: TaskDraft) -> Task {
        let (task, job) = self.create_local(draft);
        if let Some(job) = job {
            self.spawn(job);
        }
        task
    }

    /// Returns false when no task with that id exists.
    pub fn submit_update(&mut self, task: &Task) -> bool {
        match self.update_local(task) {
            Some(job) => {
                if let Some(job) = job {
                    self.spawn(job);
                }
                true
            }
            None => false,
        }
    }

    pub fn submit_delete(&mut self, id: Uuid) -> bool {
        match self.delete_local(id) {
            Some(job) => {
                if let Some(job) = job {
                    self.spawn(job);
                }
                true
            }
            None => false,
        }
    }

    fn spawn(&mut self, job: SyncJob) {
        let Some(backend) = self.remote() else {
            return;
        };
        let call = dispatch(backend.as_ref(), job);
        let tx = self.outcomes_tx.clone();
        let spawned = self.spawner.spawn_local(async move {
            // The receiver lives as long as the adapter.
            let _ = tx.unbounded_send(call.await);
        });
        match spawned {
            Ok(()) => self.in_flight += 1,
            Err(e) => {
                warn!(error = %e, "failed to schedule backend call");
                self.notifier.error(&PersistenceError::Cancelled.to_string());
            }
        }
    }

    /// Drive queued backend calls and fold finished ones into local state.
    pub fn poll(&mut self) -> Vec<SyncResult> {
        self.pool.run_until_stalled();
        let mut results = Vec::new();
        while let Ok(Some(outcome)) = self.outcomes_rx.try_next() {
            self.in_flight = self.in_flight.saturating_sub(1);
            results.push(self.apply_outcome(outcome));
        }
        results
    }

    // --- Awaited persistence ---

    /// Create and wait for the backend. Offline, this returns the local task.
    pub async fn create_item(&mut self, draft: TaskDraft) -> Result<Task, PersistenceError> {
        let (task, job) = self.create_local(draft);
        let Some(job) = job else {
            return Ok(task);
        };
        match self.run(job).await? {
            Settled::Created(confirmed) => Ok(confirmed),
            _ => Ok(task),
        }
    }

    pub async fn update_item(&mut self, task: &Task) -> Result<Task, PersistenceError> {
        let job = self
            .update_local(task)
            .ok_or(PersistenceError::NotFound(task.id))?;
        let Some(job) = job else {
            return Ok(task.clone());
        };
        match self.run(job).await? {
            Settled::Updated(confirmed) | Settled::Created(confirmed) => Ok(confirmed),
            _ => Ok(task.clone()),
        }
    }

    pub async fn delete_item(&mut self, id: Uuid) -> Result<(), PersistenceError> {
        let job = self.delete_local(id).ok_or(PersistenceError::NotFound(id))?;
        if let Some(job) = job {
            self.run(job).await?;
        }
        Ok(())
    }

    async fn run(&mut self, job: SyncJob) -> SyncResult {
        let Some(backend) = self.remote() else {
            return Err(PersistenceError::Cancelled);
        };
        let outcome = dispatch(backend.as_ref(), job).await;
        self.apply_outcome(outcome)
    }

    /// Fold a backend response into local state and notify the user.
    pub fn apply_outcome(&mut self, outcome: SyncOutcome) -> SyncResult {
        let result = match outcome {
            SyncOutcome::Created { temp_id, result: Err(e) } => {
                let kept = self.store.fail_create(temp_id);
                debug!(temp = %temp_id, kept, "create rejected; item stays local");
                Err(e)
            }
            SyncOutcome::Created { temp_id, result: Ok(record) } => {
                Ok(self.settle_created(temp_id, record))
            }
            SyncOutcome::Updated { id, seq, result } => result.map(|record| {
                if self.store.is_stale(id, seq) {
                    return Settled::Stale(id);
                }
                match self.store.settle_update(seq, record) {
                    Some(task) => Settled::Updated(task),
                    None => Settled::Dropped(id),
                }
            }),
            SyncOutcome::Deleted { id, result } => result.map(|()| {
                self.store.settle_delete(id);
                self.notifier.success("Task deleted");
                Settled::Deleted(id)
            }),
        };

        if let Err(e) = &result {
            warn!(error = %e, "backend call failed; keeping local state");
            self.notifier.error(&format!("Could not save changes: {e}"));
        }
        result
    }

    fn settle_created(&mut self, temp_id: Uuid, record: Task) -> Settled {
        let authoritative = record.id;
        let (settled, follow_up) = self.store.settle_create(temp_id, record);
        match follow_up {
            FollowUp::None => {}
            FollowUp::Update(task) => {
                let seq = self.store.next_update_seq(task.id);
                self.spawn(SyncJob::Update {
                    id: task.id,
                    draft: task.draft(),
                    seq,
                });
            }
            FollowUp::Delete(id) => self.spawn(SyncJob::Delete { id }),
        }
        match settled {
            Some(task) => {
                info!(temp = %temp_id, id = %task.id, "task create confirmed");
                self.notifier.success(&format!("Created '{}'", task.title));
                Settled::Created(task)
            }
            None => Settled::Dropped(authoritative),
        }
    }
}
