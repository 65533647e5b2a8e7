//! Optimistic store behaviour against a scripted backend.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use chrono::NaiveDate;
use futures::channel::oneshot;
use futures::executor::block_on;
use futures::future::{FutureExt, LocalBoxFuture};
use timeline_planner::store::{Notifier, Settled, StaticSession, TaskBackend};
use timeline_planner::{ItemStoreAdapter, PersistenceError, Task, TaskDraft};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[derive(Default)]
struct BackendState {
    calls: Vec<String>,
    fail: Option<PersistenceError>,
    /// Each call takes the next gate, if any, and waits for it to fire.
    gates: VecDeque<oneshot::Receiver<()>>,
}

#[derive(Clone, Default)]
struct FakeBackend {
    state: Rc<RefCell<BackendState>>,
}

impl FakeBackend {
    fn failing(error: PersistenceError) -> Self {
        let backend = Self::default();
        backend.state.borrow_mut().fail = Some(error);
        backend
    }

    fn recover(&self) {
        self.state.borrow_mut().fail = None;
    }

    fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.borrow_mut().gates.push_back(rx);
        tx
    }

    fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    fn respond<T: 'static>(
        &self,
        call: String,
        ok: impl FnOnce() -> T + 'static,
    ) -> LocalBoxFuture<'static, Result<T, PersistenceError>> {
        let gate = {
            let mut state = self.state.borrow_mut();
            state.calls.push(call);
            state.gates.pop_front()
        };
        let state = self.state.clone();
        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            match state.borrow().fail.clone() {
                Some(e) => Err(e),
                None => Ok(ok()),
            }
        }
        .boxed_local()
    }
}

impl TaskBackend for FakeBackend {
    fn create(&self, draft: TaskDraft) -> LocalBoxFuture<'static, Result<Task, PersistenceError>> {
        self.respond(format!("create {}", draft.title), move || {
            Task::from_draft(Uuid::new_v4(), draft)
        })
    }

    fn update(
        &self,
        id: Uuid,
        draft: TaskDraft,
    ) -> LocalBoxFuture<'static, Result<Task, PersistenceError>> {
        self.respond(format!("update {id}"), move || Task::from_draft(id, draft))
    }

    fn delete(&self, id: Uuid) -> LocalBoxFuture<'static, Result<(), PersistenceError>> {
        self.respond(format!("delete {id}"), || ())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    successes: RefCell<Vec<String>>,
    errors: RefCell<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.borrow_mut().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }
}

fn online(
    tasks: Vec<Task>,
    backend: &FakeBackend,
) -> (ItemStoreAdapter, Rc<RecordingNotifier>) {
    let notifier = Rc::new(RecordingNotifier::default());
    let adapter = ItemStoreAdapter::offline(tasks)
        .with_backend(Rc::new(backend.clone()), Rc::new(StaticSession(true)))
        .with_notifier(notifier.clone());
    (adapter, notifier)
}

fn existing() -> Task {
    Task::new("Existing", date(2024, 6, 10), date(2024, 6, 12))
}

#[test]
fn create_replaces_temporary_id_with_server_id() {
    let backend = FakeBackend::default();
    let (mut adapter, notifier) = online(Vec::new(), &backend);

    let temp = adapter.submit_create(TaskDraft::new("Write report", date(2024, 6, 1), date(2024, 6, 3)));
    assert!(adapter.store().is_pending_create(temp.id));
    assert_eq!(adapter.in_flight(), 1);

    let results = adapter.poll();
    let Ok(Settled::Created(created)) = &results[0] else {
        panic!("unexpected result: {results:?}");
    };
    assert_ne!(created.id, temp.id);
    assert!(adapter.get(created.id).is_some());
    assert!(adapter.get(temp.id).is_none());
    assert_eq!(adapter.tasks().len(), 1);
    assert_eq!(adapter.in_flight(), 0);
    assert_eq!(*notifier.successes.borrow(), vec!["Created 'Write report'".to_string()]);
}

#[test]
fn awaited_create_returns_authoritative_record() {
    let backend = FakeBackend::default();
    let (mut adapter, _) = online(Vec::new(), &backend);

    let created = block_on(adapter.create_item(TaskDraft::new("Call", date(2024, 6, 4), date(2024, 6, 4)))).unwrap();

    assert_eq!(adapter.tasks().len(), 1);
    assert_eq!(adapter.tasks()[0].id, created.id);
    assert!(!adapter.store().is_pending_create(created.id));
}

#[test]
fn failed_update_keeps_optimistic_dates_and_notifies() {
    let task = existing();
    let backend = FakeBackend::failing(PersistenceError::Network("offline".into()));
    let (mut adapter, notifier) = online(vec![task.clone()], &backend);

    let mut edited = task.clone();
    edited.start = date(2024, 6, 15);
    edited.end = date(2024, 6, 17);
    let err = block_on(adapter.update_item(&edited)).unwrap_err();

    assert_eq!(err, PersistenceError::Network("offline".into()));
    let stored = adapter.get(task.id).unwrap();
    assert_eq!((stored.start, stored.end), (edited.start, edited.end));
    assert_eq!(
        *notifier.errors.borrow(),
        vec!["Could not save changes: network error: offline".to_string()]
    );
}

#[test]
fn failed_delete_does_not_restore_the_item() {
    let task = existing();
    let backend = FakeBackend::failing(PersistenceError::Rejected {
        status: 500,
        message: "boom".into(),
    });
    let (mut adapter, notifier) = online(vec![task.clone()], &backend);

    assert!(block_on(adapter.delete_item(task.id)).is_err());
    assert!(adapter.get(task.id).is_none());
    assert_eq!(notifier.errors.borrow().len(), 1);
}

#[test]
fn update_of_unknown_item_is_not_found() {
    let backend = FakeBackend::default();
    let (mut adapter, _) = online(Vec::new(), &backend);
    let ghost = existing();

    let err = block_on(adapter.update_item(&ghost)).unwrap_err();

    assert_eq!(err, PersistenceError::NotFound(ghost.id));
    assert!(backend.calls().is_empty());
}

#[test]
fn signed_out_session_stays_local() {
    let backend = FakeBackend::default();
    let mut adapter = ItemStoreAdapter::offline(Vec::new())
        .with_backend(Rc::new(backend.clone()), Rc::new(StaticSession(false)));
    assert!(!adapter.is_online());

    let local = block_on(adapter.create_item(TaskDraft::new("Local", date(2024, 6, 1), date(2024, 6, 2)))).unwrap();
    let mut moved = local.clone();
    moved.end = date(2024, 6, 5);
    assert!(adapter.submit_update(&moved));

    assert!(backend.calls().is_empty());
    assert_eq!(adapter.in_flight(), 0);
    assert_eq!(adapter.get(local.id).unwrap().end, date(2024, 6, 5));
}

#[test]
fn stale_update_response_is_discarded() {
    let task = existing();
    let backend = FakeBackend::default();
    let first_gate = backend.gate();
    let second_gate = backend.gate();
    let (mut adapter, _) = online(vec![task.clone()], &backend);

    let mut first = task.clone();
    first.end = date(2024, 6, 13);
    let mut second = task.clone();
    second.end = date(2024, 6, 20);
    adapter.submit_update(&first);
    adapter.submit_update(&second);
    assert!(adapter.poll().is_empty());

    let _ = second_gate.send(());
    let results = adapter.poll();
    assert!(matches!(&results[..], [Ok(Settled::Updated(t))] if t.end == date(2024, 6, 20)));

    let _ = first_gate.send(());
    let results = adapter.poll();
    assert_eq!(results, vec![Ok(Settled::Stale(task.id))]);
    assert_eq!(adapter.get(task.id).unwrap().end, date(2024, 6, 20));
    assert_eq!(adapter.in_flight(), 0);
}

#[test]
fn edit_during_inflight_create_is_pushed_after_reconcile() {
    let backend = FakeBackend::default();
    let gate = backend.gate();
    let (mut adapter, _) = online(Vec::new(), &backend);

    let temp = adapter.submit_create(TaskDraft::new("Draft", date(2024, 6, 1), date(2024, 6, 1)));
    let mut edited = temp.clone();
    edited.title = "Edited".into();
    edited.end = date(2024, 6, 4);
    assert!(adapter.submit_update(&edited));
    assert!(adapter.poll().is_empty());

    let _ = gate.send(());
    let results = adapter.poll();
    let Ok(Settled::Created(created)) = &results[0] else {
        panic!("unexpected result: {results:?}");
    };
    assert_eq!(created.title, "Edited");
    assert_eq!(created.end, date(2024, 6, 4));
    let server_id = created.id;

    let results = adapter.poll();
    assert!(matches!(&results[..], [Ok(Settled::Updated(t))] if t.id == server_id));
    assert_eq!(
        backend.calls(),
        vec!["create Draft".to_string(), format!("update {server_id}")]
    );
    assert_eq!(adapter.get(server_id).unwrap().title, "Edited");
}

#[test]
fn delete_during_inflight_create_deletes_server_record() {
    let backend = FakeBackend::default();
    let gate = backend.gate();
    let (mut adapter, _) = online(Vec::new(), &backend);

    let temp = adapter.submit_create(TaskDraft::new("Oops", date(2024, 6, 1), date(2024, 6, 1)));
    assert!(adapter.submit_delete(temp.id));
    assert!(adapter.tasks().is_empty());

    let _ = gate.send(());
    let results = adapter.poll();
    let Ok(Settled::Dropped(server_id)) = results[0].clone() else {
        panic!("unexpected result: {results:?}");
    };

    assert_eq!(adapter.poll(), vec![Ok(Settled::Deleted(server_id))]);
    assert_eq!(backend.calls()[1], format!("delete {server_id}"));
    assert!(adapter.tasks().is_empty());
    assert_eq!(adapter.in_flight(), 0);
}

#[test]
fn temporary_id_still_saves_and_deletes_after_reconcile() {
    let backend = FakeBackend::default();
    let (mut adapter, _) = online(Vec::new(), &backend);

    // The editor was opened on the optimistic copy before the create settled.
    let temp = adapter.submit_create(TaskDraft::new("Kickoff", date(2024, 6, 3), date(2024, 6, 4)));
    let results = adapter.poll();
    let Ok(Settled::Created(created)) = &results[0] else {
        panic!("unexpected result: {results:?}");
    };
    let server_id = created.id;

    let mut renamed = temp.clone();
    renamed.title = "Kickoff meeting".into();
    assert!(adapter.submit_update(&renamed));
    assert_eq!(adapter.find(temp.id).unwrap().id, server_id);
    assert_eq!(adapter.get(server_id).unwrap().title, "Kickoff meeting");
    assert!(adapter.get(temp.id).is_none());
    assert_eq!(adapter.tasks().len(), 1);

    let results = adapter.poll();
    assert!(matches!(&results[..], [Ok(Settled::Updated(t))] if t.id == server_id));

    assert!(adapter.submit_delete(temp.id));
    assert!(adapter.tasks().is_empty());
    assert_eq!(adapter.poll(), vec![Ok(Settled::Deleted(server_id))]);
    assert_eq!(
        backend.calls(),
        vec![
            "create Kickoff".to_string(),
            format!("update {server_id}"),
            format!("delete {server_id}"),
        ]
    );
}

#[test]
fn rejected_create_stays_local_and_is_resent_on_next_edit() {
    let backend = FakeBackend::failing(PersistenceError::Network("offline".into()));
    let (mut adapter, notifier) = online(Vec::new(), &backend);

    let temp = adapter.submit_create(TaskDraft::new("Retro", date(2024, 6, 7), date(2024, 6, 7)));
    let results = adapter.poll();
    assert_eq!(results, vec![Err(PersistenceError::Network("offline".into()))]);
    assert!(!adapter.store().is_pending_create(temp.id));
    assert!(adapter.store().is_unsynced(temp.id));
    assert!(adapter.get(temp.id).is_some());
    assert_eq!(adapter.in_flight(), 0);
    assert_eq!(notifier.errors.borrow().len(), 1);

    backend.recover();
    let mut edited = temp.clone();
    edited.end = date(2024, 6, 8);
    assert!(adapter.submit_update(&edited));
    assert!(adapter.store().is_pending_create(temp.id));

    let results = adapter.poll();
    let Ok(Settled::Created(created)) = &results[0] else {
        panic!("unexpected result: {results:?}");
    };
    assert_eq!(created.end, date(2024, 6, 8));
    assert_eq!(
        backend.calls(),
        vec!["create Retro".to_string(), "create Retro".to_string()]
    );
    assert_eq!(adapter.tasks().len(), 1);
    assert!(!adapter.store().is_unsynced(created.id));
}

#[test]
fn deleting_a_rejected_create_skips_the_backend() {
    let backend = FakeBackend::failing(PersistenceError::Network("offline".into()));
    let (mut adapter, notifier) = online(Vec::new(), &backend);

    let temp = adapter.submit_create(TaskDraft::new("Scratch", date(2024, 6, 7), date(2024, 6, 7)));
    assert_eq!(adapter.poll().len(), 1);

    assert!(adapter.submit_delete(temp.id));
    assert!(adapter.tasks().is_empty());
    assert_eq!(adapter.in_flight(), 0);
    assert_eq!(backend.calls(), vec!["create Scratch".to_string()]);
    assert_eq!(notifier.errors.borrow().len(), 1);
}
