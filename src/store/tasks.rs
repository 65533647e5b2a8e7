use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::model::{Task, TaskDraft};

/// Local changes made to an item while its create call was in flight.
#[derive(Debug, Default, Clone, Copy)]
struct PendingCreate {
    edited: bool,
    deleted: bool,
}

/// Work the store needs sent after a create is reconciled.
#[derive(Debug, Clone, PartialEq)]
pub enum FollowUp {
    None,
    /// Local edits made during the create must be pushed under the new id.
    Update(Task),
    /// The item was deleted locally before the server knew its id.
    Delete(Uuid),
}

/// The in-memory task collection plus reconciliation bookkeeping.
///
/// Every mutation goes through this type so that temporary ids and
/// update ordering stay consistent.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    pending_creates: HashMap<Uuid, PendingCreate>,
    /// Temporary id -> authoritative id, for callers still holding the former.
    aliases: HashMap<Uuid, Uuid>,
    /// Items whose create was rejected; they exist only locally.
    unsynced: HashSet<Uuid>,
    latest_update: HashMap<Uuid, u64>,
    next_seq: u64,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            ..Default::default()
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Exact lookup; a temporary id stops matching once its create settles.
    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The current id for `id`, following a settled temporary id.
    pub fn resolve(&self, id: Uuid) -> Uuid {
        self.aliases.get(&id).copied().unwrap_or(id)
    }

    /// Lookup that also accepts a settled temporary id.
    pub fn find(&self, id: Uuid) -> Option<&Task> {
        self.get(self.resolve(id))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Insert a draft under a fresh temporary id.
    pub fn insert_local(&mut self, draft: TaskDraft) -> Task {
        let task = Task::from_draft(Uuid::new_v4(), draft);
        self.tasks.push(task.clone());
        task
    }

    /// Replace the stored task with the same (possibly temporary) id.
    ///
    /// Returns the stored copy, which carries the current id.
    pub fn replace_local(&mut self, task: &Task) -> Option<Task> {
        let id = self.resolve(task.id);
        let slot = self.tasks.iter_mut().find(|t| t.id == id)?;
        *slot = Task { id, ..task.clone() };
        let stored = slot.clone();
        if let Some(pending) = self.pending_creates.get_mut(&id) {
            pending.edited = true;
        }
        Some(stored)
    }

    pub fn remove_local(&mut self, id: Uuid) -> Option<Task> {
        let id = self.resolve(id);
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        if let Some(pending) = self.pending_creates.get_mut(&id) {
            pending.deleted = true;
        }
        Some(self.tasks.remove(idx))
    }

    pub fn mark_pending_create(&mut self, temp_id: Uuid) {
        self.pending_creates.insert(temp_id, PendingCreate::default());
    }

    /// True while the id is still a temporary one awaiting the server.
    pub fn is_pending_create(&self, id: Uuid) -> bool {
        self.pending_creates.contains_key(&id)
    }

    /// Forget a create the backend rejected.
    ///
    /// The item, if still present, stays local-only until it is next edited,
    /// which re-sends the create. Returns whether it is still present.
    pub fn fail_create(&mut self, temp_id: Uuid) -> bool {
        self.pending_creates.remove(&temp_id);
        let present = self.get(temp_id).is_some();
        if present {
            self.unsynced.insert(temp_id);
        }
        present
    }

    /// True for items the backend has never accepted.
    pub fn is_unsynced(&self, id: Uuid) -> bool {
        self.unsynced.contains(&id)
    }

    /// Clear the local-only mark, returning whether it was set.
    pub fn take_unsynced(&mut self, id: Uuid) -> bool {
        self.unsynced.remove(&id)
    }

    /// Issue the next sequence number for an update of `id`.
    pub fn next_update_seq(&mut self, id: Uuid) -> u64 {
        self.next_seq += 1;
        self.latest_update.insert(id, self.next_seq);
        self.next_seq
    }

    /// A response is stale when a newer update for the same id was issued.
    pub fn is_stale(&self, id: Uuid, seq: u64) -> bool {
        self.latest_update.get(&id).is_some_and(|latest| seq < *latest)
    }

    /// Swap the temporary entry for the authoritative record.
    ///
    /// Returns the reconciled task (if it is still present) and any
    /// follow-up call needed to converge with the server.
    pub fn settle_create(&mut self, temp_id: Uuid, record: Task) -> (Option<Task>, FollowUp) {
        let pending = self.pending_creates.remove(&temp_id).unwrap_or_default();
        if pending.deleted {
            debug!(temp = %temp_id, id = %record.id, "created item was deleted locally");
            return (None, FollowUp::Delete(record.id));
        }

        let Some(slot) = self.tasks.iter_mut().find(|t| t.id == temp_id) else {
            warn!(temp = %temp_id, "created item no longer in store");
            return (None, FollowUp::None);
        };
        self.aliases.insert(temp_id, record.id);
        if pending.edited {
            slot.id = record.id;
            let local = slot.clone();
            (Some(local.clone()), FollowUp::Update(local))
        } else {
            *slot = record.clone();
            (Some(record), FollowUp::None)
        }
    }

    /// Apply a server-normalized record from an update response.
    pub fn settle_update(&mut self, seq: u64, record: Task) -> Option<Task> {
        if self.is_stale(record.id, seq) {
            debug!(id = %record.id, seq, "discarding stale update response");
            return None;
        }
        let slot = self.tasks.iter_mut().find(|t| t.id == record.id)?;
        *slot = record.clone();
        Some(record)
    }

    pub fn settle_delete(&mut self, id: Uuid) {
        self.latest_update.remove(&id);
        self.aliases.retain(|_, target| *target != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draft(title: &str) -> TaskDraft {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        TaskDraft::new(title, day, day)
    }

    #[test]
    fn create_reconciles_to_authoritative_id() {
        let mut store = TaskStore::default();
        let local = store.insert_local(draft("Book flights"));
        store.mark_pending_create(local.id);

        let record = Task::from_draft(Uuid::new_v4(), draft("Book flights"));
        let (settled, follow_up) = store.settle_create(local.id, record.clone());

        assert_eq!(settled, Some(record.clone()));
        assert_eq!(follow_up, FollowUp::None);
        assert!(store.get(local.id).is_none());
        assert_eq!(store.get(record.id), Some(&record));
        assert!(!store.is_pending_create(local.id));
    }

    #[test]
    fn edits_during_create_win_and_follow_up() {
        let mut store = TaskStore::default();
        let mut local = store.insert_local(draft("Draft"));
        store.mark_pending_create(local.id);
        local.title = "Edited".into();
        assert!(store.replace_local(&local).is_some());

        let record = Task::from_draft(Uuid::new_v4(), draft("Draft"));
        let (settled, follow_up) = store.settle_create(local.id, record.clone());
        let settled = settled.unwrap();
        assert_eq!(settled.id, record.id);
        assert_eq!(settled.title, "Edited");
        assert_eq!(follow_up, FollowUp::Update(settled));
    }

    #[test]
    fn delete_during_create_follows_up_with_delete() {
        let mut store = TaskStore::default();
        let local = store.insert_local(draft("Oops"));
        store.mark_pending_create(local.id);
        assert!(store.remove_local(local.id).is_some());

        let record = Task::from_draft(Uuid::new_v4(), draft("Oops"));
        let (settled, follow_up) = store.settle_create(local.id, record.clone());
        assert_eq!(settled, None);
        assert_eq!(follow_up, FollowUp::Delete(record.id));
        assert!(store.is_empty());
    }

    #[test]
    fn older_update_responses_are_stale() {
        let task = Task::from_draft(Uuid::new_v4(), draft("Essay"));
        let mut store = TaskStore::new(vec![task.clone()]);
        let first = store.next_update_seq(task.id);
        let second = store.next_update_seq(task.id);
        assert!(store.is_stale(task.id, first));
        assert!(!store.is_stale(task.id, second));

        let mut old = task.clone();
        old.title = "old".into();
        assert_eq!(store.settle_update(first, old), None);
        assert_eq!(store.get(task.id).unwrap().title, "Essay");

        let mut new = task.clone();
        new.title = "new".into();
        assert!(store.settle_update(second, new).is_some());
        assert_eq!(store.get(task.id).unwrap().title, "new");
    }

    #[test]
    fn replace_unknown_is_false() {
        let mut store = TaskStore::default();
        let stray = Task::from_draft(Uuid::new_v4(), draft("stray"));
        assert!(store.replace_local(&stray).is_none());
        assert!(store.remove_local(stray.id).is_none());
    }

    #[test]
    fn settled_temporary_id_still_addresses_the_item() {
        let mut store = TaskStore::default();
        let local = store.insert_local(draft("Plan trip"));
        store.mark_pending_create(local.id);
        let record = Task::from_draft(Uuid::new_v4(), draft("Plan trip"));
        store.settle_create(local.id, record.clone());

        assert!(store.get(local.id).is_none());
        assert_eq!(store.find(local.id), Some(&record));

        let mut edited = local.clone();
        edited.title = "Plan holiday".into();
        let stored = store.replace_local(&edited).unwrap();
        assert_eq!(stored.id, record.id);
        assert_eq!(store.get(record.id).unwrap().title, "Plan holiday");
        assert_eq!(store.len(), 1);

        assert_eq!(store.remove_local(local.id).map(|t| t.id), Some(record.id));
        assert!(store.is_empty());
    }

    #[test]
    fn rejected_create_leaves_item_local_only() {
        let mut store = TaskStore::default();
        let local = store.insert_local(draft("Offline idea"));
        store.mark_pending_create(local.id);

        assert!(store.fail_create(local.id));
        assert!(!store.is_pending_create(local.id));
        assert!(store.is_unsynced(local.id));
        assert!(store.take_unsynced(local.id));
        assert!(!store.is_unsynced(local.id));
    }
}
