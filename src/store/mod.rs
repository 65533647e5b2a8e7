pub mod adapter;
pub mod sync;
pub mod tasks;

pub use adapter::{ItemStoreAdapter, Settled, SyncResult};
pub use sync::{LogNotifier, Notifier, Session, StaticSession, SyncJob, SyncOutcome, TaskBackend};
pub use tasks::TaskStore;
