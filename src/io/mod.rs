pub mod offline;

pub use offline::OfflineStore;
