//! Storage backends for site state and scan history.
//!
//! The traits define the abstract interface; `memory` and `persistent`
//! provide the two implementations.

mod memory;
pub mod persistent;
mod traits;

pub use memory::{InMemoryHistoryLog, InMemoryStateStore};
pub use persistent::{open_stores, CsvHistoryLog, FileLock, JsonStateStore, PersistentStores};
pub use traits::{HistoryLog, StateStore, StorageError};
