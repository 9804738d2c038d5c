//! Infrastructure adapters for persisting orchestrator state.

pub mod save;

pub use save::{InMemorySaveStore, JsonFileSaveStore, SaveRecord, SaveStore};
