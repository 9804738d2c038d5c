//! Save backends.

pub mod file;
pub mod memory;

use serde::{Deserialize, Serialize};

pub use crate::core::orchestrator::SaveData;
pub use crate::core::region::RegionSave;
pub use crate::core::task::TaskSave;
use crate::core::DispatchError;
use crate::util::clock::now_ms;

pub use file::JsonFileSaveStore;
pub use memory::InMemorySaveStore;

/// One stored save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    /// Milliseconds since the Unix epoch.
    pub saved_at_ms: u128,
    /// Saved state.
    pub data: SaveData,
}

impl SaveRecord {
    /// Stamp `data` with the current time.
    pub fn now(data: SaveData) -> Self {
        Self {
            saved_at_ms: now_ms(),
            data,
        }
    }
}

/// Where orchestrator state is written to and read back from.
pub trait SaveStore: Send {
    /// Store a new save.
    fn write(&mut self, data: &SaveData) -> Result<(), DispatchError>;

    /// Most recent save, if any.
    fn read_latest(&self) -> Result<Option<SaveRecord>, DispatchError>;
}
