//! In-memory save backend.

use crate::core::DispatchError;

use super::{SaveData, SaveRecord, SaveStore};

/// Keeps saves in memory, newest last.
#[derive(Debug)]
pub struct InMemorySaveStore {
    records: Vec<SaveRecord>,
    max_records: usize,
}

impl InMemorySaveStore {
    /// Keep at most `max_records` saves; zero keeps one.
    pub fn new(max_records: usize) -> Self {
        Self {
            records: Vec::new(),
            max_records: max_records.max(1),
        }
    }

    /// Number of stored saves.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing was saved.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SaveStore for InMemorySaveStore {
    fn write(&mut self, data: &SaveData) -> Result<(), DispatchError> {
        if self.records.len() >= self.max_records {
            self.records.remove(0);
        }
        self.records.push(SaveRecord::now(data.clone()));
        Ok(())
    }

    fn read_latest(&self) -> Result<Option<SaveRecord>, DispatchError> {
        Ok(self.records.last().cloned())
    }
}
