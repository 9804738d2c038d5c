//! File-backed save journal.

use std::fs::{create_dir_all, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::DispatchError;

use super::{SaveData, SaveRecord, SaveStore};

/// Appends each save as one JSON line; the last line wins on read.
#[derive(Debug, Clone)]
pub struct JsonFileSaveStore {
    path: PathBuf,
    stream: String,
}

impl JsonFileSaveStore {
    /// Journal `stream` inside directory `path`, creating the directory.
    pub fn new(path: impl AsRef<Path>, stream: impl Into<String>) -> Result<Self, DispatchError> {
        let path = path.as_ref().to_path_buf();
        create_dir_all(&path).map_err(|e| DispatchError::Persistence(e.to_string()))?;
        Ok(Self {
            path,
            stream: stream.into(),
        })
    }

    /// Journal file location.
    pub fn file_path(&self) -> PathBuf {
        self.path.join(format!("{}_save.jsonl", self.stream))
    }

    /// Every record in the journal, oldest first.
    pub fn records(&self) -> Result<Vec<SaveRecord>, DispatchError> {
        let file_path = self.file_path();
        if !file_path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new()
            .read(true)
            .open(&file_path)
            .map_err(|e| DispatchError::Persistence(e.to_string()))?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| DispatchError::Persistence(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: SaveRecord =
                serde_json::from_str(&line).map_err(|e| DispatchError::Persistence(e.to_string()))?;
            records.push(record);
        }
        Ok(records)
    }
}

impl SaveStore for JsonFileSaveStore {
    fn write(&mut self, data: &SaveData) -> Result<(), DispatchError> {
        let file_path = self.file_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .map_err(|e| DispatchError::Persistence(e.to_string()))?;
        let line = serde_json::to_string(&SaveRecord::now(data.clone()))
            .map_err(|e| DispatchError::Persistence(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| DispatchError::Persistence(e.to_string()))?;
        debug!(path = %file_path.display(), tasks = data.tasks.len(), "state saved");
        Ok(())
    }

    fn read_latest(&self) -> Result<Option<SaveRecord>, DispatchError> {
        Ok(self.records()?.pop())
    }
}
