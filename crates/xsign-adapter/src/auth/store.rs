/*
[INPUT]:  Counter file location or in-memory seed value
[OUTPUT]: Last persisted replay counter text, durable write-back
[POS]:    Auth layer - persistent storage for the replay counter
[UPDATE]: When counter storage format or location changes
*/

use crate::error::{Result, XsignError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage for the last used replay counter
pub trait CounterStore: Send + Sync {
    /// Previously saved value, or `None` when nothing was ever saved
    fn load(&self) -> Result<Option<String>>;

    fn save(&self, value: &str) -> Result<()>;
}

/// Counter kept as decimal text in a single file
#[derive(Debug, Clone)]
pub struct FileCounterStore {
    path: PathBuf,
}

impl FileCounterStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CounterStore for FileCounterStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content.trim().to_string())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(XsignError::config(format!(
                "failed to read counter file {}: {err}",
                self.path.display()
            ))),
        }
    }

    fn save(&self, value: &str) -> Result<()> {
        fs::write(&self.path, value).map_err(|err| {
            XsignError::invalid_state(format!(
                "failed to write counter file {}: {err}",
                self.path.display()
            ))
        })
    }
}

/// Process-local counter, used when no file should be touched
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    value: Mutex<Option<String>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }

    /// Current saved value
    pub fn value(&self) -> Option<String> {
        self.value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl CounterStore for MemoryCounterStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.value())
    }

    fn save(&self, value: &str) -> Result<()> {
        *self
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(value.to_string());
        Ok(())
    }
}
