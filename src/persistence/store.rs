//! Storage backends for the save envelope

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{PersistedState, PersistenceError, STORAGE_KEY, decode, encode};

/// A place the session can keep its progress
pub trait ProgressStore {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<PersistedState>, PersistenceError>;

    fn save(&mut self, state: &PersistedState) -> Result<(), PersistenceError>;
}

/// In-memory store; clones share the same slot
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with an encoded `state`
    pub fn with_state(state: &PersistedState) -> Result<Self, PersistenceError> {
        let store = Self::new();
        *store.slot.borrow_mut() = Some(encode(state)?);
        Ok(store)
    }

    /// A store holding arbitrary raw text
    pub fn with_raw(raw: impl Into<String>) -> Self {
        let store = Self::new();
        *store.slot.borrow_mut() = Some(raw.into());
        store
    }

    /// The raw stored text
    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Result<Option<PersistedState>, PersistenceError> {
        match self.slot.borrow().as_deref() {
            Some(raw) => decode(raw).map(Some),
            None => Ok(None),
        }
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), PersistenceError> {
        *self.slot.borrow_mut() = Some(encode(state)?);
        Ok(())
    }
}

/// JSON file on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Save file named after the storage key inside `dir`
    pub fn default_path(dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(format!("{}.json", STORAGE_KEY))
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(Self::default_path(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for FileStore {
    fn load(&self) -> Result<Option<PersistedState>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        decode(&raw).map(Some)
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write beside the target then swap, so a crash never leaves half a file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encode(state)?)?;
        fs::rename(&tmp, &self.path)?;
        log::debug!("Saved progress to {:?}", self.path);
        Ok(())
    }
}
