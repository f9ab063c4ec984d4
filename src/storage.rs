use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SproutsError};

/// Slot holding the serialized task list.
pub const TASKS_SLOT: &str = "plant_care_tasks";
/// Slot holding the serialized plant catalog.
pub const PLANTS_SLOT: &str = "plants";

/// A durable key-value store of whole blobs.
///
/// `read` returns `Ok(None)` when the slot has never been written. `write`
/// replaces the whole slot.
pub trait BlobStore {
    fn read(&self, slot: &str) -> Result<Option<String>>;
    fn write(&mut self, slot: &str, contents: &str) -> Result<()>;
    fn clear(&mut self, slot: &str) -> Result<()>;
}

/// Stores each slot as `<dir>/<slot>.json`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileBlobStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of the file backing `slot`.
    pub fn slot_path(&self, slot: &str) -> PathBuf {
        let name: String = slot
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, slot: &str) -> Result<Option<String>> {
        let path = self.slot_path(slot);
        let mut f = match OpenOptions::new().read(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SproutsError::StorageRead { slot: slot.into(), reason: e.to_string() })
            }
        };
        let mut s = String::new();
        f.read_to_string(&mut s)
            .map_err(|e| SproutsError::StorageRead { slot: slot.into(), reason: e.to_string() })?;
        Ok(Some(s))
    }

    /// Writes to a sibling temp file and renames it over the slot, so a
    /// reader never sees a half-written blob.
    fn write(&mut self, slot: &str, contents: &str) -> Result<()> {
        let to_write_err =
            |e: std::io::Error| SproutsError::StorageWrite { slot: slot.into(), reason: e.to_string() };

        fs::create_dir_all(&self.dir).map_err(to_write_err)?;
        let path = self.slot_path(slot);
        let tmp = path.with_extension("json.tmp");
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .map_err(to_write_err)?;
        f.write_all(contents.as_bytes()).map_err(to_write_err)?;
        f.sync_all().map_err(to_write_err)?;
        fs::rename(&tmp, &path).map_err(to_write_err)?;
        Ok(())
    }

    fn clear(&mut self, slot: &str) -> Result<()> {
        let path = self.slot_path(slot);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SproutsError::StorageWrite { slot: slot.into(), reason: e.to_string() }),
        }
    }
}

/// In-process blob store. Clones share the same slots, so a test can keep a
/// handle to inspect what a store persisted or inject failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    slots: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a slot.
    pub fn with_slot(self, slot: &str, contents: &str) -> Self {
        self.state().slots.insert(slot.into(), contents.into());
        self
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Current contents of a slot.
    pub fn get(&self, slot: &str) -> Option<String> {
        self.state().slots.get(slot).cloned()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, slot: &str) -> Result<Option<String>> {
        let state = self.state();
        if state.fail_reads {
            return Err(SproutsError::StorageRead { slot: slot.into(), reason: "read failure injected".into() });
        }
        Ok(state.slots.get(slot).cloned())
    }

    fn write(&mut self, slot: &str, contents: &str) -> Result<()> {
        let mut state = self.state();
        if state.fail_writes {
            return Err(SproutsError::StorageWrite { slot: slot.into(), reason: "write failure injected".into() });
        }
        state.slots.insert(slot.into(), contents.into());
        state.writes += 1;
        Ok(())
    }

    fn clear(&mut self, slot: &str) -> Result<()> {
        self.state().slots.remove(slot);
        Ok(())
    }
}

/// Reads a slot holding a JSON array. An absent slot is an empty collection.
pub fn load_collection<T, B>(backend: &B, slot: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    B: BlobStore + ?Sized,
{
    match backend.read(slot)? {
        None => Ok(Vec::new()),
        Some(s) if s.trim().is_empty() => Ok(Vec::new()),
        Some(s) => serde_json::from_str(&s)
            .map_err(|e| SproutsError::StorageRead { slot: slot.into(), reason: e.to_string() }),
    }
}

/// Overwrites a slot with the whole collection.
pub fn save_collection<T, B>(backend: &mut B, slot: &str, items: &[T]) -> Result<()>
where
    T: Serialize,
    B: BlobStore + ?Sized,
{
    let s = serde_json::to_string_pretty(items)
        .map_err(|e| SproutsError::StorageWrite { slot: slot.into(), reason: e.to_string() })?;
    backend.write(slot, &s)
}

impl<B: BlobStore + ?Sized> BlobStore for Box<B> {
    fn read(&self, slot: &str) -> Result<Option<String>> {
        (**self).read(slot)
    }

    fn write(&mut self, slot: &str, contents: &str) -> Result<()> {
        (**self).write(slot, contents)
    }

    fn clear(&mut self, slot: &str) -> Result<()> {
        (**self).clear(slot)
    }
}
