//! Persistence media for a single session key
//!
//! A medium holds one whole value and supports overwrite and removal. No
//! incremental writes or cross-process locking are assumed.

use parking_lot::Mutex;
use std::fmt::Debug;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::utils::safe_filename;

/// Storage for the serialized form of one session
pub trait SessionMedium: Debug + Send + Sync {
    /// Read the stored value; `Ok(None)` when nothing is stored
    fn read(&self) -> crate::Result<Option<String>>;

    /// Overwrite the stored value
    fn write(&self, contents: &str) -> crate::Result<()>;

    /// Remove the stored value; removing an absent value is not an error
    fn remove(&self) -> crate::Result<()>;
}

/// A JSON file under a sessions directory, one file per key
#[derive(Debug, Clone)]
pub struct FileMedium {
    path: PathBuf,
}

impl FileMedium {
    /// Create a medium for `key` inside `dir`
    pub fn new<P: AsRef<Path>>(dir: P, key: &str) -> Self {
        let path = dir.as_ref().join(format!("{}.json", safe_filename(key)));
        Self { path }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionMedium for FileMedium {
    fn read(&self) -> crate::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, contents: &str) -> crate::Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        // readers see either the old file or the new one, never a partial write
        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(contents.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self) -> crate::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local medium, used by the HTTP host and in tests
#[derive(Debug, Default)]
pub struct MemoryMedium {
    slot: Mutex<Option<String>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a medium that already holds `contents`
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(contents.into())),
        }
    }

    /// Snapshot of the stored value
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().clone()
    }
}

impl SessionMedium for MemoryMedium {
    fn read(&self) -> crate::Result<Option<String>> {
        Ok(self.slot.lock().clone())
    }

    fn write(&self, contents: &str) -> crate::Result<()> {
        *self.slot.lock() = Some(contents.to_string());
        Ok(())
    }

    fn remove(&self) -> crate::Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

impl<M: SessionMedium + ?Sized> SessionMedium for std::sync::Arc<M> {
    fn read(&self) -> crate::Result<Option<String>> {
        (**self).read()
    }

    fn write(&self, contents: &str) -> crate::Result<()> {
        (**self).write(contents)
    }

    fn remove(&self) -> crate::Result<()> {
        (**self).remove()
    }
}
