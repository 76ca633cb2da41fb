//! Persisted "last active session" hint.
//!
//! A single session id kept outside the in-memory model. It is read once at
//! startup and rewritten whenever the active session changes. I/O failures
//! are logged and otherwise ignored: losing the hint only means restoration
//! falls back to the first listed session.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub trait HintStore {
    fn load(&self) -> Option<String>;
    fn save(&self, session_id: &str);
    fn clear(&self);
}

impl<T: HintStore + ?Sized> HintStore for Box<T> {
    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn save(&self, session_id: &str) {
        (**self).save(session_id);
    }

    fn clear(&self) {
        (**self).clear();
    }
}

/// Hint kept in a plain text file (by default `$PARLEY_HOME/last_session`).
#[derive(Debug, Clone)]
pub struct FileHintStore {
    path: PathBuf,
}

impl FileHintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, session_id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, session_id)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to rename {}", tmp_path.display()))?;
        Ok(())
    }
}

impl HintStore for FileHintStore {
    fn load(&self) -> Option<String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read session hint");
                return None;
            }
        };
        let id = raw.trim();
        (!id.is_empty()).then(|| id.to_string())
    }

    fn save(&self, session_id: &str) {
        if let Err(e) = self.write(session_id) {
            tracing::warn!(error = %format!("{e:#}"), "failed to persist session hint");
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to clear session hint");
            }
        }
    }
}

/// Hint that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryHintStore {
    value: RefCell<Option<String>>,
}

impl MemoryHintStore {
    pub fn with_value(session_id: impl Into<String>) -> Self {
        Self {
            value: RefCell::new(Some(session_id.into())),
        }
    }
}

impl HintStore for MemoryHintStore {
    fn load(&self) -> Option<String> {
        self.value.borrow().clone()
    }

    fn save(&self, session_id: &str) {
        *self.value.borrow_mut() = Some(session_id.to_string());
    }

    fn clear(&self) {
        *self.value.borrow_mut() = None;
    }
}
