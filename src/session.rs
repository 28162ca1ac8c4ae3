//! Per-session state and the small key/value store that survives the OAuth
//! redirect.

use crate::error::SessionError;
use crate::models::{Notice, PendingSubmission, SubmissionStatus};
use crate::presentation::{DockTracker, Theme};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

pub const PENDING_PAYLOAD_KEY: &str = "contact_payload";
pub const NOTICE_ACCEPTED_KEY: &str = "modal_accepted";
pub const THEME_KEY: &str = "theme";

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries().remove(key);
        Ok(())
    }
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = self.read()?;
        apply(&mut entries);
        self.write(&entries)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(self.read()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// Reads the pending slot. An unreadable entry counts as empty.
pub fn load_pending(store: &dyn SessionStore) -> Result<Option<PendingSubmission>, SessionError> {
    let Some(raw) = store.get(PENDING_PAYLOAD_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(pending) => Ok(Some(pending)),
        Err(err) => {
            warn!(target: "form", "discarding unreadable pending payload: {err}");
            store.remove(PENDING_PAYLOAD_KEY)?;
            Ok(None)
        }
    }
}

pub fn store_pending(store: &dyn SessionStore, pending: &PendingSubmission) -> Result<(), SessionError> {
    store.set(PENDING_PAYLOAD_KEY, &serde_json::to_string(pending)?)
}

pub fn clear_pending(store: &dyn SessionStore) -> Result<(), SessionError> {
    store.remove(PENDING_PAYLOAD_KEY)
}

pub fn notice_acknowledged(store: &dyn SessionStore) -> Result<bool, SessionError> {
    Ok(store.get(NOTICE_ACCEPTED_KEY)?.as_deref() == Some("true"))
}

pub fn record_acknowledgement(store: &dyn SessionStore) -> Result<(), SessionError> {
    store.set(NOTICE_ACCEPTED_KEY, "true")
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub status: SubmissionStatus,
    pub submit_enabled: bool,
    pub theme: Theme,
    pub dock: DockTracker,
    pub last_notice: Option<Notice>,
}

impl SessionState {
    pub fn new(theme: Theme, scroll_y: f64) -> Self {
        Self {
            status: SubmissionStatus::IDLE,
            submit_enabled: true,
            theme,
            dock: DockTracker::new(scroll_y),
            last_notice: None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(Theme::Light, 0.0)
    }
}
