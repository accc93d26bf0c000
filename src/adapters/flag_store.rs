//! JSON file flag store.
//!
//! Implements [`FlagStore`] over a small JSON document:
//!
//! ```json
//! { "alarm_status": true, "buzzer_muted": false }
//! ```
//!
//! A key missing from the document reads as `None` (never written).  Every
//! write goes to a sibling temp file that is then renamed over the original,
//! so a crash mid-write leaves the previous document intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{FlagError, FlagKey, FlagStore, PersistedFlags};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct FlagDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    alarm_status: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buzzer_muted: Option<bool>,
}

impl FlagDocument {
    fn get(&self, key: FlagKey) -> Option<bool> {
        match key {
            FlagKey::AlarmStatus => self.alarm_status,
            FlagKey::BuzzerMuted => self.buzzer_muted,
        }
    }

    fn set(&mut self, key: FlagKey, value: bool) {
        match key {
            FlagKey::AlarmStatus => self.alarm_status = Some(value),
            FlagKey::BuzzerMuted => self.buzzer_muted = Some(value),
        }
    }
}

pub struct JsonFlagStore {
    path: PathBuf,
    doc: FlagDocument,
}

impl JsonFlagStore {
    /// Load `path`.  A missing file is an empty store; an unreadable or
    /// corrupted one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FlagError> {
        let path = path.into();
        let doc = match fs::read(&path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| FlagError::Corrupted(e.to_string()))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("FLAGS | {} not found, starting empty", path.display());
                FlagDocument::default()
            }
            Err(e) => return Err(FlagError::Io(e)),
        };
        Ok(Self { path, doc })
    }

    /// Empty store that will write to `path`, discarding whatever is there.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            doc: FlagDocument::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current values, unwritten keys reading as `false`.
    pub fn snapshot(&self) -> PersistedFlags {
        PersistedFlags {
            alarm_status: self.doc.alarm_status.unwrap_or(false),
            buzzer_muted: self.doc.buzzer_muted.unwrap_or(false),
        }
    }

    fn write(&self, doc: &FlagDocument) -> Result<(), FlagError> {
        let bytes = serde_json::to_vec_pretty(doc).map_err(|e| FlagError::Corrupted(e.to_string()))?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl FlagStore for JsonFlagStore {
    fn get(&self, key: FlagKey) -> Result<Option<bool>, FlagError> {
        Ok(self.doc.get(key))
    }

    fn set_on_change(&mut self, key: FlagKey, value: bool) -> Result<bool, FlagError> {
        if self.doc.get(key) == Some(value) {
            return Ok(false);
        }
        let mut next = self.doc;
        next.set(key, value);
        if let Err(e) = self.write(&next) {
            warn!("FLAGS | write of {} to {} failed", key.as_str(), self.path.display());
            return Err(e);
        }
        self.doc = next;
        Ok(true)
    }
}
