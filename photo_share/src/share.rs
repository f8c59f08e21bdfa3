//! Shared photo sets: remote lookup with a local JSON fallback store.
//!
//! A share record is keyed by id and read-only once consumed.  Resolution
//! tries the remote endpoint first and falls back to the local store on
//! *any* remote failure — transport error, non-2xx, or a body that says
//! `success: false`.  Total failure is a log line, never a user-facing
//! error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("failed to write share record: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize share record: {0}")]
    Json(#[from] serde_json::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// Records
// ════════════════════════════════════════════════════════════════════════════

/// What the local fallback store holds under `share_<id>.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub images: Vec<String>,
}

/// Body of a successful remote lookup.
#[derive(Debug, Deserialize)]
struct ShareResponse {
    success: bool,
    #[serde(default)]
    images:  Vec<String>,
}

// ════════════════════════════════════════════════════════════════════════════
// ShareStore
// ════════════════════════════════════════════════════════════════════════════

/// Remote endpoint base plus the local fallback directory.
#[derive(Clone)]
pub struct ShareStore {
    api_base:  String,
    local_dir: PathBuf,
}

impl ShareStore {
    /// Store talking to `api_base` with the default local directory.
    pub fn new(api_base: impl Into<String>) -> ShareStore {
        let local_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gesture_tree");
        ShareStore::with_local_dir(api_base, local_dir)
    }

    /// Store with an explicit local directory (tests, portable installs).
    pub fn with_local_dir(api_base: impl Into<String>, local_dir: impl Into<PathBuf>) -> ShareStore {
        ShareStore {
            api_base:  api_base.into(),
            local_dir: local_dir.into(),
        }
    }

    /// Resolve a shared photo set: remote first, local on any remote
    /// failure, `None` (logged) when neither yields data.
    pub fn resolve(&self, id: &str) -> Option<Vec<String>> {
        match self.remote_lookup(id) {
            Ok(images) => {
                info!("share {id}: {} photos from remote", images.len());
                return Some(images);
            }
            Err(e) => debug!("share {id}: remote unavailable ({e}), trying local store"),
        }

        match self.local_lookup(id) {
            Some(images) => {
                info!("share {id}: {} photos from local store", images.len());
                Some(images)
            }
            None => {
                warn!("share {id}: not found");
                None
            }
        }
    }

    /// Write the local fallback record for `id`.
    pub fn save_local(&self, id: &str, images: &[String]) -> Result<(), ShareError> {
        fs::create_dir_all(&self.local_dir)?;
        let record = ShareRecord { images: images.to_vec() };
        fs::write(self.local_path(id), serde_json::to_vec(&record)?)?;
        Ok(())
    }

    fn remote_lookup(&self, id: &str) -> Result<Vec<String>, String> {
        let url = format!("{}/api/share?id={}", self.api_base.trim_end_matches('/'), id);
        let response = ureq::get(&url).call().map_err(|e| e.to_string())?;
        let body: ShareResponse = response.into_json().map_err(|e| e.to_string())?;
        if body.success {
            Ok(body.images)
        } else {
            Err("remote lookup reported failure".to_string())
        }
    }

    fn local_lookup(&self, id: &str) -> Option<Vec<String>> {
        let bytes = fs::read(self.local_path(id)).ok()?;
        let record: ShareRecord = serde_json::from_slice(&bytes).ok()?;
        Some(record.images)
    }

    fn local_path(&self, id: &str) -> PathBuf {
        self.local_dir.join(format!("share_{}.json", sanitize(id)))
    }
}

/// Keep share ids safe to use as file names.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// A store whose remote half always fails fast.
    fn offline_store(dir: &Path) -> ShareStore {
        ShareStore::with_local_dir("http://127.0.0.1:9", dir)
    }

    #[test]
    fn local_fallback_serves_when_remote_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = offline_store(dir.path());
        let images = vec!["data:image/png;base64,AAAA".to_string()];
        store.save_local("xmas24", &images).unwrap();

        assert_eq!(store.resolve("xmas24"), Some(images));
    }

    #[test]
    fn missing_everywhere_resolves_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = offline_store(dir.path());
        assert_eq!(store.resolve("nobody"), None);
    }

    #[test]
    fn save_then_resolve_round_trips_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = offline_store(dir.path());
        let images: Vec<String> = (0..3).map(|i| format!("photo-{i}")).collect();
        store.save_local("trio", &images).unwrap();

        assert_eq!(store.resolve("trio"), Some(images));
    }

    #[test]
    fn hostile_ids_stay_inside_the_store_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = offline_store(dir.path());
        store.save_local("../../escape", &[]).unwrap();

        // The record landed inside the store dir, under a flattened name.
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["share_______escape.json".to_string()]);
    }

    #[test]
    fn corrupt_local_record_is_treated_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = offline_store(dir.path());
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(dir.path().join("share_bad.json"), b"{not json").unwrap();
        assert_eq!(store.resolve("bad"), None);
    }
}
