//! Local draft backup
//!
//! While a question is unanswered, the answer buffer is periodically
//! serialized under `draft:{session_id}` so a reload or crash loses at most
//! one autosave interval of typing. Restoration is at-most-once: the key is
//! deleted the moment its content lands back in the buffer.

use crate::capture::AnswerCapture;
use crate::model::Draft;
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Storage key for a session's draft
pub fn draft_key(session_id: &str) -> String {
    format!("draft:{}", session_id)
}

/// Key/value draft storage contract (localStorage-shaped)
pub trait DraftStore: Send + Sync {
    fn put(&self, key: &str, draft: &Draft) -> Result<()>;
    fn get(&self, key: &str) -> Result<Option<Draft>>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory draft store for tests and the demo binary
#[derive(Default)]
pub struct MemoryDraftStore {
    entries: std::sync::Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn put(&self, key: &str, draft: &Draft) -> Result<()> {
        let json = serde_json::to_string(draft)?;
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), json);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Draft>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

/// File-backed draft store, one JSON file per key
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).context("Failed to create draft directory")?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys contain ':' which is not filename-safe everywhere
        self.dir.join(format!("{}.json", key.replace(':', "-")))
    }
}

impl DraftStore for FileDraftStore {
    fn put(&self, key: &str, draft: &Draft) -> Result<()> {
        let json = serde_json::to_vec(draft)?;
        fs::write(self.path_for(key), json)
            .with_context(|| format!("Failed to write draft {}", key))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Draft>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read(&path).with_context(|| format!("Failed to read draft {}", key))?;
        Ok(Some(serde_json::from_slice(&json)?))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove draft {}", key))?;
        }
        Ok(())
    }
}

/// Periodic draft writer for one question
///
/// The task is owned by the current question context: the controller aborts
/// it whenever the question changes or the session stops, so no orphaned
/// timer survives across questions.
pub struct DraftAutosave {
    handle: Option<JoinHandle<()>>,
}

impl DraftAutosave {
    /// Spawn the autosave loop for the given question
    pub fn start(
        store: Arc<dyn DraftStore>,
        session_id: String,
        question_text: String,
        capture: Arc<Mutex<AnswerCapture>>,
        interval: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let key = draft_key(&session_id);
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let answer_text = {
                    let capture = capture.lock().await;
                    if capture.is_empty() {
                        continue;
                    }
                    capture.text().to_string()
                };

                let draft = Draft {
                    session_id: session_id.clone(),
                    question_text: question_text.clone(),
                    answer_text,
                    timestamp: Utc::now(),
                };

                // A failed tick (e.g. storage quota) loses one backup, not the answer
                if let Err(e) = store.put(&key, &draft) {
                    warn!("Draft autosave tick failed: {:#}", e);
                }
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for DraftAutosave {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Restore a stored draft into an empty buffer, at most once
///
/// A draft for a different question is stale and cleared immediately. On a
/// successful restore the key is deleted, so a second attempt with no new
/// autosave tick is a no-op.
pub fn restore_draft(
    store: &dyn DraftStore,
    session_id: &str,
    current_question: &str,
    capture: &mut AnswerCapture,
) -> bool {
    let key = draft_key(session_id);

    let draft = match store.get(&key) {
        Ok(Some(draft)) => draft,
        Ok(None) => return false,
        Err(e) => {
            warn!("Failed to read draft {}: {:#}", key, e);
            return false;
        }
    };

    if draft.question_text != current_question {
        info!("Clearing stale draft for session {}", session_id);
        if let Err(e) = store.remove(&key) {
            warn!("Failed to clear stale draft {}: {:#}", key, e);
        }
        return false;
    }

    if !capture.is_empty() {
        return false;
    }

    if let Err(e) = capture.restore(&draft.answer_text) {
        warn!("Draft restore rejected: {}", e);
        return false;
    }

    if let Err(e) = store.remove(&key) {
        warn!("Failed to delete restored draft {}: {:#}", key, e);
    }

    info!("Restored draft for session {}", session_id);
    true
}
