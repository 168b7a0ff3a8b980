//! Append-only analysis run history in a flat JSON file.
//!
//! The file holds an array of runs (each an array of cards). Files written by
//! older builds hold a single bare array of cards; those load as a history
//! with one run and are upgraded on the next append.
//!
//! A file with content in any other shape loads as an empty history, but is
//! never overwritten: appends fail until someone repairs or moves it.
//!
//! Appends within this process go through one async mutex. Nothing guards the
//! file against a second process: two writers can still lose an update, the
//! last rename wins.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cards::model::{Card, Run, RunHistory};
use crate::error::StorageError;

/// File-backed run history.
pub struct RunStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RunStore {
    /// Create a store backed by `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `cards` as the newest run and rewrite the whole file.
    pub async fn append_run(&self, cards: &Run) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut history = match self.read_raw().await? {
            Some(text) => try_decode_text(&text, &self.path).ok_or_else(|| {
                StorageError::Unrecognized {
                    path: self.path.clone(),
                }
            })?,
            None => RunHistory::new(),
        };
        history.push(cards.clone());

        let body = serde_json::to_vec_pretty(&history)?;
        self.write_atomic(&body).await?;

        info!(
            path = %self.path.display(),
            runs = history.len(),
            cards = cards.len(),
            "Appended analysis run"
        );
        Ok(())
    }

    /// Load every stored run. Missing or unreadable files yield an empty history.
    pub async fn load_history(&self) -> RunHistory {
        match self.read_raw().await {
            Ok(Some(text)) => try_decode_text(&text, &self.path).unwrap_or_default(),
            Ok(None) => RunHistory::new(),
            Err(e) => {
                warn!(error = %e, "Treating unreadable run history as empty");
                RunHistory::new()
            }
        }
    }

    async fn read_raw(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No run history yet");
                Ok(None)
            }
            Err(source) => Err(StorageError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Write to a sibling temp file, then rename it over the history file.
    async fn write_atomic(&self, body: &[u8]) -> Result<(), StorageError> {
        let write_err = |source: std::io::Error| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, body).await.map_err(write_err)?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }
        Ok(())
    }
}

/// `None` when the text is neither blank nor a recognized history shape.
fn try_decode_text(text: &str, path: &Path) -> Option<RunHistory> {
    if text.trim().is_empty() {
        return Some(RunHistory::new());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => {
            let history = try_decode_history(&value);
            if history.is_none() {
                warn!(path = %path.display(), "Run history has an unrecognized shape");
            }
            history
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Run history is not valid JSON");
            None
        }
    }
}

/// Decode a history document, sniffing the first element to tell a history of
/// runs from a legacy single run. Unrecognized shapes decode as empty.
pub fn decode_history(value: &Value) -> RunHistory {
    try_decode_history(value).unwrap_or_default()
}

fn try_decode_history(value: &Value) -> Option<RunHistory> {
    let items = value.as_array()?;
    let Some(first) = items.first() else {
        return Some(RunHistory::new());
    };

    if first.is_array() {
        items.iter().map(decode_run).collect()
    } else if Card::is_card_shaped(first) {
        decode_run(value).map(|run| vec![run])
    } else {
        None
    }
}

fn decode_run(value: &Value) -> Option<Run> {
    value.as_array()?.iter().map(Card::from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> RunStore {
        RunStore::new(dir.path().join("analysis_history.json"))
    }

    #[tokio::test]
    async fn missing_file_is_empty_history() {
        let dir = TempDir::new().unwrap();
        assert!(store_in(&dir).load_history().await.is_empty());
    }

    #[tokio::test]
    async fn append_then_load_returns_run_last() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let first = vec![Card::new("Crane", "Idle")];
        let second = vec![Card::new("Rebar", "Delivered"), Card::new("Formwork", "")];

        store.append_run(&first).await.unwrap();
        store.append_run(&second).await.unwrap();

        let history = store.load_history().await;
        assert_eq!(history, vec![first, second]);
    }

    #[tokio::test]
    async fn append_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path().join("data/nested/history.json"));
        store.append_run(&vec![Card::new("A", "B")]).await.unwrap();
        assert_eq!(store.load_history().await.len(), 1);
        assert!(!dir.path().join("data/nested/history.json.tmp").exists());
    }

    #[tokio::test]
    async fn legacy_single_run_file_loads_as_one_run() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let legacy = json!([
            {"title": "BUILDING", "description": "40%"},
            {"title": "FLOOR", "description": "4th"}
        ]);
        std::fs::write(store.path(), legacy.to_string()).unwrap();

        let history = store.load_history().await;
        assert_eq!(
            history,
            vec![vec![Card::new("BUILDING", "40%"), Card::new("FLOOR", "4th")]]
        );
    }

    #[tokio::test]
    async fn append_upgrades_legacy_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"[{"title": "Old", "description": "run"}]"#).unwrap();

        let new_run = vec![Card::new("New", "run")];
        store.append_run(&new_run).await.unwrap();

        let on_disk: Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(
            on_disk,
            json!([
                [{"title": "Old", "description": "run"}],
                [{"title": "New", "description": "run"}]
            ])
        );
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(store.load_history().await.is_empty());
    }

    #[tokio::test]
    async fn unreadable_path_fails_append() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be cannot be read as text.
        let store = RunStore::new(dir.path().to_path_buf());
        let err = store.append_run(&vec![Card::new("A", "B")]).await.unwrap_err();
        assert!(matches!(err, StorageError::Read { .. }));
        assert!(store.load_history().await.is_empty());
    }

    #[tokio::test]
    async fn append_keeps_unrecognized_file_intact() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let original = r#"[[{"title":"A"}],[{"title":"B"},"stray"],[{"title":"C"}]]"#;
        std::fs::write(store.path(), original).unwrap();

        assert!(store.load_history().await.is_empty());
        let err = store.append_run(&vec![Card::new("D", "d")]).await.unwrap_err();
        assert!(matches!(err, StorageError::Unrecognized { .. }));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), original);
    }

    #[tokio::test]
    async fn append_keeps_invalid_json_intact() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json").unwrap();

        let err = store.append_run(&vec![Card::new("D", "d")]).await.unwrap_err();
        assert!(matches!(err, StorageError::Unrecognized { .. }));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn append_replaces_blank_or_empty_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        for seed in ["", "  \n", "[]"] {
            std::fs::write(store.path(), seed).unwrap();
            store.append_run(&vec![Card::new("A", "B")]).await.unwrap();
            assert_eq!(store.load_history().await, vec![vec![Card::new("A", "B")]]);
        }
    }

    #[test]
    fn decode_history_shapes() {
        assert!(decode_history(&json!([])).is_empty());
        assert!(decode_history(&json!({"title": "x"})).is_empty());
        assert!(decode_history(&json!([1, 2])).is_empty());
        assert!(decode_history(&json!([{"name": "x"}])).is_empty());
        assert_eq!(decode_history(&json!([[]])), vec![Vec::<Card>::new()]);
        assert_eq!(
            decode_history(&json!([[{"title": "A"}], [{"description": "B"}]])),
            vec![vec![Card::new("A", "")], vec![Card::new("", "B")]]
        );
    }

    #[test]
    fn decode_history_rejects_mixed_runs() {
        assert!(decode_history(&json!([[{"title": "A"}], {"title": "B"}])).is_empty());
        assert!(decode_history(&json!([[{"title": "A"}, 3]])).is_empty());
    }
}
