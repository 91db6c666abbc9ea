//! Adventure state storage
//!
//! Persists the `state` object between turns and keeps a log of what each
//! hook run produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::core::{DirectorError, DirectorResult};
use crate::director::{TurnOutcome, TurnReport};
use crate::hooks::HookType;

/// Default directory for adventure storage
const ADVENTURES_DIR: &str = "adventures";

/// One logged hook run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn_id: Uuid,
    pub hook: HookType,
    pub outcome: TurnOutcome,
    pub active_modifiers: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

impl TurnRecord {
    /// Stamp a report with its turn id and the current time
    pub fn new(turn_id: Uuid, report: TurnReport) -> Self {
        Self {
            turn_id,
            hook: report.hook,
            outcome: report.outcome,
            active_modifiers: report.active_modifiers,
            recorded_at: Utc::now(),
        }
    }
}

fn io_error(origin: &str) -> impl FnOnce(std::io::Error) -> DirectorError + '_ {
    move |source| DirectorError::Io {
        origin: origin.to_string(),
        source,
    }
}

fn json_error(origin: &str) -> impl FnOnce(serde_json::Error) -> DirectorError + '_ {
    move |source| DirectorError::Json {
        origin: origin.to_string(),
        source,
    }
}

/// Directory-backed storage, one subdirectory per adventure
#[derive(Debug, Clone)]
pub struct StateStorage {
    base_dir: PathBuf,
}

impl StateStorage {
    /// Create a new storage with the default directory
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from(ADVENTURES_DIR),
        }
    }

    /// Create a new storage with a custom directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: dir.into(),
        }
    }

    pub fn adventure_dir(&self, adventure_id: &str) -> PathBuf {
        self.base_dir.join(adventure_id)
    }

    pub fn state_path(&self, adventure_id: &str) -> PathBuf {
        self.adventure_dir(adventure_id).join("state.json")
    }

    pub fn turns_path(&self, adventure_id: &str) -> PathBuf {
        self.adventure_dir(adventure_id).join("turns.jsonl")
    }

    /// Create the adventure directory if it doesn't exist
    pub fn ensure_adventure_dir(&self, adventure_id: &str) -> DirectorResult<PathBuf> {
        let dir = self.adventure_dir(adventure_id);
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(io_error("StateStorage::ensure_adventure_dir"))?;
        }
        Ok(dir)
    }

    /// Save the adventure state
    pub fn save_state(&self, adventure_id: &str, state: &Value) -> DirectorResult<()> {
        const ORIGIN: &str = "StateStorage::save_state";
        self.ensure_adventure_dir(adventure_id)?;

        let file = File::create(self.state_path(adventure_id)).map_err(io_error(ORIGIN))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, state).map_err(json_error(ORIGIN))?;

        tracing::debug!("Saved state for adventure {}", adventure_id);
        Ok(())
    }

    /// Load the adventure state. A missing file yields an empty object.
    pub fn load_state(&self, adventure_id: &str) -> DirectorResult<Value> {
        const ORIGIN: &str = "StateStorage::load_state";
        let path = self.state_path(adventure_id);

        if !path.exists() {
            return Ok(Value::Object(Map::new()));
        }

        let file = File::open(&path).map_err(io_error(ORIGIN))?;
        let reader = BufReader::new(file);
        let state: Value = serde_json::from_reader(reader).map_err(json_error(ORIGIN))?;

        Ok(state)
    }

    /// Append a record to the turn log
    pub fn append_turn(&self, adventure_id: &str, record: &TurnRecord) -> DirectorResult<()> {
        const ORIGIN: &str = "StateStorage::append_turn";
        self.ensure_adventure_dir(adventure_id)?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.turns_path(adventure_id))
            .map_err(io_error(ORIGIN))?;

        let json = serde_json::to_string(record).map_err(json_error(ORIGIN))?;
        writeln!(file, "{}", json).map_err(io_error(ORIGIN))?;

        Ok(())
    }

    /// Load every record from the turn log
    pub fn load_turns(&self, adventure_id: &str) -> DirectorResult<Vec<TurnRecord>> {
        const ORIGIN: &str = "StateStorage::load_turns";
        let path = self.turns_path(adventure_id);

        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path).map_err(io_error(ORIGIN))?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line.map_err(io_error(ORIGIN))?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line).map_err(json_error(ORIGIN))?);
        }

        Ok(records)
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl Default for StateStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_storage() -> (StateStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = StateStorage::with_dir(temp_dir.path());
        (storage, temp_dir)
    }

    fn report(text: &str) -> TurnReport {
        TurnReport {
            hook: HookType::Output,
            outcome: TurnOutcome {
                text: Some(text.to_string()),
                stop: false,
            },
            active_modifiers: vec!["shout".to_string()],
        }
    }

    #[test]
    fn test_missing_state_is_empty_object() {
        let (storage, _temp) = create_test_storage();
        assert_eq!(storage.load_state("nope").unwrap(), json!({}));
    }

    #[test]
    fn test_save_load_state() {
        let (storage, _temp) = create_test_storage();

        let state = json!({ "memory": { "context": "A tavern" }, "$store": {} });
        storage.save_state("adv1", &state).unwrap();

        assert_eq!(storage.load_state("adv1").unwrap(), state);
    }

    #[test]
    fn test_append_load_turns() {
        let (storage, _temp) = create_test_storage();

        let first = TurnRecord::new(Uuid::new_v4(), report("one"));
        let second = TurnRecord::new(Uuid::new_v4(), report("two"));
        storage.append_turn("adv1", &first).unwrap();
        storage.append_turn("adv1", &second).unwrap();

        let turns = storage.load_turns("adv1").unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].outcome.text.as_deref(), Some("two"));
        assert_eq!(turns[0].turn_id, first.turn_id);
    }
}
