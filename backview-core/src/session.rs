//! Session persistence — JSON save/load across restarts.
//!
//! Mirrors what the browser kept in session/local storage: the auth token,
//! the opened tabs and selection, the last strategy viewed, and a copy of
//! the summaries listing so the strategy view renders before the first fetch.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{BacktestId, Summary};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("write session {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub token: Option<String>,
    pub current_backtest: Option<BacktestId>,
    pub opened: Vec<BacktestId>,
    pub selected_strategy: Option<String>,
    pub cached_summaries: Option<Vec<Summary>>,
}

impl SessionState {
    pub fn clear_token(&mut self) {
        self.token = None;
    }
}

/// Load session state. Missing or unreadable files yield defaults.
///
/// Fields are decoded one at a time, so a bad cached listing or tab list
/// only loses that field and the token survives.
pub fn load(path: &Path) -> SessionState {
    let Ok(content) = std::fs::read_to_string(path) else {
        return SessionState::default();
    };
    let root = match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "ignoring session file that is not an object");
            return SessionState::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt session file");
            return SessionState::default();
        }
    };
    SessionState {
        token: field(&root, "token", path),
        current_backtest: field(&root, "current_backtest", path),
        opened: field(&root, "opened", path),
        selected_strategy: field(&root, "selected_strategy", path),
        cached_summaries: field(&root, "cached_summaries", path),
    }
}

fn field<T: DeserializeOwned + Default>(root: &Map<String, Value>, name: &str, path: &Path) -> T {
    match root.get(name) {
        None | Some(Value::Null) => T::default(),
        Some(value) => T::deserialize(value).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), field = name, error = %e, "dropping unreadable session field");
            T::default()
        }),
    }
}

/// Save session state, creating parent directories if needed.
pub fn save(path: &Path, state: &SessionState) -> Result<(), SessionError> {
    let write_err = |source| SessionError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json).map_err(write_err)?;
    Ok(())
}
