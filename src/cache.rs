//! The optional guard-satisfiability cache named in `SPEC_FULL.md` §6: a key-value
//! store keyed by the textual form of a guard expression (or its negation, prefixed
//! by `~`), valued `"True"`/`"False"` recording the full path condition's
//! satisfiability outcome at first encounter. A performance hint only — correctness
//! never depends on a hit, and a miss always falls through to the solver.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct Cache {
    entries: HashMap<String, String>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl Cache {
    /// An in-memory cache with no backing file, held for the run's duration only.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads a persisted cache from `path` if it exists, or starts empty; `path` is
    /// written to on [`Cache::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| Error::CacheIoFailed(path.clone(), Box::new(e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(Error::CacheIoFailed(path.clone(), Box::new(e))),
        };
        Ok(Self { entries, path: Some(path), dirty: false })
    }

    pub fn get(&self, key: &str) -> Option<bool> {
        self.entries.get(key).map(|v| v == "True")
    }

    pub fn set(&mut self, key: impl Into<String>, sat: bool) {
        self.entries.insert(key.into(), if sat { "True" } else { "False" }.to_string());
        self.dirty = true;
    }

    /// Persists the cache to its backing path, if one was given and it has changed.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else { return Ok(()) };
        if !self.dirty {
            return Ok(());
        }
        let text =
            serde_json::to_string_pretty(&self.entries).map_err(|e| Error::CacheIoFailed(path.clone(), Box::new(e)))?;
        std::fs::write(path, text).map_err(|e| Error::CacheIoFailed(path.clone(), Box::new(e)))
    }
}

/// Renders a guard's cache key: the guard's own text when taken positively, `~`-
/// prefixed when taken as its negation.
pub fn key_for(text: &str, positive: bool) -> String {
    if positive {
        text.to_string()
    } else {
        format!("~{text}")
    }
}
