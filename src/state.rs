//! Persisted cursor: the one fact a run needs to tell "already notified"
//! from "new". Stored in a single file whose whole content is replaced on
//! every successful save (write-temp-then-rename, so readers never observe a
//! partial write).

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;

use crate::error::Error;

/// Which cursor shape a store reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    /// JSON object; its keys are the item ids (catalog feed).
    Keys,
    /// Raw last-seen transaction hash (transaction feed).
    Hash,
    /// Decimal unix-seconds watermark (transfer feed).
    Watermark,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    Keys(BTreeSet<String>),
    Hash(Option<String>),
    Watermark(u64),
}

impl Cursor {
    pub fn zero(kind: CursorKind) -> Self {
        match kind {
            CursorKind::Keys => Cursor::Keys(BTreeSet::new()),
            CursorKind::Hash => Cursor::Hash(None),
            CursorKind::Watermark => Cursor::Watermark(0),
        }
    }

    /// Key set, or empty for a cursor of another shape.
    pub fn into_keys(self) -> BTreeSet<String> {
        match self {
            Cursor::Keys(k) => k,
            _ => BTreeSet::new(),
        }
    }

    pub fn into_hash(self) -> Option<String> {
        match self {
            Cursor::Hash(h) => h,
            _ => None,
        }
    }

    pub fn into_watermark(self) -> u64 {
        match self {
            Cursor::Watermark(w) => w,
            _ => 0,
        }
    }
}

pub struct StateStore {
    path: PathBuf,
    kind: CursorKind,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>, kind: CursorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted cursor. Never fails: a missing or corrupt file
    /// degrades to the zero cursor with a log line, so a scheduled rerun
    /// always gets a usable starting point.
    pub async fn load(&self) -> Cursor {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no previous state, starting fresh");
                return Cursor::zero(self.kind);
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "state file unreadable, starting fresh");
                return Cursor::zero(self.kind);
            }
        };

        match parse_cursor(&raw, self.kind) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "state file corrupt, starting fresh");
                Cursor::zero(self.kind)
            }
        }
    }

    /// Full replace of the state file with `cursor`.
    pub async fn save(&self, cursor: &Cursor) -> Result<(), Error> {
        let body = render_cursor(cursor);
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn parse_cursor(raw: &str, kind: CursorKind) -> Result<Cursor, Error> {
    match kind {
        CursorKind::Keys => {
            // The original deployment persisted the full catalog object; only
            // the keys matter, so any JSON object parses.
            let map: serde_json::Map<String, Value> = serde_json::from_str(raw)
                .map_err(|e| Error::CorruptState(format!("key-set state: {e}")))?;
            Ok(Cursor::Keys(map.keys().cloned().collect()))
        }
        CursorKind::Hash => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Ok(Cursor::Hash(None))
            } else {
                Ok(Cursor::Hash(Some(trimmed.to_string())))
            }
        }
        CursorKind::Watermark => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(Cursor::Watermark(0));
            }
            trimmed
                .parse::<u64>()
                .map(Cursor::Watermark)
                .map_err(|e| Error::CorruptState(format!("watermark state: {e}")))
        }
    }
}

fn render_cursor(cursor: &Cursor) -> String {
    match cursor {
        Cursor::Keys(keys) => {
            let map: serde_json::Map<String, Value> = keys
                .iter()
                .map(|k| (k.clone(), Value::Null))
                .collect();
            serde_json::to_string_pretty(&Value::Object(map)).unwrap_or_else(|_| "{}".to_string())
        }
        Cursor::Hash(h) => h.clone().unwrap_or_default(),
        Cursor::Watermark(w) => w.to_string(),
    }
}
