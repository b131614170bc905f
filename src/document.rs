use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

/// A stored note. Field names follow the interchange format the sidebar
/// and backup tooling expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    /// The serialized document body (style-preserving Markdown dialect)
    pub content: String,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A partial update; unset fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_pinned: Option<bool>,
}

impl NotePatch {
    pub fn content(content: impl Into<String>) -> Self {
        NotePatch {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        NotePatch {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn pinned(pinned: bool) -> Self {
        NotePatch {
            is_pinned: Some(pinned),
            ..Default::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("note not found: {0}")]
    NotFound(String),
    #[error("invalid note id: {0:?}")]
    InvalidId(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed note record: {0}")]
    Malformed(#[from] serde_json::Error),
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One JSON file per note, keyed by id, in a flat directory
pub struct NoteStore {
    base_path: PathBuf,
}

impl NoteStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        NoteStore {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn note_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        if id.is_empty() || id.contains(['/', '\\', '.']) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.base_path.join(format!("{}.json", id)))
    }

    fn write_note(&self, note: &Note) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path)?;
        let path = self.note_path(&note.id)?;
        fs::write(&path, serde_json::to_string_pretty(note)?)?;
        Ok(())
    }

    /// Create a new note with empty content
    pub fn create(&self, title: &str) -> Result<Note, StoreError> {
        let now = Utc::now();
        let suffix = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let note = Note {
            id: format!("note-{}-{}", now.timestamp_millis(), suffix),
            title: title.to_string(),
            content: String::new(),
            is_pinned: false,
            created_at: now,
            updated_at: now,
        };
        self.write_note(&note)?;
        debug!(id = %note.id, "note created");
        Ok(note)
    }

    pub fn get(&self, id: &str) -> Result<Note, StoreError> {
        let path = self.note_path(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Apply a patch and bump the update timestamp
    pub fn update(&self, id: &str, patch: NotePatch) -> Result<Note, StoreError> {
        let mut note = self.get(id)?;
        if let Some(title) = patch.title {
            note.title = title;
        }
        if let Some(content) = patch.content {
            note.content = content;
        }
        if let Some(pinned) = patch.is_pinned {
            note.is_pinned = pinned;
        }
        note.updated_at = Utc::now();
        self.write_note(&note)?;
        debug!(id = %note.id, "note updated");
        Ok(note)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.note_path(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        fs::remove_file(path)?;
        debug!(id, "note deleted");
        Ok(())
    }

    /// All notes, pinned first, most recently updated first within each
    /// group. Unreadable records are skipped, not fatal.
    pub fn list(&self) -> Result<Vec<Note>, StoreError> {
        let mut notes: Vec<Note> = Vec::new();
        if !self.base_path.exists() {
            return Ok(notes);
        }
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path).map_err(StoreError::from).and_then(
                |raw| Ok(serde_json::from_str::<Note>(&raw)?),
            ) {
                Ok(note) => notes.push(note),
                Err(err) => warn!(path = %path.display(), %err, "skipping unreadable note"),
            }
        }

        notes.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then(b.updated_at.cmp(&a.updated_at))
        });
        Ok(notes)
    }

    /// Serialize every note into one JSON array
    pub fn export_backup(&self) -> Result<String, StoreError> {
        let notes = self.list()?;
        Ok(serde_json::to_string_pretty(&notes)?)
    }

    /// Restore from a backup archive: upsert by id. Returns the number of
    /// notes imported.
    pub fn import_backup(&self, json: &str) -> Result<usize, StoreError> {
        let notes: Vec<Note> = serde_json::from_str(json)?;
        let count = notes.len();
        for note in &notes {
            self.write_note(note)?;
        }
        debug!(count, "backup imported");
        Ok(count)
    }
}
