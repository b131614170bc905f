use crate::content::ContentProvider;
use crate::document::{NotePatch, NoteStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Default debounce window between a change and its flush
pub const DEFAULT_DEBOUNCE_MS: i64 = 1000;

/// State management for the debounced persistence flush.
///
/// The engine only signals changes through its `on_change` hook; deciding
/// when to actually write sits here, outside the engine.
pub struct AutoSaveState {
    /// When the content was last changed
    pub last_change_time: Option<DateTime<Utc>>,
    /// When the content was last successfully saved
    pub last_save_time: Option<DateTime<Utc>>,
    /// Whether a save operation is currently in progress
    pub is_saving: bool,
    /// Whether a save is pending (for debounce)
    pub pending_save: bool,
    /// Original content to detect changes
    pub original_content: String,
    /// Id of the note being edited
    pub current_note: Option<String>,
    debounce_ms: i64,
}

impl AutoSaveState {
    pub fn new() -> Self {
        Self::with_debounce(DEFAULT_DEBOUNCE_MS)
    }

    pub fn with_debounce(debounce_ms: i64) -> Self {
        AutoSaveState {
            last_change_time: None,
            last_save_time: None,
            is_saving: false,
            pending_save: false,
            original_content: String::new(),
            current_note: None,
            debounce_ms,
        }
    }

    /// Mark that content has changed
    pub fn mark_changed(&mut self) {
        self.last_change_time = Some(Utc::now());
        self.pending_save = true;
    }

    /// Reset state when a different note is attached
    pub fn reset_for_note(&mut self, id: &str, content: &str) {
        self.current_note = Some(id.to_string());
        self.original_content = content.to_string();
        self.last_change_time = None;
        self.last_save_time = None;
        self.is_saving = false;
        self.pending_save = false;
    }

    /// Whether the debounce window has elapsed since the last change
    pub fn should_flush(&self, now: DateTime<Utc>) -> bool {
        if !self.pending_save {
            return false;
        }
        match self.last_change_time {
            Some(changed) => now - changed >= Duration::milliseconds(self.debounce_ms),
            None => false,
        }
    }

    /// Get the status text for display
    pub fn status_text(&self) -> String {
        if self.is_saving {
            return "Saving...".to_string();
        }
        if let Some(save_time) = self.last_save_time {
            format_time_since(save_time)
        } else if self.last_change_time.is_some() {
            "not saved".to_string()
        } else {
            String::new()
        }
    }

    /// Flush the editor's content to the store if it actually changed
    pub fn trigger_save<T: ContentProvider + ?Sized>(
        &mut self,
        editor: &T,
        store: &NoteStore,
    ) -> Result<(), StoreError> {
        let Some(id) = self.current_note.clone() else {
            self.pending_save = false;
            return Ok(());
        };

        if self.is_saving {
            return Ok(());
        }

        let current_content = editor.get_content();
        if current_content == self.original_content {
            self.pending_save = false;
            return Ok(());
        }

        self.is_saving = true;
        self.pending_save = false;

        let result = store.update(&id, NotePatch::content(current_content.clone()));
        self.is_saving = false;

        match result {
            Ok(_) => {
                debug!(%id, "autosave flushed");
                self.last_save_time = Some(Utc::now());
                self.original_content = current_content;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

impl Default for AutoSaveState {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a save timestamp as a human-readable string
pub fn format_time_since(time: DateTime<Utc>) -> String {
    let elapsed = Utc::now() - time;
    let secs = elapsed.num_seconds().max(0);

    if secs < 60 {
        "saved just now".to_string()
    } else if secs < 3600 {
        let mins = secs / 60;
        if mins == 1 {
            "saved 1 min ago".to_string()
        } else {
            format!("saved {} min ago", mins)
        }
    } else if secs < 86400 {
        let hours = secs / 3600;
        if hours == 1 {
            "saved 1 hour ago".to_string()
        } else {
            format!("saved {} hours ago", hours)
        }
    } else if secs < 604800 {
        let days = secs / 86400;
        if days == 1 {
            "saved 1 day ago".to_string()
        } else {
            format!("saved {} days ago", days)
        }
    } else {
        format!("saved {}", time.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    struct FixedContent(String);

    impl ContentProvider for FixedContent {
        fn get_content(&self) -> String {
            self.0.clone()
        }
    }

    #[test]
    fn test_autosave_state_new() {
        let state = AutoSaveState::new();
        assert!(state.last_change_time.is_none());
        assert!(state.last_save_time.is_none());
        assert!(!state.is_saving);
        assert!(!state.pending_save);
    }

    #[test]
    fn test_mark_changed() {
        let mut state = AutoSaveState::new();
        state.mark_changed();
        assert!(state.last_change_time.is_some());
        assert!(state.pending_save);
    }

    #[test]
    fn test_should_flush_respects_debounce() {
        let mut state = AutoSaveState::with_debounce(1000);
        state.mark_changed();

        let changed = state.last_change_time.unwrap();
        assert!(!state.should_flush(changed + Duration::milliseconds(500)));
        assert!(state.should_flush(changed + Duration::milliseconds(1500)));
    }

    #[test]
    fn test_trigger_save_skips_unchanged_content() {
        let dir = env::temp_dir().join("inkdown-test-autosave-skip");
        let _ = fs::remove_dir_all(&dir);
        let store = NoteStore::new(&dir);
        let note = store.create("n").unwrap();

        let mut state = AutoSaveState::new();
        state.reset_for_note(&note.id, "");
        state.mark_changed();

        state.trigger_save(&FixedContent(String::new()), &store).unwrap();
        assert!(!state.pending_save);
        assert!(state.last_save_time.is_none());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_trigger_save_writes_changes() {
        let dir = env::temp_dir().join("inkdown-test-autosave-write");
        let _ = fs::remove_dir_all(&dir);
        let store = NoteStore::new(&dir);
        let note = store.create("n").unwrap();

        let mut state = AutoSaveState::new();
        state.reset_for_note(&note.id, "");
        state.mark_changed();

        state
            .trigger_save(&FixedContent("new body".into()), &store)
            .unwrap();

        assert_eq!(store.get(&note.id).unwrap().content, "new body");
        assert!(state.last_save_time.is_some());
        assert_eq!(state.original_content, "new body");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_format_time_just_now() {
        assert_eq!(format_time_since(Utc::now()), "saved just now");
    }

    #[test]
    fn test_format_time_minutes() {
        let time = Utc::now() - Duration::seconds(150);
        assert_eq!(format_time_since(time), "saved 2 min ago");
    }

    #[test]
    fn test_format_time_hours() {
        let time = Utc::now() - Duration::seconds(7200);
        assert_eq!(format_time_since(time), "saved 2 hours ago");
    }
}
