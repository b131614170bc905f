// Common content access traits so different editor implementations can be
// used interchangeably by features like autosave or export.

use crate::richtext::markdown_converter::markdown_to_document;
use crate::richtext::session::EditorSession;

/// Provides read access to the current content in its serialized form.
///
/// Implementations should return text suitable for saving.
pub trait ContentProvider {
    fn get_content(&self) -> String;
}

/// Provides a unified way to load serialized content into an editor.
pub trait ContentLoader {
    fn set_content_from_markdown(&mut self, markdown: &str);
}

impl ContentProvider for EditorSession {
    fn get_content(&self) -> String {
        self.serialize()
    }
}

impl ContentLoader for EditorSession {
    fn set_content_from_markdown(&mut self, markdown: &str) {
        self.attach_document(markdown_to_document(markdown));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_round_trips_through_traits() {
        let mut session = EditorSession::new();
        session.set_content_from_markdown("# Title\n\nbody text");
        assert_eq!(session.get_content(), "# Title\n\nbody text");
    }
}
