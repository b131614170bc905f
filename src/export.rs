// Markdown export
// Turns a stored note into a downloadable Markdown artifact: the title as
// a level-1 heading followed by the serialized body.

use crate::document::Note;

/// A ready-to-write export artifact
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownExport {
    pub file_name: String,
    pub text: String,
}

/// Build the export artifact for a note
pub fn markdown_export(note: &Note) -> MarkdownExport {
    let title = if note.title.trim().is_empty() {
        "Untitled"
    } else {
        note.title.trim()
    };

    let mut text = format!("# {}\n", title);
    if !note.content.trim().is_empty() {
        text.push('\n');
        text.push_str(note.content.trim_end());
        text.push('\n');
    }

    MarkdownExport {
        file_name: format!("{}.md", sanitize_file_stem(title)),
        text,
    }
}

/// File names cannot carry path separators or other unfriendly characters
fn sanitize_file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn note(title: &str, content: &str) -> Note {
        let now = Utc::now();
        Note {
            id: "note-0-0".into(),
            title: title.into(),
            content: content.into(),
            is_pinned: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_export_prepends_title_heading() {
        let export = markdown_export(&note("My Note", "Some **bold** text."));
        assert_eq!(export.file_name, "My Note.md");
        assert_eq!(export.text, "# My Note\n\nSome **bold** text.\n");
    }

    #[test]
    fn test_export_empty_body() {
        let export = markdown_export(&note("Empty", ""));
        assert_eq!(export.text, "# Empty\n");
    }

    #[test]
    fn test_export_untitled_and_sanitized() {
        let export = markdown_export(&note("  ", "x"));
        assert_eq!(export.file_name, "Untitled.md");

        let export = markdown_export(&note("a/b:c", "x"));
        assert_eq!(export.file_name, "a-b-c.md");
    }
}
