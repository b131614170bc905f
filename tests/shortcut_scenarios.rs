// End-to-end editing scenarios driven through the session's key handling,
// the way a host input surface would deliver them.

use inkdown::richtext::session::{type_text, Disposition, EditorSession, Key, KeyInput};
use inkdown::richtext::structured_document::{BlockKind, Inline, StructuredDocument};

/// No two adjacent text runs may ever share an identical attribute set
fn assert_run_merge_invariant(doc: &StructuredDocument) {
    for block in doc.blocks() {
        let mut previous: Option<&Inline> = None;
        for item in &block.content {
            if let (Some(Inline::Text(a)), Inline::Text(b)) = (previous, item) {
                assert_ne!(
                    a.style, b.style,
                    "adjacent runs with identical styles in {:?}",
                    block.to_plain_text()
                );
            }
            previous = Some(item);
        }
    }
}

#[test]
fn heading_shortcut_consumes_trigger_entirely() {
    let mut session = EditorSession::new();
    type_text(&mut session, "##");
    let disposition = session.handle_key(&KeyInput::ch(' '));

    assert_eq!(disposition, Disposition::Consumed);
    let doc = session.editor().document();
    assert_eq!(doc.block_count(), 1);
    assert_eq!(doc.blocks()[0].kind, BlockKind::Heading { level: 2 });
    assert_eq!(doc.blocks()[0].to_plain_text(), "");
}

#[test]
fn bold_shortcut_followed_by_text_is_not_bold() {
    let mut session = EditorSession::new();
    type_text(&mut session, "**bold**");
    session.handle_key(&KeyInput::ch(' '));
    type_text(&mut session, "text");

    let doc = session.editor().document();
    let block = &doc.blocks()[0];
    assert_eq!(block.to_plain_text(), "bold text");
    assert_eq!(block.content.len(), 2);

    match (&block.content[0], &block.content[1]) {
        (Inline::Text(bold), Inline::Text(rest)) => {
            assert_eq!(bold.text, "bold");
            assert!(bold.style.bold);
            assert_eq!(rest.text, " text");
            assert!(!rest.style.bold);
        }
        _ => panic!("expected a bold run followed by a plain run"),
    }
    assert_run_merge_invariant(doc);
}

#[test]
fn enter_at_heading_end_produces_plain_paragraph() {
    let mut session = EditorSession::new();
    type_text(&mut session, "#");
    session.handle_key(&KeyInput::ch(' '));
    type_text(&mut session, "Title");
    session.handle_key(&KeyInput::plain(Key::Enter));
    type_text(&mut session, "body");

    let doc = session.editor().document();
    assert_eq!(doc.block_count(), 2);
    assert_eq!(doc.blocks()[0].kind, BlockKind::Heading { level: 1 });
    assert_eq!(doc.blocks()[1].kind, BlockKind::Paragraph);
    assert_eq!(doc.blocks()[1].to_plain_text(), "body");
}

#[test]
fn color_applies_to_selection_only() {
    use inkdown::richtext::structured_document::DocumentPosition;

    let mut session = EditorSession::new();
    type_text(&mut session, "red text");
    session
        .editor_mut()
        .set_selection(DocumentPosition::new(0, 0), DocumentPosition::new(0, 3));
    session.set_text_color(Some("#ef4444")).unwrap();

    // Selection collapsed; typing right after it is uncolored
    assert!(session.editor().selection().is_none());
    type_text(&mut session, "!");

    let doc = session.editor().document();
    let block = &doc.blocks()[0];
    match &block.content[0] {
        Inline::Text(run) => {
            assert_eq!(run.text, "red");
            assert_eq!(run.style.color.as_deref(), Some("#ef4444"));
        }
        _ => panic!("expected colored run"),
    }
    match &block.content[1] {
        Inline::Text(run) => {
            assert_eq!(run.text, "! text");
            assert!(run.style.color.is_none());
        }
        _ => panic!("expected uncolored run"),
    }
    assert_run_merge_invariant(doc);
}

#[test]
fn list_shortcut_isolates_only_the_current_line() {
    let mut session = EditorSession::new();
    type_text(&mut session, "earlier notes");
    session.handle_key(&KeyInput::shift(Key::Enter)); // explicit line break
    type_text(&mut session, "-");
    session.handle_key(&KeyInput::ch(' '));
    type_text(&mut session, "first item");

    let doc = session.editor().document();
    assert_eq!(doc.block_count(), 2);
    assert_eq!(doc.blocks()[0].kind, BlockKind::Paragraph);
    assert_eq!(doc.blocks()[0].to_plain_text(), "earlier notes");
    assert_eq!(
        doc.blocks()[1].kind,
        BlockKind::ListItem {
            ordered: false,
            number: None,
        }
    );
    assert_eq!(doc.blocks()[1].to_plain_text(), "first item");
}

#[test]
fn rule_shortcut_leaves_caret_in_fresh_paragraph() {
    let mut session = EditorSession::new();
    type_text(&mut session, "---");
    session.handle_key(&KeyInput::plain(Key::Enter));
    type_text(&mut session, "after");

    let doc = session.editor().document();
    assert_eq!(doc.block_count(), 2);
    assert_eq!(doc.blocks()[0].kind, BlockKind::Rule);
    assert_eq!(doc.blocks()[1].kind, BlockKind::Paragraph);
    assert_eq!(doc.blocks()[1].to_plain_text(), "after");
}

#[test]
fn literal_text_passes_through_unconverted() {
    let mut session = EditorSession::new();
    // Neither a full-line trigger nor a delimited span
    type_text(&mut session, "a # b ** c");

    let doc = session.editor().document();
    assert_eq!(doc.block_count(), 1);
    assert_eq!(doc.blocks()[0].kind, BlockKind::Paragraph);
    assert_eq!(doc.blocks()[0].to_plain_text(), "a # b ** c");
    assert_run_merge_invariant(doc);
}

#[test]
fn link_shortcut_creates_link_run() {
    let mut session = EditorSession::new();
    type_text(&mut session, "docs: [guide](https://docs.example)");
    session.handle_key(&KeyInput::ch(' '));

    let doc = session.editor().document();
    let block = &doc.blocks()[0];
    assert_eq!(block.to_plain_text(), "docs: guide ");
    match &block.content[1] {
        Inline::Text(run) => {
            assert_eq!(run.text, "guide");
            assert_eq!(run.style.link.as_deref(), Some("https://docs.example"));
        }
        _ => panic!("expected link run"),
    }
}

#[test]
fn run_merge_invariant_survives_mixed_operations() {
    use inkdown::richtext::session::InlineMark;
    use inkdown::richtext::structured_document::DocumentPosition;

    let mut session = EditorSession::new();
    type_text(&mut session, "alpha beta gamma");

    session
        .editor_mut()
        .set_selection(DocumentPosition::new(0, 6), DocumentPosition::new(0, 10));
    session.toggle_inline(InlineMark::Bold);

    // Un-bold again: the three runs must merge back into one
    session
        .editor_mut()
        .set_selection(DocumentPosition::new(0, 6), DocumentPosition::new(0, 10));
    session.toggle_inline(InlineMark::Bold);
    assert_eq!(session.editor().document().blocks()[0].content.len(), 1);

    // Style, split, delete, retype
    session
        .editor_mut()
        .set_selection(DocumentPosition::new(0, 0), DocumentPosition::new(0, 5));
    session.toggle_inline(InlineMark::Italic);
    session
        .editor_mut()
        .set_cursor(DocumentPosition::new(0, 11));
    session.handle_key(&KeyInput::plain(Key::Enter));
    session.handle_key(&KeyInput::plain(Key::Backspace));
    type_text(&mut session, " delta");

    assert_run_merge_invariant(session.editor().document());
}

#[test]
fn composition_window_defers_shortcut_recognition() {
    let mut session = EditorSession::new();
    type_text(&mut session, "**bold**");

    session.composition_start();
    assert_eq!(
        session.handle_key(&KeyInput::ch(' ')),
        Disposition::PassThrough
    );
    // Nothing converted while composing
    assert_eq!(
        session.editor().document().to_plain_text(),
        "**bold**"
    );

    session.composition_end();
    session.handle_key(&KeyInput::ch(' '));
    assert_eq!(session.editor().document().to_plain_text(), "bold ");
}
