//! End-to-end editing flows driven through a [`Session`].

use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use quire_engine::grammar::Wrapper;
use quire_engine::invariants::violations;
use quire_engine::{
    BlockStyle, InlineStyle, ListKind, NodeKind, Point, Selection, Session, SessionOptions, inline,
};

fn session(markup: &str) -> Session {
    let mut session = Session::new(SessionOptions::default());
    session.paste_markup(markup);
    session
}

fn select_all(session: &mut Session) {
    let all = Selection::all(session.tree());
    session.set_selection(all);
}

#[test]
fn bold_on_an_empty_document_then_typing() {
    // Given an empty document
    let mut session = Session::new(SessionOptions::default());

    // When bold is applied with nothing selected
    session.toggle_inline(InlineStyle::Bold);

    // Then an empty bold wrapper holds the caret placeholder
    let tree = session.tree();
    let caret = inline::caret(tree).expect("caret placeholder");
    let wrapper = tree.parent(caret).unwrap();
    assert_eq!(tree.kind(wrapper), &NodeKind::Wrapper(Wrapper::Bold));
    assert_eq!(tree.children(wrapper), &[caret]);
    assert!(violations(tree).is_empty());

    // And typing replaces the placeholder with bold text
    session.insert_text("a");
    assert_eq!(session.to_markup(), "<div><b>a</b></div>");
    assert_eq!(inline::caret(session.tree()), None);
}

#[test]
fn toggling_bold_twice_restores_the_original_leaf() {
    let mut session = session("<p>abc</p>");
    select_all(&mut session);
    let leaf = session.tree().leaves(session.tree().root())[0];

    session.toggle_inline(InlineStyle::Bold);
    assert_eq!(session.to_markup(), "<div><b>abc</b></div>");

    session.toggle_inline(InlineStyle::Bold);
    assert_eq!(session.to_markup(), "<div>abc</div>");
    assert_eq!(session.tree().leaves(session.tree().root()), vec![leaf]);
    assert_eq!(session.selection().start, Point::new(leaf, 0));
}

#[test]
fn ordered_list_toggle_across_paragraphs() {
    let mut session = session("<p>A</p><p>B</p>");
    select_all(&mut session);

    session.toggle_block(BlockStyle::List(ListKind::Ordered));
    assert_eq!(session.to_markup(), "<ol><li>A</li><li>B</li></ol>");

    session.toggle_block(BlockStyle::List(ListKind::Ordered));
    assert_eq!(session.to_markup(), "<div>A</div><div>B</div>");
    assert!(violations(session.tree()).is_empty());
}

#[test]
fn link_survives_indent() {
    let mut session = session("<p>hello world</p>");
    let leaf = session.tree().leaves(session.tree().root())[0];
    session.set_selection(Selection::new(Point::new(leaf, 6), Point::new(leaf, 11)));
    session.toggle_inline(InlineStyle::Link("http://x".into()));
    assert_eq!(
        session.to_markup(),
        r#"<div>hello <a href="http://x">world</a></div>"#
    );

    select_all(&mut session);
    session.indent();
    assert_snapshot!(
        session.to_markup(),
        @r#"<div style="margin-left: 40px"><div>hello <a href="http://x">world</a></div></div>"#
    );
}

#[test]
fn saving_twice_without_changes_adds_one_entry() {
    let mut session = session("<p>abc</p>");
    let depth = session.history().undo_depth();

    session.insert_text("d");
    assert!(session.save());
    assert!(!session.save());
    assert_eq!(session.history().undo_depth(), depth + 1);
}

#[test]
fn typing_a_paragraph_with_undo_checkpoints() {
    // Given a session where the user types, styles and types again
    let mut session = Session::new(SessionOptions::default());
    session.insert_text("Title");
    session.set_block(BlockStyle::Heading(1));
    session.insert_text("\nBody ");
    session.toggle_inline(InlineStyle::Italic);
    session.insert_text("text");

    assert_snapshot!(session.to_markup(), @"<h1>Title</h1><div>Body <i>text</i></div>");

    // When undoing every checkpoint
    let mut steps = 0;
    while session.undo().is_some() {
        steps += 1;
    }

    // Then the document is back to the typed title, before any styling
    assert_eq!(steps, 2);
    assert_eq!(session.to_markup(), "<div>Title</div>");

    // And redo walks forward to the final state
    while session.redo().is_some() {}
    assert_eq!(session.to_markup(), "<h1>Title</h1><div>Body <i>text</i></div>");
}
