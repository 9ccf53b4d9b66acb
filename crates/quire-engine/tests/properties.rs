//! Properties that hold for any input, checked over representative cases.

use pretty_assertions::assert_eq;
use quire_engine::history::{Checkpoint, History};
use quire_engine::invariants::violations;
use quire_engine::render::to_markup;
use quire_engine::sanitize::sanitize_markup;
use quire_engine::{
    Alignment, BlockStyle, InlineStyle, ListKind, Point, Selection, Session, SessionOptions,
    block, inline,
};
use rstest::rstest;

const MESSY_INPUTS: &[&str] = &[
    "<p>Hello <b>world</b></p>",
    "<b><p>bold para</p><p>second</p></b>",
    "<div><span style=\"font-weight: bold; color: red\">x<i>y</i></span>z</div>",
    "<ul><li>a<ul><li>b</li></ul></li><p>stray</p></ul>",
    "<blockquote>loose <em>text</em><h2>head</h2></blockquote>",
    "<table><tr><td>cell</td><td><a href=\"https://a.b\">link</a></td></tr></table>",
    "text<br><br>more<img src=\"x.png\" onerror=\"bad()\">",
    "<p style=\"margin-left: 80px; text-align: right\">deep</p>",
    "<i><b>a</b></i><b><i>b</i></b>",
    "<h1><ol><li>odd</li></ol></h1>",
];

#[rstest]
fn sanitizing_twice_changes_nothing(#[values(0, 1, 2, 3, 4, 5, 6, 7, 8, 9)] case: usize) {
    let once = to_markup(&sanitize_markup(MESSY_INPUTS[case]));
    let twice = to_markup(&sanitize_markup(&once));
    assert_eq!(once, twice);
}

#[rstest]
fn sanitized_trees_satisfy_the_grammar(#[values(0, 1, 2, 3, 4, 5, 6, 7, 8, 9)] case: usize) {
    let tree = sanitize_markup(MESSY_INPUTS[case]);
    assert_eq!(violations(&tree), vec![]);
}

#[rstest]
#[case::bold(InlineStyle::Bold)]
#[case::superscript(InlineStyle::Superscript)]
#[case::link(InlineStyle::Link("https://example.com".into()))]
#[case::color(InlineStyle::Color("#ff0000".into()))]
fn inline_style_round_trip(#[case] style: InlineStyle) {
    // Given a document with mixed formatting
    let mut tree = sanitize_markup("<p>plain <i>italic</i> end</p><p>next</p>");
    let before = to_markup(&tree);

    // When a style is applied to everything and removed again
    let all = Selection::all(&tree);
    let all = inline::apply(&mut tree, all, &style);
    assert!(violations(&tree).is_empty());
    inline::remove(&mut tree, all, &style);

    // Then the document is unchanged
    assert_eq!(to_markup(&tree), before);
}

#[rstest]
#[case::heading(BlockStyle::Heading(3))]
#[case::quote(BlockStyle::Quote)]
#[case::align(BlockStyle::Align(Alignment::Center))]
#[case::ordered(BlockStyle::List(ListKind::Ordered))]
#[case::unordered(BlockStyle::List(ListKind::Unordered))]
fn block_operations_keep_children_uniform(#[case] style: BlockStyle) {
    let mut tree = sanitize_markup("<p>a <b>b</b></p><ul><li>c</li><li>d</li></ul><p>e</p>");
    let all = Selection::all(&tree);

    let all = block::toggle(&mut tree, all, style);
    assert_eq!(violations(&tree), vec![]);
    let all = block::indent(&mut tree, all);
    assert_eq!(violations(&tree), vec![]);
    let all = block::outdent(&mut tree, all);
    assert_eq!(violations(&tree), vec![]);
    block::toggle(&mut tree, all, style);
    assert_eq!(violations(&tree), vec![]);
}

#[rstest]
fn outdent_reverses_indent_on_list_items(
    #[values("ul", "ol")] tag: &str,
    #[values(2, 3, 4)] len: usize,
    #[values(0, 1, 2, 3)] index: usize,
) {
    if index >= len {
        return;
    }
    // Given a flat list
    let items: String = (0..len).map(|i| format!("<li>item {i}</li>")).collect();
    let mut tree = sanitize_markup(&format!("<{tag}>{items}</{tag}>"));
    let before = to_markup(&tree);
    let leaves = tree.leaves(tree.root());

    // When one item is indented and then outdented
    let caret = Selection::collapsed(Point::new(leaves[index], 0));
    let caret = block::indent(&mut tree, caret);
    assert_eq!(violations(&tree), vec![]);
    block::outdent(&mut tree, caret);

    // Then the list is back as it was
    assert_eq!(to_markup(&tree), before);
}

#[test]
fn history_never_exceeds_its_limit() {
    let mut history = History::new(5);
    let mut session = Session::new(SessionOptions::default());
    for word in ["one ", "two ", "three ", "four ", "five ", "six ", "seven "] {
        session.insert_text(word);
        history.save(Checkpoint::capture(session.tree(), session.selection()));
        assert!(history.undo_depth() <= history.limit());
    }
    assert_eq!(history.undo_depth(), 5);
}

#[test]
fn undo_then_redo_is_the_identity() {
    let mut session = Session::new(SessionOptions {
        history_limit: 10,
        ..Default::default()
    });
    session.insert_text("first line\nsecond line");
    let all = Selection::all(session.tree());
    session.set_selection(all);
    session.toggle_block(BlockStyle::List(ListKind::Unordered));
    session.toggle_inline(InlineStyle::Underline);
    let before = session.export();

    assert!(session.undo().is_some());
    assert_ne!(session.export(), before);
    assert!(session.redo().is_some());

    assert_eq!(session.export(), before);
}
