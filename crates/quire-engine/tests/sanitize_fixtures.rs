use pretty_assertions::assert_eq;
use quire_engine::invariants::violations;
use quire_engine::render::to_markup;
use quire_engine::sanitize::sanitize_markup;

#[test]
fn fixture_article() {
    assert_fixture("article");
}

#[test]
fn fixture_quote_and_align() {
    assert_fixture("quote_and_align");
}

fn assert_fixture(name: &str) {
    let read = |suffix: &str| {
        std::fs::read_to_string(format!(
            "{}/tests/fixtures/{name}{suffix}",
            env!("CARGO_MANIFEST_DIR")
        ))
        .unwrap()
    };
    let input = read(".html");
    let expected = read(".expected.html");

    let tree = sanitize_markup(&input);
    assert_eq!(violations(&tree), vec![]);
    assert_eq!(to_markup(&tree), expected.trim_end());
}
