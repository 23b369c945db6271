//! Selector matching tests against parsed documents.

use marlin_css::Selector;
use marlin_dom::{Document, NodeId};
use marlin_html::parse_into;

/// Parse markup and attach it under the implicit `html` root.
fn load(html: &str) -> Document {
    let mut doc = Document::new();
    let tops = parse_into(&mut doc, html);
    let root = doc.document_element().unwrap();
    for top in tops {
        doc.append_child(root, top);
    }
    doc
}

fn tag_of(doc: &Document, id: NodeId) -> String {
    doc.as_element(id).unwrap().tag_name.clone()
}

#[test]
fn id_selector() {
    let doc = load("<div id='a'><p id='b'></p></div>");
    let hit = Selector::parse("#b").query_first(&doc).unwrap();
    assert_eq!(tag_of(&doc, hit), "p");
    assert!(Selector::parse("#missing").query_first(&doc).is_none());
}

#[test]
fn class_selector() {
    let doc = load("<div class='x y'></div><div class='z'></div>");
    let hits = Selector::parse(".y").query_all(&doc);
    assert_eq!(hits.len(), 1);
    assert_eq!(
        doc.as_element(hits[0]).unwrap().get_attribute("class"),
        Some("x y")
    );
}

#[test]
fn type_selector_is_case_insensitive() {
    let doc = load("<DIV></DIV>");
    assert_eq!(Selector::parse("div").query_all(&doc).len(), 1);
    assert_eq!(Selector::parse("DIV").query_all(&doc).len(), 1);
}

#[test]
fn universal_selector_matches_every_element() {
    let doc = load("<div><span></span></div>");
    // html, div, span
    assert_eq!(Selector::parse("*").query_all(&doc).len(), 3);
}

#[test]
fn tag_set_alternatives() {
    let doc = load("<div></div><span></span><p></p>");
    let hits = Selector::parse("div,span").query_all(&doc);
    let tags: Vec<String> = hits.iter().map(|&h| tag_of(&doc, h)).collect();
    assert_eq!(tags, vec!["div", "span"]);
}

#[test]
fn child_combinator_requires_the_direct_parent() {
    let doc = load("<div class='foo'><span id='direct'></span><p><span id='nested'></span></p></div>");
    let selector = Selector::parse("div.foo > span");

    let direct = doc.get_element_by_id("direct").unwrap();
    let nested = doc.get_element_by_id("nested").unwrap();
    assert!(selector.matches(&doc, direct));
    assert!(!selector.matches(&doc, nested));
}

#[test]
fn descendant_combinator_searches_all_ancestors() {
    let doc = load("<div id='top'><p><b><span id='deep'></span></b></p></div>");
    let deep = doc.get_element_by_id("deep").unwrap();

    assert!(Selector::parse("div span").matches(&doc, deep));
    assert!(Selector::parse("#top span").matches(&doc, deep));
    assert!(!Selector::parse("ul span").matches(&doc, deep));
}

#[test]
fn three_link_chain() {
    let doc = load("<ul><li><b id='hit'></b></li></ul><b id='miss'></b>");
    let selector = Selector::parse("ul li b");

    let hit = doc.get_element_by_id("hit").unwrap();
    let miss = doc.get_element_by_id("miss").unwrap();
    assert!(selector.matches(&doc, hit));
    assert!(!selector.matches(&doc, miss));
}

#[test]
fn compound_conditions_apply_to_one_element() {
    let doc = load("<div class='foo' id='d'></div><div class='bar'></div>");
    let d = doc.get_element_by_id("d").unwrap();

    assert!(Selector::parse("div.foo").matches(&doc, d));
    assert!(Selector::parse("div#d.foo").matches(&doc, d));
    assert!(!Selector::parse("span.foo").matches(&doc, d));
    assert!(!Selector::parse("div.bar").matches(&doc, d));
}

#[test]
fn matching_short_circuits_on_the_head() {
    let doc = load("<div class='foo'><span></span></div>");
    let div = Selector::parse("div").query_first(&doc).unwrap();
    // Head is `span`; a div can never match regardless of ancestry.
    assert!(!Selector::parse("div.foo > span").matches(&doc, div));
}

#[test]
fn query_all_is_document_order() {
    let doc = load("<div id='a'><div id='b'></div></div><div id='c'></div>");
    let hits = Selector::parse("div").query_all(&doc);
    let ids: Vec<&str> = hits
        .iter()
        .map(|&h| doc.as_element(h).unwrap().id().unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}
