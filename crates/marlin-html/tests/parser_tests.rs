//! Tests for open-element-stack tree construction and its recovery rules.

use marlin_dom::{Document, NodeId, NodeKind, NodeOrigin};
use marlin_html::parse_into;

/// Parse and return the document plus its top-level nodes.
fn parse(html: &str) -> (Document, Vec<NodeId>) {
    let mut doc = Document::new();
    let tops = parse_into(&mut doc, html);
    (doc, tops)
}

/// Compact structural rendering used for whole-tree comparisons.
fn shape(doc: &Document, nodes: &[NodeId]) -> String {
    let mut out = String::new();
    for &node in nodes {
        match doc.get(node).map(|n| &n.kind) {
            Some(NodeKind::Element(data)) => {
                out.push('<');
                out.push_str(&data.tag_name);
                out.push('>');
                out.push_str(&shape(doc, doc.children(node)));
                out.push_str("</");
                out.push_str(&data.tag_name);
                out.push('>');
            }
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::Comment(text)) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            _ => {}
        }
    }
    out
}

#[test]
fn simple_element() {
    let (doc, tops) = parse("<p id='8'>Text</p>");
    assert_eq!(tops.len(), 1);

    let p = doc.as_element(tops[0]).expect("element");
    assert_eq!(p.tag_name, "p");
    assert_eq!(p.get_attribute("id"), Some("8"));
    assert_eq!(p.attributes().count(), 1);

    let children = doc.children(tops[0]);
    assert_eq!(children.len(), 1);
    assert_eq!(doc.as_text(children[0]), Some("Text"));
}

#[test]
fn text_only_input() {
    let (doc, tops) = parse("Hello");
    assert_eq!(tops.len(), 1);
    assert_eq!(doc.as_text(tops[0]), Some("Hello"));
}

#[test]
fn embedded_script_text_is_captured() {
    let cases = [
        ("<script>alert('1');</script>", "alert('1');"),
        (
            "<script>var html = '<div></div>';</script>",
            "var html = '<div></div>';",
        ),
        ("<script>var html = '<div>';</script>", "var html = '<div>';"),
        (
            "<script>var html = '<div />';</script>",
            "var html = '<div />';",
        ),
        (
            "<script>var html = '<script>console.log(1);</script>';</script>",
            "var html = '<script>console.log(1);</script>';",
        ),
    ];
    for (html, expected) in cases {
        let (doc, tops) = parse(html);
        assert_eq!(tops.len(), 1, "one script element for {html}");

        let element = doc.as_element(tops[0]).expect("element");
        assert_eq!(element.tag_name, "script");
        assert_eq!(element.attributes().count(), 0);
        assert_eq!(doc.script_text(tops[0]).as_deref(), Some(expected));
    }
}

#[test]
fn parsed_scripts_record_parse_origin() {
    let (doc, tops) = parse("<script>x();</script>");
    let script = doc.as_element(tops[0]).unwrap().script().unwrap();
    assert_eq!(script.origin, NodeOrigin::FromParse);
    assert!(!script.executed);
}

#[test]
fn container_close_implicitly_closes_open_children() {
    // div ends up with exactly one li child and no trailing sibling.
    let (doc, tops) = parse("<div><li></div>");
    assert_eq!(tops.len(), 1);

    let div = tops[0];
    assert!(doc.as_element(div).unwrap().matches_tag("div"));
    let children = doc.children(div);
    assert_eq!(children.len(), 1);
    assert!(doc.as_element(children[0]).unwrap().matches_tag("li"));
    assert!(doc.children(children[0]).is_empty());
}

#[test]
fn select_closes_open_option() {
    let (doc, tops) = parse("<select><option>1</select>");
    assert_eq!(shape(&doc, &tops), "<select><option>1</option></select>");
}

#[test]
fn end_tag_pops_everything_above_the_match() {
    let (doc, tops) = parse("<ul><li><b>x</ul>after");
    assert_eq!(shape(&doc, &tops), "<ul><li><b>x</b></li></ul>after");
}

#[test]
fn stray_end_tag_has_no_structural_effect() {
    let (with_stray, tops_a) = parse("<div><p>a</p></div></ul><span>b</span>");
    let (without, tops_b) = parse("<div><p>a</p></div><span>b</span>");
    assert_eq!(shape(&with_stray, &tops_a), shape(&without, &tops_b));
}

#[test]
fn end_tag_matching_is_case_insensitive() {
    let (doc, tops) = parse("<DIV>x</div><p>y</P>");
    assert_eq!(shape(&doc, &tops), "<DIV>x</DIV><p>y</p>");
}

#[test]
fn comments_become_comment_nodes() {
    let (doc, tops) = parse("<div><!--Com--></div>");
    let children = doc.children(tops[0]);
    assert_eq!(children.len(), 1);
    assert_eq!(doc.as_comment(children[0]), Some("Com"));
}

#[test]
fn doctype_is_recorded_on_the_document() {
    let (doc, _tops) = parse("<!DOCTYPE html><p></p>");
    assert_eq!(doc.doctype(), Some("html"));
}

#[test]
fn attributes_attach_to_the_open_element() {
    let (doc, tops) = parse("<div class='a'><span id='s'></span></div>");
    let div = doc.as_element(tops[0]).unwrap();
    assert_eq!(div.get_attribute("class"), Some("a"));

    let span = doc.children(tops[0])[0];
    assert_eq!(doc.as_element(span).unwrap().get_attribute("id"), Some("s"));
}

#[test]
fn boolean_attribute_is_present_with_empty_value() {
    let (doc, tops) = parse("<script defer src='x.js'></script>");
    let script = doc.as_element(tops[0]).unwrap();
    assert!(script.has_attribute("defer"));
    assert_eq!(script.get_attribute("defer"), Some(""));
    assert_eq!(script.get_attribute("src"), Some("x.js"));
}

#[test]
fn self_closing_tags_nest_nothing() {
    let (doc, tops) = parse("<div><br/>text</div>");
    let children = doc.children(tops[0]);
    assert_eq!(children.len(), 2);
    assert!(doc.as_element(children[0]).unwrap().matches_tag("br"));
    assert!(doc.children(children[0]).is_empty());
    assert_eq!(doc.as_text(children[1]), Some("text"));
}

#[test]
fn top_level_nodes_come_back_detached() {
    let (doc, tops) = parse("<div></div><span></span>");
    assert_eq!(tops.len(), 2);
    for &top in &tops {
        assert_eq!(doc.parent(top), None);
        assert!(!doc.is_in_document(top));
    }
}

#[test]
fn multiple_top_level_nodes_preserve_order() {
    let (doc, tops) = parse("a<b>c</b>d");
    assert_eq!(shape(&doc, &tops), "a<b>c</b>d");
}
