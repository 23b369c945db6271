//! Document lifecycle tests: write/load, normalization, ready state, and
//! lifecycle events.

use marlin_browser::{NoopExecutor, Page};
use marlin_common::net::MemoryResourceProvider;
use marlin_dom::{Event, NodeId, ReadyState};
use std::sync::{Arc, Mutex};

fn parsing_page() -> Page {
    Page::new(
        Arc::new(MemoryResourceProvider::new()),
        Box::new(NoopExecutor::new()),
    )
}

#[test]
fn fresh_page_is_loading_with_an_implicit_root() {
    let page = parsing_page();
    assert_eq!(page.ready_state(), ReadyState::Loading);
    let html = page.document_element().expect("implicit root");
    page.with_document(|doc| {
        assert!(doc.as_element(html).unwrap().matches_tag("html"));
    });
}

#[test]
fn write_wraps_content_in_a_single_html_root() {
    let page = parsing_page();
    page.write("<p>hello</p>");

    let html = page.document_element().expect("document element");
    page.with_document(|doc| {
        assert!(doc.as_element(html).unwrap().matches_tag("html"));
        let children = doc.children(html);
        assert_eq!(children.len(), 1);
        assert!(doc.as_element(children[0]).unwrap().matches_tag("p"));
        assert!(doc.is_in_document(children[0]));
    });
    assert_eq!(page.ready_state(), ReadyState::Complete);
}

#[test]
fn write_preserves_an_explicit_html_document() {
    let page = parsing_page();
    page.write("<html><head></head><body><p id='x'>t</p></body></html>");

    assert!(page.head().is_some());
    assert!(page.body().is_some());
    let p = page.get_element_by_id("x").expect("p#x");
    assert_eq!(page.text_content(p), "t");
}

#[test]
fn multiple_top_level_nodes_are_reparented_under_html() {
    let page = parsing_page();
    page.write("<div id='a'>a</div><div id='b'>b</div>");

    let html = page.document_element().unwrap();
    page.with_document(|doc| {
        let children = doc.children(html).to_vec();
        assert_eq!(children.len(), 2);
        for child in children {
            assert_eq!(doc.parent(child), Some(html));
        }
    });
}

#[test]
fn write_replaces_the_previous_tree() {
    let page = parsing_page();
    page.write("<p id='old'>old</p>");
    assert!(page.get_element_by_id("old").is_some());

    page.write("<p id='new'>new</p>");
    assert!(page.get_element_by_id("old").is_none());
    assert!(page.get_element_by_id("new").is_some());
}

#[test]
fn dom_content_loaded_fires_before_load() {
    let page = parsing_page();
    let order = Arc::new(Mutex::new(Vec::new()));

    for event_type in ["DOMContentLoaded", "load"] {
        let order = Arc::clone(&order);
        let _ = page.add_event_listener(
            NodeId::ROOT,
            event_type,
            Arc::new(move |event: &mut Event| {
                order.lock().unwrap().push(event.event_type.clone());
            }),
        );
    }

    page.write("<body></body>");
    assert_eq!(*order.lock().unwrap(), vec!["DOMContentLoaded", "load"]);
}

#[test]
fn ready_state_is_complete_when_load_fires() {
    let page = parsing_page();
    let seen = Arc::new(Mutex::new(None));
    {
        let seen = Arc::clone(&seen);
        let observer = page.clone();
        let _ = page.add_event_listener(
            NodeId::ROOT,
            "load",
            Arc::new(move |_event: &mut Event| {
                *seen.lock().unwrap() = Some(observer.ready_state());
            }),
        );
    }

    page.write("<body></body>");
    assert_eq!(*seen.lock().unwrap(), Some(ReadyState::Complete));
}

#[test]
fn incremental_insertion_after_complete_rescans_immediately() {
    let page = parsing_page();
    page.write("<body></body>");
    let body = page.body().expect("body");

    let loads = Arc::new(Mutex::new(0));
    {
        let loads = Arc::clone(&loads);
        let _ = page.add_event_listener(
            NodeId::ROOT,
            "load",
            Arc::new(move |_event: &mut Event| {
                *loads.lock().unwrap() += 1;
            }),
        );
    }

    let inserted = page.append_html(body, "<p id='late'>late</p>");
    assert_eq!(inserted.len(), 1);
    assert!(page.get_element_by_id("late").is_some());
    // The delayed-resource queue drains (and fires `load`) per insertion
    // once the document is complete.
    assert_eq!(*loads.lock().unwrap(), 1);
}

#[test]
fn node_inserted_observers_see_attached_subtrees() {
    let page = parsing_page();
    page.write("<body></body>");
    let body = page.body().unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        page.on_node_inserted(move |node| seen.lock().unwrap().push(node));
    }

    let div = page.create_element("div").unwrap();
    page.append_child(body, div);
    assert_eq!(*seen.lock().unwrap(), vec![div]);

    // Detached insertions are not observed.
    let orphan_parent = page.create_element("div").unwrap();
    let orphan_child = page.create_element("span").unwrap();
    page.append_child(orphan_parent, orphan_child);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn doctype_is_kept_through_load() {
    let page = parsing_page();
    page.write("<!DOCTYPE html><html><body></body></html>");
    page.with_document(|doc| assert_eq!(doc.doctype(), Some("html")));
}

#[test]
fn query_selector_reads_the_live_tree() {
    let page = parsing_page();
    page.write("<div class='foo'><span id='target'></span></div><span></span>");

    let hit = page.query_selector("div.foo > span").expect("span match");
    assert_eq!(page.get_element_by_id("target"), Some(hit));
    assert_eq!(page.query_selector_all("span").len(), 2);
}

#[test]
fn load_url_sets_the_base_for_relative_sources() {
    let provider = Arc::new(MemoryResourceProvider::new());
    provider.insert_text("http://host/deep/page.html", "<p id='fetched'>ok</p>");

    let page = Page::new(provider, Box::new(NoopExecutor::new()));
    page.load_url("http://host/deep/page.html").unwrap();

    assert!(page.get_element_by_id("fetched").is_some());
    page.with_document(|doc| assert_eq!(doc.base_url(), Some("http://host/deep/page.html")));
}

#[test]
fn load_url_fails_on_missing_route() {
    let page = parsing_page();
    assert!(page.load_url("http://nowhere/page.html").is_err());
}
