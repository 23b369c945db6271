//! CSS selector engine for the Marlin document engine.
//!
//! # Scope
//!
//! Only selector *matching* lives here — the piece the document tree
//! needs for id/class/tag queries. There is no cascade, no specificity,
//! no layout.
//!
//! ```
//! use marlin_css::Selector;
//! use marlin_dom::Document;
//!
//! let mut doc = Document::new();
//! let html = doc.document_element().unwrap();
//! let div = doc.create_element("div").unwrap();
//! doc.as_element_mut(div).unwrap().set_attribute("class", "foo");
//! doc.append_child(html, div);
//! let span = doc.create_element("span").unwrap();
//! doc.append_child(div, span);
//!
//! assert!(Selector::parse("div.foo > span").matches(&doc, span));
//! ```

/// Selector parsing and matching.
pub mod selector;

pub use selector::{Combinator, CompoundSelector, Selector, SimpleSelector};
