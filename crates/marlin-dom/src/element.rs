//! Element data: tag identity, attributes, and per-kind specialization.

use std::collections::{HashMap, HashSet};

/// How a node entered the tree.
///
/// The script scheduler treats programmatically inserted scripts
/// differently from scripts produced by the initial markup parse (they
/// always run asynchronously once loaded), so every element records which
/// path created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOrigin {
    /// Created by the tree builder from markup.
    FromParse,
    /// Created through the document's programmatic API.
    FromScriptInsertion,
}

/// Script-specific element state.
///
/// [§ 4.12.1 The script element](https://html.spec.whatwg.org/multipage/scripting.html#the-script-element)
///
/// The `src`/`type`/`async`/`defer` inputs live in the attribute map like
/// any other attribute; this struct holds only the state the scheduler
/// mutates.
#[derive(Debug, Clone)]
pub struct ScriptData {
    /// Which path created the element; fixed at creation time.
    pub origin: NodeOrigin,
    /// Set to `true` exactly once, by the scheduler, never reset.
    ///
    /// "The script element has a flag indicating whether or not it has
    /// been 'already started'."
    pub executed: bool,
    /// Whether a load for the element's `src` has been initiated. The
    /// best-effort delayed-resource pass skips scripts whose load is
    /// already in flight.
    pub load_started: bool,
    /// Source text of a completed remote load. Takes precedence over the
    /// element's text children when present.
    pub fetched_source: Option<String>,
}

impl ScriptData {
    /// Fresh, unexecuted script state.
    #[must_use]
    pub const fn new(origin: NodeOrigin) -> Self {
        Self {
            origin,
            executed: false,
            load_started: false,
            fetched_source: None,
        }
    }
}

/// Per-tag element specialization, chosen once from the tag name at
/// creation time.
///
/// A closed set of variants stands in for an open subclass hierarchy:
/// generic element behavior lives on [`ElementData`], variant-specific
/// state hangs off the kind.
#[derive(Debug, Clone)]
pub enum ElementKind {
    /// Any element without specialized behavior.
    Generic,
    /// [§ 4.12.1](https://html.spec.whatwg.org/multipage/scripting.html#the-script-element)
    /// `<script>`, carrying scheduler state.
    Script(ScriptData),
    /// [§ 4.2.1](https://html.spec.whatwg.org/multipage/semantics.html#the-head-element)
    /// `<head>`.
    Head,
    /// [§ 4.3.1](https://html.spec.whatwg.org/multipage/sections.html#the-body-element)
    /// `<body>`.
    Body,
}

impl ElementKind {
    /// Pick the specialization for a tag name (matched case-insensitively).
    #[must_use]
    pub fn from_tag(tag_name: &str, origin: NodeOrigin) -> Self {
        match tag_name.to_ascii_lowercase().as_str() {
            "script" => Self::Script(ScriptData::new(origin)),
            "head" => Self::Head,
            "body" => Self::Body,
            _ => Self::Generic,
        }
    }
}

/// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
///
/// Tag identity is case-insensitive but the original spelling is kept for
/// display. Attribute names are case-insensitive; the map stores them
/// lowercased (insertion order is not significant).
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name as written in the source.
    pub tag_name: String,
    /// Attribute map, keyed by lowercased attribute name.
    attrs: HashMap<String, String>,
    /// Variant-specific state.
    pub kind: ElementKind,
}

impl ElementData {
    /// Create element data for `tag_name`, picking the kind variant.
    #[must_use]
    pub fn new(tag_name: &str, origin: NodeOrigin) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            attrs: HashMap::new(),
            kind: ElementKind::from_tag(tag_name, origin),
        }
    }

    /// Whether this element's tag equals `name`, ignoring ASCII case.
    #[must_use]
    pub fn matches_tag(&self, name: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(name)
    }

    /// Attribute value by case-insensitive name.
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether an attribute is present, regardless of value.
    ///
    /// Boolean attributes such as `async` and `defer` are represented by
    /// presence with an empty value.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attrs.contains_key(&name.to_ascii_lowercase())
    }

    /// Set (or overwrite) an attribute.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let _ = self
            .attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attrs.remove(&name.to_ascii_lowercase())
    }

    /// Iterate over `(name, value)` attribute pairs in arbitrary order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// The element's `id` attribute, if present.
    ///
    /// [§ 3.2.6 Global attributes](https://html.spec.whatwg.org/multipage/dom.html#global-attributes)
    /// "The id attribute specifies its element's unique identifier (ID)."
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id")
    }

    /// The set of class names from the `class` attribute.
    ///
    /// "The class attribute, if specified, must have a value that is a set
    /// of space-separated tokens."
    #[must_use]
    pub fn classes(&self) -> HashSet<&str> {
        self.get_attribute("class")
            .map(|list| list.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Script state, if this element is a `<script>`.
    #[must_use]
    pub const fn script(&self) -> Option<&ScriptData> {
        match &self.kind {
            ElementKind::Script(data) => Some(data),
            _ => None,
        }
    }

    /// Mutable script state, if this element is a `<script>`.
    pub fn script_mut(&mut self) -> Option<&mut ScriptData> {
        match &mut self.kind {
            ElementKind::Script(data) => Some(data),
            _ => None,
        }
    }
}

/// Data carried by a standalone attribute node
/// ([`crate::NodeKind::Attribute`]).
#[derive(Debug, Clone)]
pub struct AttributeData {
    /// Attribute name, stored lowercased.
    pub name: String,
    /// Attribute value.
    pub value: String,
}
