//! Serializable snapshots of the document tree.
//!
//! Snapshots are the debugging surface: a plain-data rendering of the
//! live tree that serializes cleanly to JSON for inspection and golden
//! tests.

use marlin_dom::{Document, NodeId, NodeKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// A plain-data copy of one node and its subtree.
///
/// Attribute order is normalized (sorted by name) so snapshots compare
/// stably.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeSnapshot {
    /// The document node.
    #[serde(rename_all = "camelCase")]
    Document {
        /// Doctype text, if the parser saw one.
        doctype: Option<String>,
        /// Child snapshots in document order.
        children: Vec<NodeSnapshot>,
    },
    /// An element with its attributes.
    #[serde(rename_all = "camelCase")]
    Element {
        /// Tag name in its original spelling.
        tag_name: String,
        /// Attributes, sorted by lowercased name.
        attributes: BTreeMap<String, String>,
        /// Child snapshots in document order.
        children: Vec<NodeSnapshot>,
    },
    /// A text node.
    Text {
        /// The character data.
        text: String,
    },
    /// A comment node.
    Comment {
        /// The comment payload.
        text: String,
    },
}

/// Snapshot the subtree rooted at `node`.
///
/// Fragment and attribute nodes have no snapshot form; they collapse to
/// an empty text node if asked for directly.
#[must_use]
pub fn snapshot(document: &Document, node: NodeId) -> NodeSnapshot {
    let children = |id: NodeId| -> Vec<NodeSnapshot> {
        document
            .children(id)
            .iter()
            .map(|&child| snapshot(document, child))
            .collect()
    };

    match document.get(node).map(|n| &n.kind) {
        Some(NodeKind::Document) => NodeSnapshot::Document {
            doctype: document.doctype().map(str::to_string),
            children: children(node),
        },
        Some(NodeKind::Element(data)) => NodeSnapshot::Element {
            tag_name: data.tag_name.clone(),
            attributes: data
                .attributes()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            children: children(node),
        },
        Some(NodeKind::Text(text)) => NodeSnapshot::Text { text: text.clone() },
        Some(NodeKind::Comment(text)) => NodeSnapshot::Comment { text: text.clone() },
        _ => NodeSnapshot::Text {
            text: String::new(),
        },
    }
}
