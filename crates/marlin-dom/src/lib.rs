//! DOM tree implementation for the Marlin document engine.
//!
//! This crate provides an arena-based DOM tree structure following the
//! [DOM Living Standard](https://dom.spec.whatwg.org/).
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all
//! relationships. Parent and owner-document back-references are stored as
//! indices rather than live references, which keeps the mutable, shared
//! tree free of ownership cycles and borrow-checker friction.
//!
//! The [`Document`] *is* the arena: every node a document creates lives in
//! its node table for the document's whole lifetime, and a node is "in the
//! document" exactly when its owner index points at the document root.

mod element;
mod error;
mod event;

pub use element::{AttributeData, ElementData, ElementKind, NodeOrigin, ScriptData};
pub use error::DomError;
pub use event::{Event, ListenerCallback, ListenerId};

use event::ListenerEntry;
use std::collections::HashMap;
use std::fmt;
use strum_macros::Display;

/// A type-safe index into the DOM tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
///
/// `NodeId` provides O(1) access to any node in the tree without borrowing
/// issues, and stays valid for the owning document's lifetime (removal
/// detaches a node but never deallocates it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The document node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub kind: NodeKind,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    /// "An object that participates in a tree has a parent, which is
    /// either null or an object."
    pub parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"; order is document
    /// order. Sibling navigation is derived from this list.
    pub children: Vec<NodeId>,

    /// Owner-document back-reference: `Some(NodeId::ROOT)` once the node
    /// is attached under the document root, `None` while detached.
    pub owner: Option<NodeId>,
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    Document,
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element(ElementData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    Text(String),
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(String),
    /// [§ 4.8 Interface DocumentFragment](https://dom.spec.whatwg.org/#interface-documentfragment)
    ///
    /// Appending a fragment splices its children in place; the fragment
    /// node itself never enters the tree.
    Fragment,
    /// [§ 4.9.2 Interface Attr](https://dom.spec.whatwg.org/#interface-attr)
    ///
    /// Standalone attribute node. Excluded from script scanning.
    Attribute(AttributeData),
}

/// [Document readiness](https://html.spec.whatwg.org/multipage/dom.html#current-document-readiness)
///
/// Transitions are monotonic. `Interactive` is defined for completeness but
/// the engine's lifecycle currently steps straight from `Loading` to
/// `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum ReadyState {
    /// The document is being loaded or replaced.
    Loading,
    /// Reserved intermediate state; never entered by the current lifecycle.
    Interactive,
    /// Loading finished, DOMContentLoaded has fired.
    Complete,
}

/// Arena-based document tree with O(1) node access.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// "The DOM represents a document as a tree."
///
/// All nodes live in a contiguous vector indexed by [`NodeId`]; the
/// document node itself occupies index 0 and doubles as the tree's root
/// container.
pub struct Document {
    /// All nodes ever created by this document, indexed by `NodeId`.
    nodes: Vec<Node>,
    /// Listener lists keyed by node index.
    listeners: HashMap<usize, Vec<ListenerEntry>>,
    /// Monotonic source for [`ListenerId`]s.
    next_listener: usize,
    ready_state: ReadyState,
    doctype: Option<String>,
    base_url: Option<String>,
}

impl Document {
    /// Create an empty document: the document node plus an implicit `html`
    /// root element.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                owner: Some(NodeId::ROOT),
            }],
            listeners: HashMap::new(),
            next_listener: 0,
            ready_state: ReadyState::Loading,
            doctype: None,
            base_url: None,
        };
        let html = doc.alloc(NodeKind::Element(ElementData::new(
            "html",
            NodeOrigin::FromParse,
        )));
        doc.append_child(NodeId::ROOT, html);
        doc
    }

    /// The document node's ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes in the arena (attached or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty (never true: the document node exists).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable node by ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Allocate a new detached node and return its ID.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
            owner: None,
        });
        id
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// [§ 4.5](https://dom.spec.whatwg.org/#dom-document-createelement)
    ///
    /// "The createElement(localName) method steps are..."
    ///
    /// Elements created through this call are tagged
    /// [`NodeOrigin::FromScriptInsertion`]; the tree builder uses
    /// [`Document::create_element_of_origin`] instead.
    ///
    /// # Errors
    ///
    /// [`DomError::EmptyTagName`] if `tag_name` is empty.
    pub fn create_element(&mut self, tag_name: &str) -> Result<NodeId, DomError> {
        self.create_element_of_origin(tag_name, NodeOrigin::FromScriptInsertion)
    }

    /// Create an element recording how it entered the tree.
    ///
    /// # Errors
    ///
    /// [`DomError::EmptyTagName`] if `tag_name` is empty.
    pub fn create_element_of_origin(
        &mut self,
        tag_name: &str,
        origin: NodeOrigin,
    ) -> Result<NodeId, DomError> {
        if tag_name.is_empty() {
            return Err(DomError::EmptyTagName);
        }
        Ok(self.alloc(NodeKind::Element(ElementData::new(tag_name, origin))))
    }

    /// [§ 4.5](https://dom.spec.whatwg.org/#dom-document-createtextnode)
    pub fn create_text_node(&mut self, data: &str) -> NodeId {
        self.alloc(NodeKind::Text(data.to_string()))
    }

    /// [§ 4.5](https://dom.spec.whatwg.org/#dom-document-createcomment)
    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.alloc(NodeKind::Comment(data.to_string()))
    }

    /// [§ 4.5](https://dom.spec.whatwg.org/#dom-document-createattribute)
    ///
    /// # Errors
    ///
    /// [`DomError::EmptyAttributeName`] if `name` is empty.
    pub fn create_attribute(&mut self, name: &str) -> Result<NodeId, DomError> {
        if name.is_empty() {
            return Err(DomError::EmptyAttributeName);
        }
        Ok(self.alloc(NodeKind::Attribute(AttributeData {
            name: name.to_ascii_lowercase(),
            value: String::new(),
        })))
    }

    /// [§ 4.5](https://dom.spec.whatwg.org/#dom-document-createdocumentfragment)
    pub fn create_document_fragment(&mut self) -> NodeId {
        self.alloc(NodeKind::Fragment)
    }

    /// [§ 2.5](https://dom.spec.whatwg.org/#dom-document-createevent)
    ///
    /// Only the base `"Event"` interface is supported.
    ///
    /// # Errors
    ///
    /// [`DomError::UnsupportedEventType`] for any other interface name.
    pub fn create_event(&self, interface: &str) -> Result<Event, DomError> {
        if interface == "Event" {
            Ok(Event::new(""))
        } else {
            Err(DomError::UnsupportedEventType(interface.to_string()))
        }
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// Appends `child` as the last child of `parent`. A node already in a
    /// tree is detached from its old parent first. Appending a
    /// [`NodeKind::Fragment`] splices the fragment's children in place.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if matches!(self.nodes[child.0].kind, NodeKind::Fragment) {
            let grandchildren = std::mem::take(&mut self.nodes[child.0].children);
            for grandchild in grandchildren {
                self.nodes[grandchild.0].parent = None;
                self.append_child(parent, grandchild);
            }
            return;
        }

        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        let owner = self.nodes[parent.0].owner;
        self.set_owner_subtree(child, owner);
    }

    /// [§ 4.2.1 Insert](https://dom.spec.whatwg.org/#concept-node-insert)
    ///
    /// Inserts `new_child` immediately before `reference` in `parent`'s
    /// child list. Fragments are spliced.
    ///
    /// # Errors
    ///
    /// [`DomError::NotAChild`] if `reference` is not a child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        reference: NodeId,
    ) -> Result<(), DomError> {
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == reference)
            .ok_or(DomError::NotAChild)?;

        if matches!(self.nodes[new_child.0].kind, NodeKind::Fragment) {
            let grandchildren = std::mem::take(&mut self.nodes[new_child.0].children);
            for (offset, grandchild) in grandchildren.into_iter().enumerate() {
                self.nodes[grandchild.0].parent = Some(parent);
                self.nodes[parent.0].children.insert(index + offset, grandchild);
                let owner = self.nodes[parent.0].owner;
                self.set_owner_subtree(grandchild, owner);
            }
            return Ok(());
        }

        self.detach(new_child);
        self.nodes[parent.0].children.insert(index, new_child);
        self.nodes[new_child.0].parent = Some(parent);
        let owner = self.nodes[parent.0].owner;
        self.set_owner_subtree(new_child, owner);
        Ok(())
    }

    /// [§ 4.2.3 Remove](https://dom.spec.whatwg.org/#concept-node-remove)
    ///
    /// Detaches `child` from `parent` and returns it. The node stays in
    /// the arena and can be re-inserted.
    ///
    /// # Errors
    ///
    /// [`DomError::NotAChild`] if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(DomError::NotAChild)?;
        let _ = self.nodes[parent.0].children.remove(index);
        self.nodes[child.0].parent = None;
        self.set_owner_subtree(child, None);
        Ok(child)
    }

    /// [§ 4.2.4 Replace](https://dom.spec.whatwg.org/#concept-node-replace)
    ///
    /// Replace is insert-then-remove: `new_child` is inserted before
    /// `old_child`, then `old_child` is removed.
    ///
    /// # Errors
    ///
    /// [`DomError::NotAChild`] if `old_child` is not a child of `parent`.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), DomError> {
        self.insert_before(parent, new_child, old_child)?;
        let _ = self.remove_child(parent, old_child)?;
        Ok(())
    }

    /// Detach every child of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) {
        let children = std::mem::take(&mut self.nodes[parent.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
            self.set_owner_subtree(child, None);
        }
    }

    /// Remove `child` from its current parent, if any.
    fn detach(&mut self, child: NodeId) {
        if let Some(old_parent) = self.nodes[child.0].parent {
            self.nodes[old_parent.0].children.retain(|&c| c != child);
            self.nodes[child.0].parent = None;
        }
    }

    /// Set the owner-document back-reference for `id` and its whole
    /// subtree.
    pub(crate) fn set_owner_subtree(&mut self, id: NodeId, owner: Option<NodeId>) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.nodes[current.0].owner = owner;
            stack.extend(self.nodes[current.0].children.iter().copied());
        }
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// The parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// All children of a node, in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// The first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// The last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.last().copied())
    }

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-next-sibling)
    ///
    /// "An object A's next sibling is the object immediately following A
    /// in the children of A's parent." Derived from the parent's child
    /// index.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.get(index + 1).copied()
    }

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-previous-sibling)
    #[must_use]
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        index.checked_sub(1).and_then(|i| siblings.get(i).copied())
    }

    /// Iterate over the ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            document: self,
            current: self.parent(id),
        }
    }

    /// Iterate over `id` and all its descendants, pre-order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            document: self,
            stack: vec![id],
        }
    }

    /// Whether the node is attached under the document root.
    #[must_use]
    pub fn is_in_document(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.owner == Some(NodeId::ROOT))
    }

    // ------------------------------------------------------------------
    // Typed access
    // ------------------------------------------------------------------

    /// Element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Mutable element data if this node is an element.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.kind {
            NodeKind::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Comment content if this node is a comment.
    #[must_use]
    pub fn as_comment(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.kind {
            NodeKind::Comment(s) => Some(s.as_str()),
            _ => None,
        })
    }

    // ------------------------------------------------------------------
    // Document-level queries
    // ------------------------------------------------------------------

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is
    /// that document, if it exists."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .find(|&&id| matches!(self.get(id).map(|n| &n.kind), Some(NodeKind::Element(_))))
            .copied()
    }

    /// [§ 3.1.2](https://html.spec.whatwg.org/multipage/dom.html#dom-document-head)
    ///
    /// The first `head` child of the document element.
    #[must_use]
    pub fn head(&self) -> Option<NodeId> {
        self.child_element_by_tag("head")
    }

    /// [§ 3.1.3 The body element](https://html.spec.whatwg.org/multipage/dom.html#the-body-element-2)
    ///
    /// The first `body` child of the document element.
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        self.child_element_by_tag("body")
    }

    fn child_element_by_tag(&self, tag: &str) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html)
            .iter()
            .find(|&&id| self.as_element(id).is_some_and(|e| e.matches_tag(tag)))
            .copied()
    }

    /// [§ 4.5](https://dom.spec.whatwg.org/#dom-nonelementparentnode-getelementbyid)
    ///
    /// First element in the document-element subtree (document order)
    /// whose `id` attribute equals `id`.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let root = self.document_element()?;
        self.descendants(root)
            .find(|&n| self.as_element(n).is_some_and(|e| e.id() == Some(id)))
    }

    /// All elements in the document-element subtree with the given tag
    /// name (matched case-insensitively), in document order.
    #[must_use]
    pub fn get_elements_by_tag_name(&self, name: &str) -> Vec<NodeId> {
        self.document_element().map_or_else(Vec::new, |root| {
            self.descendants(root)
                .filter(|&n| self.as_element(n).is_some_and(|e| e.matches_tag(name)))
                .collect()
        })
    }

    /// Concatenated text of every text node in the subtree rooted at `id`
    /// (inclusive), in document order.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for n in self.descendants(id) {
            if let Some(text) = self.as_text(n) {
                out.push_str(text);
            }
        }
        out
    }

    /// Source text of a `<script>` element: the cached remote source if a
    /// load completed, otherwise the element's text content.
    #[must_use]
    pub fn script_text(&self, id: NodeId) -> Option<String> {
        let element = self.as_element(id)?;
        let script = element.script()?;
        Some(
            script
                .fetched_source
                .clone()
                .unwrap_or_else(|| self.text_content(id)),
        )
    }

    // ------------------------------------------------------------------
    // Document state
    // ------------------------------------------------------------------

    /// Current readiness.
    #[must_use]
    pub const fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    /// Advance readiness. Transitions are monotonic: attempts to move
    /// backwards are ignored.
    pub fn advance_ready_state(&mut self, state: ReadyState) {
        if state > self.ready_state {
            self.ready_state = state;
        }
    }

    /// Doctype text recorded by the parser, if any.
    #[must_use]
    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    /// Record the doctype text.
    pub fn set_doctype(&mut self, text: &str) {
        self.doctype = Some(text.to_string());
    }

    /// Base URL used to resolve relative resource references.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Set the base URL.
    pub fn set_base_url(&mut self, url: &str) {
        self.base_url = Some(url.to_string());
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// [§ 2.7](https://dom.spec.whatwg.org/#dom-eventtarget-addeventlistener)
    ///
    /// Register a listener for `event_type` on `node`. Listeners fire in
    /// registration order.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        callback: ListenerCallback,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.entry(node.0).or_default().push(ListenerEntry {
            id,
            event_type: event_type.to_string(),
            callback,
        });
        id
    }

    /// [§ 2.7](https://dom.spec.whatwg.org/#dom-eventtarget-removeeventlistener)
    ///
    /// Remove a previously registered listener. Unknown IDs are ignored.
    pub fn remove_event_listener(&mut self, node: NodeId, listener: ListenerId) {
        if let Some(entries) = self.listeners.get_mut(&node.0) {
            entries.retain(|e| e.id != listener);
        }
    }

    /// Listener callbacks registered on `node` for `event_type`, in
    /// registration order. Cloned so dispatch can run without borrowing
    /// the document.
    #[must_use]
    pub fn listeners_for(&self, node: NodeId, event_type: &str) -> Vec<ListenerCallback> {
        self.listeners.get(&node.0).map_or_else(Vec::new, |entries| {
            entries
                .iter()
                .filter(|e| e.event_type == event_type)
                .map(|e| std::sync::Arc::clone(&e.callback))
                .collect()
        })
    }

    /// [§ 2.9 Dispatching events](https://dom.spec.whatwg.org/#dispatching-events)
    ///
    /// Invokes every listener registered for the event's type on `node`,
    /// synchronously, in registration order. There are no capture or
    /// bubble phases.
    ///
    /// Returns `true` if no listener canceled the default action.
    pub fn dispatch_event(&self, node: NodeId, event: &mut Event) -> bool {
        event.target = Some(node);
        let event_type = event.event_type.clone();
        for callback in self.listeners_for(node, &event_type) {
            callback(event);
        }
        !(event.cancelable && event.default_prevented())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("ready_state", &self.ready_state)
            .finish_non_exhaustive()
    }
}

/// Iterator over the ancestors of a node.
pub struct Ancestors<'a> {
    document: &'a Document,
    current: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.document.parent(id);
        Some(id)
    }
}

/// Pre-order iterator over a node and its subtree.
pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let children = self.document.children(id);
        self.stack.extend(children.iter().rev().copied());
        Some(id)
    }
}
