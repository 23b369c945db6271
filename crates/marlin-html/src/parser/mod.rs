//! Tree construction: token stream in, DOM nodes out.
//!
//! The builder is the recovery layer of the parser: it never fails, no
//! matter how mismatched the tag structure is. An explicit stack of open
//! elements absorbs unclosed children and stray end tags.

use marlin_common::warning::warn_once;
use marlin_dom::{Document, NodeId, NodeKind, NodeOrigin};

use crate::tokenizer::{Token, Tokenizer};

/// Builds DOM nodes from a token stream.
///
/// Construction happens inside a detached fragment owned by the target
/// [`Document`]; [`TreeBuilder::finish`] hands back the top-level nodes
/// for the lifecycle layer to attach and normalize.
pub struct TreeBuilder<'d> {
    document: &'d mut Document,
    /// Scratch fragment serving as the stack's placeholder root.
    base: NodeId,
    /// The stack of currently open elements, bottom first. Index 0 is the
    /// placeholder root and is never popped.
    stack: Vec<NodeId>,
    /// Attribute tokens are only attached between a `TagStart` and the
    /// next structural token.
    attrs_open: bool,
    /// Name of the most recent attribute, awaiting a possible value.
    pending_attr: Option<String>,
}

impl<'d> TreeBuilder<'d> {
    /// Create a builder that allocates nodes in `document`.
    pub fn new(document: &'d mut Document) -> Self {
        let base = document.create_document_fragment();
        Self {
            document,
            base,
            stack: vec![base],
            attrs_open: false,
            pending_attr: None,
        }
    }

    /// Feed one token.
    pub fn process_token(&mut self, token: Token) {
        match token {
            Token::TagStart(name) => self.handle_tag_start(&name),
            Token::TagEnd(name) => self.handle_tag_end(&name),
            Token::Text(text) => self.handle_character_data(NodeKind::Text(text)),
            Token::Comment(text) => self.handle_character_data(NodeKind::Comment(text)),
            Token::DocType(text) => {
                self.close_attr_list();
                self.document.set_doctype(&text);
            }
            Token::AttributeName(name) => self.handle_attribute_name(&name),
            Token::AttributeValue(value) => self.handle_attribute_value(&value),
        }
    }

    /// Consume every remaining token from `tokens`.
    pub fn process_all(&mut self, tokens: impl Iterator<Item = Token>) {
        for token in tokens {
            self.process_token(token);
        }
    }

    /// Finish building and return the top-level nodes, detached and in
    /// document order.
    #[must_use]
    pub fn finish(self) -> Vec<NodeId> {
        let tops = self.document.children(self.base).to_vec();
        self.document.clear_children(self.base);
        tops
    }

    fn top(&self) -> NodeId {
        *self.stack.last().expect("stack always holds the base")
    }

    /// A start tag creates an element, appends it to the current open
    /// element, and pushes it.
    fn handle_tag_start(&mut self, name: &str) {
        let Ok(element) = self
            .document
            .create_element_of_origin(name, NodeOrigin::FromParse)
        else {
            // The tokenizer never emits an empty tag name; ignore if it
            // ever does.
            return;
        };
        self.document.append_child(self.top(), element);
        self.stack.push(element);
        self.attrs_open = true;
        self.pending_attr = None;
    }

    /// An end tag closes the nearest matching open element together with
    /// everything above it (implicitly closing unclosed children such as
    /// an open `li`). With no match it has no structural effect.
    fn handle_tag_end(&mut self, name: &str) {
        self.close_attr_list();
        let matched = self.stack.iter().rposition(|&id| {
            self.document
                .as_element(id)
                .is_some_and(|e| e.matches_tag(name))
        });
        match matched {
            Some(position) => self.stack.truncate(position),
            None => warn_once("HTML", &format!("ignored stray end tag </{name}>")),
        }
    }

    fn handle_character_data(&mut self, kind: NodeKind) {
        self.close_attr_list();
        let node = self.document.alloc(kind);
        self.document.append_child(self.top(), node);
    }

    fn handle_attribute_name(&mut self, name: &str) {
        if !self.attrs_open {
            return;
        }
        if let Some(element) = self.document.as_element_mut(self.top()) {
            element.set_attribute(name, "");
        }
        self.pending_attr = Some(name.to_string());
    }

    fn handle_attribute_value(&mut self, value: &str) {
        if !self.attrs_open {
            return;
        }
        if let Some(name) = self.pending_attr.take() {
            if let Some(element) = self.document.as_element_mut(self.top()) {
                element.set_attribute(&name, value);
            }
        }
    }

    fn close_attr_list(&mut self) {
        self.attrs_open = false;
        self.pending_attr = None;
    }
}

/// Parse `html` into `document`'s arena and return the detached top-level
/// nodes in document order.
///
/// Elements created here are tagged [`NodeOrigin::FromParse`]; a `script`
/// element's inner text rides along as its text children.
#[must_use]
pub fn parse_into(document: &mut Document, html: &str) -> Vec<NodeId> {
    let mut builder = TreeBuilder::new(document);
    builder.process_all(Tokenizer::new(html));
    builder.finish()
}

/// Print an indented rendering of the subtree rooted at `node` to stdout.
pub fn print_tree(document: &Document, node: NodeId, depth: usize) {
    let indent = "  ".repeat(depth);
    match document.get(node).map(|n| &n.kind) {
        Some(NodeKind::Document) => println!("{indent}#document"),
        Some(NodeKind::Element(data)) => {
            let mut attrs: Vec<String> = data
                .attributes()
                .map(|(n, v)| format!(" {n}=\"{v}\""))
                .collect();
            attrs.sort();
            println!("{indent}<{}{}>", data.tag_name, attrs.join(""));
        }
        Some(NodeKind::Text(text)) => println!("{indent}#text {text:?}"),
        Some(NodeKind::Comment(text)) => println!("{indent}<!--{text}-->"),
        Some(NodeKind::Fragment) => println!("{indent}#fragment"),
        Some(NodeKind::Attribute(attr)) => println!("{indent}@{}={}", attr.name, attr.value),
        None => {}
    }
    for &child in document.children(node) {
        print_tree(document, child, depth + 1);
    }
}
