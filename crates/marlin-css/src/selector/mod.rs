//! CSS selector parsing and matching.
//!
//! This module implements the subset of
//! [Selectors](https://www.w3.org/TR/selectors-4/) the document tree needs
//! for id/class/tag queries: compound selectors built from type, class,
//! id, and universal parts, joined by descendant and child combinators.
//!
//! A selector string is normalized (newlines to spaces, whitespace around
//! commas removed) and split on whitespace into chunks. The chain is built
//! right-to-left: the *rightmost* chunk is the head, matched against the
//! candidate element first, and each link points at the chunk to its left,
//! matched against ancestors.

use marlin_dom::{Document, NodeId};

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
///
/// One condition inside a compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    /// `#main` — matches the element's `id` attribute exactly.
    Id(String),

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    /// `.btn` — matches one of the element's space-separated classes.
    Class(String),

    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    /// `div` — with the engine's extension that a chunk may carry
    /// comma-joined alternatives (`div,span`), matched case-insensitively.
    Tags(Vec<String>),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    /// `*` — matches every element.
    Universal,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
///
/// How a compound relates to the next compound to its left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// [§ 16.1](https://www.w3.org/TR/selectors-4/#descendant-combinators)
    /// `A B` — some ancestor, searched upward without depth limit, must
    /// match `A`.
    Descendant,
    /// [§ 16.2](https://www.w3.org/TR/selectors-4/#child-combinators)
    /// `A > B` — the direct parent must match `A`.
    Child,
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector ... represents a set of simultaneous conditions
/// on a single element." `div.foo` carries a type part and a class part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    /// Every part must match for the compound to match.
    pub parts: Vec<SimpleSelector>,
}

impl CompoundSelector {
    fn matches(&self, document: &Document, element: NodeId) -> bool {
        let Some(data) = document.as_element(element) else {
            return false;
        };
        self.parts.iter().all(|part| match part {
            SimpleSelector::Id(id) => data.id() == Some(id.as_str()),
            SimpleSelector::Class(class) => data.classes().contains(class.as_str()),
            SimpleSelector::Tags(tags) => tags.iter().any(|t| data.matches_tag(t)),
            SimpleSelector::Universal => true,
        })
    }
}

/// One chain entry: a compound plus the combinator leading to the entry
/// to its left (ignored on the last entry).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Link {
    compound: CompoundSelector,
    to_next: Combinator,
}

/// A parsed selector chain, head (rightmost compound) first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    links: Vec<Link>,
}

impl Selector {
    /// Parse selector text into a chain.
    ///
    /// Parsing never fails; unrecognizable chunks simply produce a
    /// selector that matches nothing.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let normalized = normalize(text);
        let mut links: Vec<Link> = Vec::new();

        // Scan right-to-left so the head lands at index 0. A `>` chunk
        // tightens the edge between the compounds on either side of it.
        for chunk in normalized.split_whitespace().rev() {
            if chunk == ">" {
                if let Some(last) = links.last_mut() {
                    last.to_next = Combinator::Child;
                }
                continue;
            }
            links.push(Link {
                compound: parse_compound(chunk),
                to_next: Combinator::Descendant,
            });
        }

        Self { links }
    }

    /// Whether `element` matches this selector, walking the chain from
    /// the head outward. Short-circuits on the first failed compound.
    #[must_use]
    pub fn matches(&self, document: &Document, element: NodeId) -> bool {
        !self.links.is_empty() && self.matches_from(document, element, 0)
    }

    fn matches_from(&self, document: &Document, element: NodeId, index: usize) -> bool {
        let link = &self.links[index];
        if !link.compound.matches(document, element) {
            return false;
        }
        if index + 1 == self.links.len() {
            return true;
        }
        match link.to_next {
            Combinator::Child => document
                .parent(element)
                .is_some_and(|parent| self.matches_from(document, parent, index + 1)),
            Combinator::Descendant => document
                .ancestors(element)
                .filter(|&a| document.as_element(a).is_some())
                .any(|a| self.matches_from(document, a, index + 1)),
        }
    }

    /// First element in the document-element subtree (document order)
    /// matching this selector.
    #[must_use]
    pub fn query_first(&self, document: &Document) -> Option<NodeId> {
        let root = document.document_element()?;
        document
            .descendants(root)
            .filter(|&n| document.as_element(n).is_some())
            .find(|&n| self.matches(document, n))
    }

    /// Every element in the document-element subtree matching this
    /// selector, in document order.
    #[must_use]
    pub fn query_all(&self, document: &Document) -> Vec<NodeId> {
        document.document_element().map_or_else(Vec::new, |root| {
            document
                .descendants(root)
                .filter(|&n| document.as_element(n).is_some())
                .filter(|&n| self.matches(document, n))
                .collect()
        })
    }
}

/// Newlines become spaces and whitespace around commas is removed, so
/// `div , span` splits into the single chunk `div,span`.
fn normalize(selector: &str) -> String {
    let spaced: String = selector
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    let mut out = String::with_capacity(spaced.len());
    let mut chars = spaced.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ',' {
            while out.ends_with(' ') {
                let _ = out.pop();
            }
            out.push(',');
            while chars.peek().is_some_and(|&n| n == ' ') {
                let _ = chars.next();
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Split one whitespace-free chunk into its simple parts: a leading type
/// segment (or `*`), then `.class` and `#id` segments.
fn parse_compound(chunk: &str) -> CompoundSelector {
    #[derive(Clone, Copy)]
    enum Segment {
        Tag,
        Class,
        Id,
    }

    let mut parts = Vec::new();
    let mut segment = Segment::Tag;
    let mut current = String::new();

    let mut flush = |segment: Segment, current: &mut String| {
        if current.is_empty() {
            return;
        }
        match segment {
            Segment::Tag => {
                if current == "*" {
                    parts.push(SimpleSelector::Universal);
                } else {
                    let tags = current
                        .split(',')
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>();
                    if !tags.is_empty() {
                        parts.push(SimpleSelector::Tags(tags));
                    }
                }
            }
            Segment::Class => parts.push(SimpleSelector::Class(current.clone())),
            Segment::Id => parts.push(SimpleSelector::Id(current.clone())),
        }
        current.clear();
    };

    for c in chunk.chars() {
        match c {
            '.' => {
                flush(segment, &mut current);
                segment = Segment::Class;
            }
            '#' => {
                flush(segment, &mut current);
                segment = Segment::Id;
            }
            _ => current.push(c),
        }
    }
    flush(segment, &mut current);

    CompoundSelector { parts }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_head_is_the_rightmost_compound() {
        let selector = Selector::parse("div.foo > span");
        assert_eq!(selector.links.len(), 2);
        assert_eq!(
            selector.links[0].compound.parts,
            vec![SimpleSelector::Tags(vec!["span".to_string()])]
        );
        assert_eq!(selector.links[0].to_next, Combinator::Child);
        assert_eq!(
            selector.links[1].compound.parts,
            vec![
                SimpleSelector::Tags(vec!["div".to_string()]),
                SimpleSelector::Class("foo".to_string()),
            ]
        );
    }

    #[test]
    fn commas_merge_into_a_tag_set() {
        let selector = Selector::parse("div , span");
        assert_eq!(selector.links.len(), 1);
        assert_eq!(
            selector.links[0].compound.parts,
            vec![SimpleSelector::Tags(vec![
                "div".to_string(),
                "span".to_string()
            ])]
        );
    }

    #[test]
    fn empty_selector_matches_nothing() {
        let doc = Document::new();
        let html = doc.document_element().unwrap();
        assert!(!Selector::parse("").matches(&doc, html));
        assert!(!Selector::parse("   ").matches(&doc, html));
    }
}
