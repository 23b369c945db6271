//! Error type for invalid DOM API arguments.

use thiserror::Error;

/// Synchronous invalid-argument and invalid-state conditions raised by the
/// node model.
///
/// Malformed *markup* never surfaces here: the parser always recovers and
/// produces some tree. These errors only reject misuse of the programmatic
/// API (empty names, unknown event types, impossible insertions).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// `create_element` was called with an empty tag name.
    #[error("tag name must not be empty")]
    EmptyTagName,

    /// `create_attribute` was called with an empty attribute name.
    #[error("attribute name must not be empty")]
    EmptyAttributeName,

    /// `create_event` was called with an event interface the engine does
    /// not support.
    #[error("unsupported event type: {0}")]
    UnsupportedEventType(String),

    /// The reference node passed to `insert_before`/`replace_child` is not
    /// a child of the given parent.
    #[error("reference node is not a child of the given parent")]
    NotAChild,
}
