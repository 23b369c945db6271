//! Lexical analysis: character stream in, token stream out.
//!
//! The tokenizer has no tree semantics; it emits a flat, lazy sequence of
//! [`Token`]s that the tree builder consumes. Entity decoding lives in
//! [`entities`] and applies only to data text and attribute values.

/// Tokenizer state machine implementation.
pub mod core;
/// Named character reference lookup and decoding.
pub mod entities;
/// Token types produced by the tokenizer.
pub mod token;

pub use self::core::{Tokenizer, token_transcript};
pub use token::Token;
