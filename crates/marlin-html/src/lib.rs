//! Fault-tolerant HTML tokenizer and tree builder for the Marlin engine.
//!
//! # Scope
//!
//! This crate implements the parsing half of the engine:
//!
//! - **Tokenizer** — a lenient lexical state machine producing a lazy,
//!   flat token stream: tag start/end, attribute name/value, text,
//!   comment, and doctype tokens. Built to match tolerant real-world
//!   markup handling rather than a strict grammar: stray `<` inside names
//!   is legal, `<!-` and `<?` open comments, every `/>` synthesizes an
//!   end tag, and raw-text bodies (`script`, `style`, `textarea`,
//!   `title`) are passed through verbatim with string- and comment-aware
//!   end-tag detection for scripts.
//! - **Tree builder** — open-element-stack construction over a
//!   [`marlin_dom::Document`] arena, recovering from unclosed children
//!   and ignoring stray end tags.
//!
//! # Not implemented
//!
//! The full WHATWG tree-construction algorithm is out of scope: no
//! insertion modes, foster parenting, template handling, or encoding
//! sniffing.

/// Tree construction from the token stream.
pub mod parser;
/// Lexical analysis of the input stream.
pub mod tokenizer;

pub use parser::{TreeBuilder, parse_into, print_tree};
pub use tokenizer::{Token, Tokenizer, token_transcript};
