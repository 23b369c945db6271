//! The lexical state machine.
//!
//! Unlike the WHATWG tokenizer this machine is deliberately lenient: it is
//! built to match what tolerant real-world markup consumers accept rather
//! than a strict grammar. Malformed input never fails — every byte ends up
//! in *some* token.

use std::collections::VecDeque;
use strum_macros::Display;

use super::entities;
use super::token::Token;

/// Elements whose bodies are scanned as opaque text up to the matching
/// case-insensitive end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Elements closed implicitly as soon as their start tag completes, even
/// without a `/>`.
const IMPLICITLY_CLOSED_ELEMENTS: &[&str] = &["meta"];

/// Machine states. Comment, doctype, and raw-text handling run as bounded
/// scans instead of per-character states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
enum State {
    Data,
    TagOpen,
    TagName,
    EndTagName,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueQuoted,
    AttributeValueUnquoted,
}

/// A lazy, forward-only HTML tokenizer.
///
/// Implements [`Iterator`] over [`Token`]s; the stream is finite and can
/// only be restarted by constructing a new tokenizer over the same input.
///
/// # Example
///
/// ```
/// use marlin_html::{Token, Tokenizer};
///
/// let tokens: Vec<Token> = Tokenizer::new("<p id='8'>Text</p>").collect();
/// assert_eq!(tokens[0], Token::TagStart("p".to_string()));
/// assert_eq!(tokens.last(), Some(&Token::TagEnd("p".to_string())));
/// ```
pub struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    state: State,
    pending: VecDeque<Token>,
    /// Accumulated character data awaiting a flush.
    text: String,
    /// In-progress start- or end-tag name.
    tag_name: String,
    attr_name: String,
    attr_value: String,
    /// Delimiter of the quoted attribute value being read.
    quote: char,
    /// Name of the most recently emitted start tag. Used for synthetic
    /// self-closing end tags and raw-text end-tag matching.
    last_start_tag: String,
    /// The open start tag names a raw-text element; switch to raw-text
    /// scanning when the tag closes (unless it self-closes).
    raw_text: bool,
    done: bool,
}

impl Tokenizer {
    /// Create a tokenizer over `input`.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            state: State::Data,
            pending: VecDeque::new(),
            text: String::new(),
            tag_name: String::new(),
            attr_name: String::new(),
            attr_value: String::new(),
            quote: '"',
            last_start_tag: String::new(),
            raw_text: false,
            done: false,
        }
    }

    // ------------------------------------------------------------------
    // Small helpers
    // ------------------------------------------------------------------

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    const fn is_whitespace(c: char) -> bool {
        matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
    }

    fn matches_ci_at(&self, index: usize, expected: &str) -> bool {
        expected.chars().enumerate().all(|(offset, e)| {
            self.chars
                .get(index + offset)
                .is_some_and(|c| c.eq_ignore_ascii_case(&e))
        })
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.pending.push_back(Token::Text(text));
        }
    }

    fn emit_tag_start(&mut self) {
        let name = std::mem::take(&mut self.tag_name);
        self.raw_text = RAW_TEXT_ELEMENTS
            .iter()
            .any(|raw| name.eq_ignore_ascii_case(raw));
        self.last_start_tag.clone_from(&name);
        self.pending.push_back(Token::TagStart(name));
    }

    fn emit_attr_name(&mut self) {
        let name = std::mem::take(&mut self.attr_name);
        self.pending.push_back(Token::AttributeName(name));
    }

    fn emit_attr_value(&mut self) {
        let value = std::mem::take(&mut self.attr_value);
        self.pending.push_back(Token::AttributeValue(value));
    }

    /// A `/>` pair: synthesize an end tag matching the open start tag.
    /// Applied uniformly to every element, not a fixed void-element list.
    fn close_self_closing(&mut self) {
        self.pending
            .push_back(Token::TagEnd(self.last_start_tag.clone()));
        self.raw_text = false;
        self.pos += 2;
        self.state = State::Data;
    }

    /// A `>` completing an open start tag; raw-text elements switch to the
    /// opaque body scan, implicitly-closed elements get a synthetic end
    /// tag.
    fn finish_open_tag(&mut self) {
        self.pos += 1;
        self.state = State::Data;
        if IMPLICITLY_CLOSED_ELEMENTS
            .iter()
            .any(|void| self.last_start_tag.eq_ignore_ascii_case(void))
        {
            self.pending
                .push_back(Token::TagEnd(self.last_start_tag.clone()));
            self.raw_text = false;
            return;
        }
        if self.raw_text {
            self.raw_text = false;
            self.scan_raw_text();
        }
    }

    fn decode_entity_into(&mut self, into_attr_value: bool) {
        match entities::decode_reference(&self.chars, self.pos) {
            Some((replacement, consumed)) => {
                if into_attr_value {
                    self.attr_value.push_str(replacement);
                } else {
                    self.text.push_str(replacement);
                }
                self.pos += consumed;
            }
            None => {
                if into_attr_value {
                    self.attr_value.push('&');
                } else {
                    self.text.push('&');
                }
                self.pos += 1;
            }
        }
    }

    // ------------------------------------------------------------------
    // State handlers
    // ------------------------------------------------------------------

    fn step(&mut self) {
        match self.state {
            State::Data => self.step_data(),
            State::TagOpen => self.step_tag_open(),
            State::TagName => self.step_tag_name(),
            State::EndTagName => self.step_end_tag_name(),
            State::BeforeAttributeName => self.step_before_attribute_name(),
            State::AttributeName => self.step_attribute_name(),
            State::AfterAttributeName => self.step_after_attribute_name(),
            State::BeforeAttributeValue => self.step_before_attribute_value(),
            State::AttributeValueQuoted => self.step_attribute_value_quoted(),
            State::AttributeValueUnquoted => self.step_attribute_value_unquoted(),
        }
    }

    fn step_data(&mut self) {
        match self.current() {
            None => {
                self.flush_text();
                self.done = true;
            }
            Some('&') => self.decode_entity_into(false),
            Some('<') => {
                self.flush_text();
                self.pos += 1;
                self.state = State::TagOpen;
            }
            // A lone carriage return becomes a line feed. The following
            // character is not consumed, so CRLF yields two line feeds.
            Some('\r') => {
                self.text.push('\n');
                self.pos += 1;
            }
            Some(c) => {
                self.text.push(c);
                self.pos += 1;
            }
        }
    }

    fn step_tag_open(&mut self) {
        match self.current() {
            Some('!') => {
                self.pos += 1;
                self.scan_markup_declaration();
            }
            // `<?...>` is a bogus comment; the `?` stays in the payload.
            Some('?') => self.scan_bogus_comment(self.pos),
            Some('/') => {
                self.pos += 1;
                self.tag_name.clear();
                self.state = State::EndTagName;
            }
            Some(c) if c.is_ascii_alphabetic() => {
                self.tag_name.clear();
                self.state = State::TagName;
            }
            // Not a tag after all: the `<` is literal text.
            _ => {
                self.text.push('<');
                self.state = State::Data;
            }
        }
    }

    fn step_tag_name(&mut self) {
        match self.current() {
            // Unterminated tag at end of input is dropped.
            None => self.done = true,
            Some(c) if Self::is_whitespace(c) => {
                self.emit_tag_start();
                self.pos += 1;
                self.state = State::BeforeAttributeName;
            }
            Some('/') if self.peek() == Some('>') => {
                self.emit_tag_start();
                self.close_self_closing();
            }
            Some('/') => {
                self.emit_tag_start();
                self.pos += 1;
                self.state = State::BeforeAttributeName;
            }
            Some('>') => {
                self.emit_tag_start();
                self.finish_open_tag();
            }
            // Permissive: `<` and `\` are legal inside tag names.
            Some(c) => {
                self.tag_name.push(c);
                self.pos += 1;
            }
        }
    }

    fn step_end_tag_name(&mut self) {
        match self.current() {
            None => self.done = true,
            Some('>') => {
                let name = std::mem::take(&mut self.tag_name);
                self.pending.push_back(Token::TagEnd(name));
                self.pos += 1;
                self.state = State::Data;
            }
            Some(c) if Self::is_whitespace(c) => {
                // Anything between the name and `>` is discarded.
                while let Some(ch) = self.current() {
                    self.pos += 1;
                    if ch == '>' {
                        break;
                    }
                }
                let name = std::mem::take(&mut self.tag_name);
                self.pending.push_back(Token::TagEnd(name));
                self.state = State::Data;
            }
            Some(c) => {
                self.tag_name.push(c);
                self.pos += 1;
            }
        }
    }

    fn step_before_attribute_name(&mut self) {
        match self.current() {
            None => self.done = true,
            Some(c) if Self::is_whitespace(c) => self.pos += 1,
            Some('>') => self.finish_open_tag(),
            Some('/') if self.peek() == Some('>') => self.close_self_closing(),
            // A stray solidus between attributes is ignored.
            Some('/') => self.pos += 1,
            Some(_) => {
                self.attr_name.clear();
                self.state = State::AttributeName;
            }
        }
    }

    fn step_attribute_name(&mut self) {
        match self.current() {
            None => {
                self.emit_attr_name();
                self.done = true;
            }
            Some(c) if Self::is_whitespace(c) => {
                self.emit_attr_name();
                self.pos += 1;
                self.state = State::AfterAttributeName;
            }
            Some('=') if !self.attr_name.is_empty() => {
                self.emit_attr_name();
                self.pos += 1;
                self.state = State::BeforeAttributeValue;
            }
            Some('>') => {
                self.emit_attr_name();
                self.finish_open_tag();
            }
            Some('/') if self.peek() == Some('>') => {
                self.emit_attr_name();
                self.close_self_closing();
            }
            // Permissive: `<`, quotes, and `\` are legal inside names.
            Some(c) => {
                self.attr_name.push(c);
                self.pos += 1;
            }
        }
    }

    fn step_after_attribute_name(&mut self) {
        match self.current() {
            None => self.done = true,
            Some(c) if Self::is_whitespace(c) => self.pos += 1,
            Some('=') => {
                self.pos += 1;
                self.state = State::BeforeAttributeValue;
            }
            Some('>') => self.finish_open_tag(),
            Some('/') if self.peek() == Some('>') => self.close_self_closing(),
            Some('/') => self.pos += 1,
            Some(_) => {
                self.attr_name.clear();
                self.state = State::AttributeName;
            }
        }
    }

    fn step_before_attribute_value(&mut self) {
        match self.current() {
            None => self.done = true,
            Some(c) if Self::is_whitespace(c) => self.pos += 1,
            Some(q @ ('"' | '\'')) => {
                self.quote = q;
                self.attr_value.clear();
                self.pos += 1;
                self.state = State::AttributeValueQuoted;
            }
            Some('>') => {
                self.emit_attr_value();
                self.finish_open_tag();
            }
            Some(_) => {
                self.attr_value.clear();
                self.state = State::AttributeValueUnquoted;
            }
        }
    }

    fn step_attribute_value_quoted(&mut self) {
        match self.current() {
            None => {
                self.emit_attr_value();
                self.done = true;
            }
            Some(c) if c == self.quote => {
                self.emit_attr_value();
                self.pos += 1;
                self.state = State::BeforeAttributeName;
            }
            // Backslash escapes the delimiter itself; before anything
            // else both characters are kept literally.
            Some('\\') => match self.peek() {
                Some(c) if c == self.quote => {
                    self.attr_value.push(c);
                    self.pos += 2;
                }
                Some(c) => {
                    self.attr_value.push('\\');
                    self.attr_value.push(c);
                    self.pos += 2;
                }
                None => {
                    self.attr_value.push('\\');
                    self.pos += 1;
                }
            },
            Some('&') => self.decode_entity_into(true),
            Some('\r') => {
                self.attr_value.push('\n');
                self.pos += 1;
            }
            Some(c) => {
                self.attr_value.push(c);
                self.pos += 1;
            }
        }
    }

    fn step_attribute_value_unquoted(&mut self) {
        match self.current() {
            None => {
                self.emit_attr_value();
                self.done = true;
            }
            // Backslash-whitespace does not protect the whitespace: the
            // backslash is kept and the value still terminates.
            Some(c) if Self::is_whitespace(c) => {
                self.emit_attr_value();
                self.pos += 1;
                self.state = State::BeforeAttributeName;
            }
            Some('>') => {
                self.emit_attr_value();
                self.finish_open_tag();
            }
            Some('\\') => match self.peek() {
                Some(q @ ('"' | '\'')) => {
                    self.attr_value.push(q);
                    self.pos += 2;
                }
                _ => {
                    self.attr_value.push('\\');
                    self.pos += 1;
                }
            },
            Some('&') => self.decode_entity_into(true),
            Some(c) => {
                self.attr_value.push(c);
                self.pos += 1;
            }
        }
    }

    // ------------------------------------------------------------------
    // Bounded scans: comments, doctype, raw text
    // ------------------------------------------------------------------

    /// After `<!`: a full `<!--` comment, a doctype, or a bogus comment.
    fn scan_markup_declaration(&mut self) {
        if self.chars.get(self.pos) == Some(&'-') && self.chars.get(self.pos + 1) == Some(&'-') {
            self.pos += 2;
            self.scan_comment();
        } else if self.matches_ci_at(self.pos, "doctype") {
            self.pos += "doctype".len();
            self.scan_doctype();
        } else {
            // `<!-`, `<!x`, ...: bogus comment keeping everything after
            // the `<!`, up to the first `>`.
            self.scan_bogus_comment(self.pos);
        }
    }

    /// Body of a `<!--` comment, up to the literal `-->` terminator. The
    /// body may contain `<`/`>` freely.
    fn scan_comment(&mut self) {
        let start = self.pos;
        let mut i = start;
        while i < self.chars.len() {
            if self.chars[i] == '-'
                && self.chars.get(i + 1) == Some(&'-')
                && self.chars.get(i + 2) == Some(&'>')
            {
                let content = self.slice(start, i);
                self.pending.push_back(Token::Comment(content));
                self.pos = i + 3;
                self.state = State::Data;
                return;
            }
            i += 1;
        }
        let content = self.slice(start, self.chars.len());
        self.pending.push_back(Token::Comment(content));
        self.pos = self.chars.len();
        self.state = State::Data;
    }

    /// Comment content from `start` to the first `>` (exclusive).
    fn scan_bogus_comment(&mut self, start: usize) {
        let end = (start..self.chars.len())
            .find(|&i| self.chars[i] == '>')
            .unwrap_or(self.chars.len());
        let content = self.slice(start, end);
        self.pending.push_back(Token::Comment(content));
        self.pos = (end + 1).min(self.chars.len());
        self.state = State::Data;
    }

    /// After `<!DOCTYPE`: the token text is everything between the keyword
    /// (plus whitespace) and the closing `>`.
    fn scan_doctype(&mut self) {
        while self.current().is_some_and(Self::is_whitespace) {
            self.pos += 1;
        }
        let start = self.pos;
        let end = (start..self.chars.len())
            .find(|&i| self.chars[i] == '>')
            .unwrap_or(self.chars.len());
        let content = self.slice(start, end);
        self.pending.push_back(Token::DocType(content));
        self.pos = (end + 1).min(self.chars.len());
        self.state = State::Data;
    }

    /// Opaque body of a raw-text element: everything up to the matching
    /// case-insensitive end tag, emitted verbatim as one text token. No
    /// entity decoding, no comment or doctype recognition, no CR
    /// rewriting. The synthesized end-tag token reuses the start tag's
    /// spelling.
    fn scan_raw_text(&mut self) {
        let name = self.last_start_tag.clone();
        let start = self.pos;
        let found = if name.eq_ignore_ascii_case("script") {
            self.find_script_end(start, &name)
        } else {
            self.find_raw_end(start, &name)
        };

        match found {
            Some((text_end, resume)) => {
                if text_end > start {
                    let text = self.slice(start, text_end);
                    self.pending.push_back(Token::Text(text));
                }
                self.pending.push_back(Token::TagEnd(name));
                self.pos = resume;
            }
            None => {
                if start < self.chars.len() {
                    let text = self.slice(start, self.chars.len());
                    self.pending.push_back(Token::Text(text));
                }
                self.pos = self.chars.len();
            }
        }
    }

    /// If an end tag for `name` begins at `index`, return the position
    /// just past its `>`.
    fn end_tag_at(&self, index: usize, name: &str) -> Option<usize> {
        if self.chars.get(index) != Some(&'<') || self.chars.get(index + 1) != Some(&'/') {
            return None;
        }
        if !self.matches_ci_at(index + 2, name) {
            return None;
        }
        let mut i = index + 2 + name.chars().count();
        while self.chars.get(i).copied().is_some_and(Self::is_whitespace) {
            i += 1;
        }
        (self.chars.get(i) == Some(&'>')).then_some(i + 1)
    }

    /// Plain raw-text scan (style, textarea, title): no string or comment
    /// awareness, first matching end tag wins.
    fn find_raw_end(&self, start: usize, name: &str) -> Option<(usize, usize)> {
        (start..self.chars.len())
            .find_map(|i| self.end_tag_at(i, name).map(|resume| (i, resume)))
    }

    /// Script-body scan: an end tag inside a string literal or a JS
    /// comment is not the real closing tag.
    ///
    /// A quote opens a string only when a matching unescaped closing
    /// quote exists later in the input; a dangling quote (as in a regex
    /// character class) is literal. Inside a string, a backslash before
    /// the open quote escapes it and a backslash before anything else is
    /// kept as two literal characters.
    fn find_script_end(&self, start: usize, name: &str) -> Option<(usize, usize)> {
        let chars = &self.chars;
        let mut i = start;
        while i < chars.len() {
            match chars[i] {
                '<' => {
                    if let Some(resume) = self.end_tag_at(i, name) {
                        return Some((i, resume));
                    }
                    i += 1;
                }
                '/' if chars.get(i + 1) == Some(&'*') => {
                    let mut j = i + 2;
                    loop {
                        if j + 1 >= chars.len() {
                            j = chars.len();
                            break;
                        }
                        if chars[j] == '*' && chars[j + 1] == '/' {
                            j += 2;
                            break;
                        }
                        j += 1;
                    }
                    i = j;
                }
                '/' if chars.get(i + 1) == Some(&'/') => {
                    i += 2;
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                }
                q @ ('"' | '\'') => {
                    if Self::string_closes(chars, i + 1, q) {
                        i = Self::skip_string(chars, i + 1, q);
                    } else {
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }
        None
    }

    /// Whether an unescaped `quote` occurs at or after `from`.
    fn string_closes(chars: &[char], from: usize, quote: char) -> bool {
        let mut j = from;
        while j < chars.len() {
            if chars[j] == '\\' {
                j += 2;
            } else if chars[j] == quote {
                return true;
            } else {
                j += 1;
            }
        }
        false
    }

    /// Position just past the unescaped `quote` closing a string that
    /// starts at `from`.
    fn skip_string(chars: &[char], from: usize, quote: char) -> usize {
        let mut j = from;
        while j < chars.len() {
            if chars[j] == '\\' {
                j += 2;
            } else if chars[j] == quote {
                return j + 1;
            } else {
                j += 1;
            }
        }
        chars.len()
    }
}

impl Iterator for Tokenizer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.done {
                return None;
            }
            self.step();
        }
    }
}

/// Tokenize `input` and render the stream in the `Type:Value` textual
/// form, joined by `", "` — the transcript shape conformance tests assert
/// against.
#[must_use]
pub fn token_transcript(input: &str) -> String {
    Tokenizer::new(input)
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
