//! Bounded byte cursor used by the parser.
//!
//! Every primitive checks the logical end of input and reports running out
//! of input instead of reading past it. The logical end is the end of the
//! buffer or the first NUL byte, whichever comes first.

use crate::location::{Location, LocationResolver};
use std::ops::Range;

/// ASCII whitespace: space, tab, line feed, form feed, carriage return.
pub(crate) fn is_whitespace(byte: u8) -> bool {
    byte.is_ascii_whitespace()
}

/// Trim ASCII whitespace from both ends.
pub(crate) fn trim(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_ascii_whitespace())
}

pub(crate) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
    end: usize,
    locations: LocationResolver<'a>,
}

/// Why an attribute could not be scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttributeFault<'a> {
    /// Input ended inside the attribute.
    EndOfInput,
    /// A `=` or other delimiter where the attribute name should be.
    EmptyKey { at: usize },
    /// The name is not followed by `=`.
    MissingEquals { key: &'a str, at: usize },
    /// The `=` is not followed by `"` or `'`.
    MissingQuote { key: &'a str, at: usize },
    /// No closing quote before the end of input.
    UnterminatedValue { key: &'a str, quote_at: usize },
}

impl AttributeFault<'_> {
    pub(crate) fn message(&self) -> String {
        match self {
            AttributeFault::EndOfInput => "input ended inside the attribute list".to_string(),
            AttributeFault::EmptyKey { .. } => "attribute name is empty".to_string(),
            AttributeFault::MissingEquals { key, .. } => {
                format!("expected `=` after attribute `{}`", key)
            }
            AttributeFault::MissingQuote { key, .. } => {
                format!("value of attribute `{}` must start with `\"` or `'`", key)
            }
            AttributeFault::UnterminatedValue { key, .. } => {
                format!("value of attribute `{}` is missing its closing quote", key)
            }
        }
    }

    /// Byte offset the fault points at, if it has one.
    pub(crate) fn offset(&self) -> Option<usize> {
        match self {
            AttributeFault::EndOfInput => None,
            AttributeFault::EmptyKey { at }
            | AttributeFault::MissingEquals { at, .. }
            | AttributeFault::MissingQuote { at, .. } => Some(*at),
            AttributeFault::UnterminatedValue { quote_at, .. } => Some(*quote_at),
        }
    }
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        let end = text.find('\0').unwrap_or(text.len());
        Self {
            text,
            pos: 0,
            end,
            locations: LocationResolver::new(text),
        }
    }

    /// A cursor over `start..end` of `text`, with offsets still relative to
    /// the whole of `text`.
    pub(crate) fn bounded(text: &'a str, start: usize, end: usize) -> Self {
        let end = end.min(text.len());
        Self {
            text,
            pos: start.min(end),
            end,
            locations: LocationResolver::new(text),
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn end(&self) -> usize {
        self.end
    }

    pub(crate) fn text(&self) -> &'a str {
        self.text
    }

    pub(crate) fn has_next(&self) -> bool {
        self.pos < self.end
    }

    fn remaining(&self) -> &'a [u8] {
        self.text.as_bytes().get(self.pos..self.end).unwrap_or(&[])
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.remaining().first().copied()
    }

    /// Advance by `n` bytes, stopping at the logical end.
    pub(crate) fn advance(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.end);
    }

    /// Test if `expected` starts at the current position.
    pub(crate) fn test(&self, expected: &[u8]) -> bool {
        self.remaining().starts_with(expected)
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
    }

    /// Consume bytes while `pred` holds.
    ///
    /// `pred` must reject only ASCII bytes for the result to end on a char
    /// boundary, which holds for every delimiter the parser uses.
    pub(crate) fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.slice(start..self.pos)
    }

    /// Consume up to, not including, the next `byte`.
    ///
    /// On failure the cursor is left at the logical end.
    pub(crate) fn scan_until_byte(&mut self, byte: u8) -> Option<&'a str> {
        let start = self.pos;
        match self.remaining().iter().position(|&b| b == byte) {
            Some(n) => {
                self.pos += n;
                Some(self.slice(start..self.pos))
            }
            None => {
                self.pos = self.end;
                None
            }
        }
    }

    /// Consume through the next occurrence of `terminator`, returning the
    /// text before it.
    ///
    /// On failure the cursor is left at the logical end.
    pub(crate) fn scan_past(&mut self, terminator: &[u8]) -> Option<&'a str> {
        let start = self.pos;
        let found = self
            .remaining()
            .windows(terminator.len().max(1))
            .position(|window| window == terminator);
        match found {
            Some(n) => {
                self.pos += n + terminator.len();
                Some(self.slice(start..start + n))
            }
            None => {
                self.pos = self.end;
                None
            }
        }
    }

    /// Consume a quoted value. The cursor must be just past the opening
    /// `quote`; it ends just past the closing one.
    ///
    /// A quote preceded by a backslash does not close the value. The
    /// backslash is kept.
    pub(crate) fn scan_quoted(&mut self, quote: u8) -> Option<&'a str> {
        let start = self.pos;
        let mut prev = None;
        for (n, &byte) in self.remaining().iter().enumerate() {
            if byte == quote && prev != Some(b'\\') {
                self.pos = start + n + 1;
                return Some(self.slice(start..start + n));
            }
            prev = Some(byte);
        }
        self.pos = self.end;
        None
    }

    /// Scan one `key="value"` pair starting at the current position.
    ///
    /// The key is everything up to `=`, trimmed, so it may contain inner
    /// whitespace. Reaching `>` or `/` before `=` is a missing `=`.
    pub(crate) fn scan_attribute(&mut self) -> Result<(&'a str, &'a str), AttributeFault<'a>> {
        let key_at = self.pos;
        let key = trim(self.take_while(|b| !matches!(b, b'=' | b'/' | b'>')));
        match self.peek() {
            None => return Err(AttributeFault::EndOfInput),
            Some(_) if key.is_empty() => return Err(AttributeFault::EmptyKey { at: key_at }),
            Some(b'=') => {
                self.pos += 1;
            }
            Some(_) => {
                return Err(AttributeFault::MissingEquals { key, at: self.pos });
            }
        }

        self.skip_whitespace();
        let quote = match self.peek() {
            None => return Err(AttributeFault::EndOfInput),
            Some(quote @ (b'"' | b'\'')) => quote,
            Some(_) => return Err(AttributeFault::MissingQuote { key, at: self.pos }),
        };

        let quote_at = self.pos;
        self.pos += 1;
        match self.scan_quoted(quote) {
            Some(value) => Ok((key, value)),
            None => Err(AttributeFault::UnterminatedValue { key, quote_at }),
        }
    }

    pub(crate) fn slice(&self, range: Range<usize>) -> &'a str {
        self.text.get(range).unwrap_or_default()
    }

    pub(crate) fn location(&self, offset: usize) -> Location {
        self.locations.resolve(offset)
    }
}
