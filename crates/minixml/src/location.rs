//! Source positions used by errors and diagnostics.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;

/// A location in source text (0-indexed)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Location {
    /// Byte offset from start of source
    pub offset: usize,
    /// Row number (0-indexed)
    pub row: usize,
    /// Column number (0-indexed, in characters not bytes)
    pub column: usize,
}

impl Location {
    /// Resolve a byte offset in `source`, clamping offsets past the end.
    pub fn resolve(source: &str, offset: usize) -> Self {
        offset_to_location(source, offset.min(source.len())).unwrap_or_default()
    }

    /// 1-based line number, as editors display it.
    pub fn line(&self) -> usize {
        self.row + 1
    }

    /// Character offset of this location, as needed by char-indexed renderers.
    pub(crate) fn char_offset(&self, source: &str) -> usize {
        source
            .get(..self.offset.min(source.len()))
            .map_or(0, |prefix| prefix.chars().count())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.column + 1)
    }
}

/// Convert a byte offset to a Location with line and column info
///
/// Returns None if the offset is out of bounds.
pub fn offset_to_location(source: &str, offset: usize) -> Option<Location> {
    if offset > source.len() {
        return None;
    }
    let reached = walk(source, Location::default(), offset);
    Some(Location { offset, ..reached })
}

/// Count rows and columns from `from` until `offset` is reached.
///
/// The returned location's `offset` is where the walk stopped, which is
/// past `offset` when it falls inside a multi-byte character.
fn walk(source: &str, from: Location, offset: usize) -> Location {
    let mut at = from;
    for ch in source.get(from.offset..).unwrap_or_default().chars() {
        if at.offset >= offset {
            break;
        }
        if ch == '\n' {
            at.row += 1;
            at.column = 0;
        } else {
            at.column += 1;
        }
        at.offset += ch.len_utf8();
    }
    at
}

/// Resolves offsets into one source, resuming from the last resolved
/// position.
///
/// The parser asks for locations in mostly increasing order, so resolving
/// every location of a parse costs one pass over the input.
#[derive(Debug)]
pub(crate) struct LocationResolver<'a> {
    source: &'a str,
    last: Cell<Location>,
}

impl<'a> LocationResolver<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            source,
            last: Cell::new(Location::default()),
        }
    }

    /// Same result as [`Location::resolve`].
    pub(crate) fn resolve(&self, offset: usize) -> Location {
        let offset = offset.min(self.source.len());
        let last = self.last.get();
        let from = if last.offset <= offset {
            last
        } else {
            Location::default()
        };
        let reached = walk(self.source, from, offset);
        self.last.set(reached);
        Location { offset, ..reached }
    }
}
