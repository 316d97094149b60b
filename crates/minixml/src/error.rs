//! Error types for XML parsing with source locations.

use crate::diagnostic::{DiagnosticMessage, DiagnosticMessageBuilder};
use crate::location::Location;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for minixml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for parse operations that return diagnostics.
pub type ParseResult<T> = std::result::Result<T, Vec<DiagnosticMessage>>;

/// A markup construct whose terminator was never found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    /// `<? ... ?>`
    ProcessingInstruction,
    /// `<!-- ... -->`
    Comment,
    /// `<! ... >`, e.g. a DOCTYPE
    Declaration,
    /// `<name ... >` or `<name ... />`
    StartTag,
    /// `</name>`
    EndTag,
    /// A quoted attribute value
    AttributeValue,
    /// Inner text that never reaches a `<`
    Text,
}

impl Construct {
    /// The terminator the scanner was looking for.
    pub fn terminator(&self) -> &'static str {
        match self {
            Construct::ProcessingInstruction => "?>",
            Construct::Comment => "-->",
            Construct::Declaration | Construct::StartTag | Construct::EndTag => ">",
            Construct::AttributeValue => "closing quote",
            Construct::Text => "<",
        }
    }
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Construct::ProcessingInstruction => "processing instruction",
            Construct::Comment => "comment",
            Construct::Declaration => "markup declaration",
            Construct::StartTag => "start tag",
            Construct::EndTag => "end tag",
            Construct::AttributeValue => "attribute value",
            Construct::Text => "text content",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while loading or parsing a document.
#[derive(Debug, Error)]
pub enum Error {
    /// The source path could not be opened or fully read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input ended before a construct's terminator.
    #[error("Unterminated {construct} at {location}: expected {}", .construct.terminator())]
    UnterminatedConstruct {
        construct: Construct,
        /// Where the construct started.
        location: Location,
    },

    /// An attribute without `=` or without a quoted value.
    #[error("Malformed attribute in <{tag}> at {location}: {message}")]
    MalformedAttribute {
        tag: String,
        message: String,
        location: Location,
    },

    /// A start tag that does not end in `>` or `/>`.
    #[error("Malformed tag <{tag}> at {location}: {message}")]
    MalformedTag {
        tag: String,
        message: String,
        location: Location,
    },

    /// `<` followed by no tag name.
    #[error("Empty tag name at {location}")]
    EmptyTagName { location: Location },

    /// End tag naming a different element than the one open.
    #[error("Mismatched end tag at {location}: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        expected: String,
        found: String,
        location: Location,
    },

    /// End tag with no element open.
    #[error("Unexpected end tag </{found}> at {location}: no element is open")]
    UnexpectedEndTag { found: String, location: Location },

    /// Element nesting deeper than [`ParseOptions::max_depth`](crate::ParseOptions::max_depth).
    #[error("Element nesting exceeds the limit of {limit} at {location}")]
    DepthLimitExceeded { limit: usize, location: Location },
}

impl Error {
    /// Where in the source the error occurred, if it came from the scanner.
    pub fn location(&self) -> Option<Location> {
        match self {
            Error::Io { .. } => None,
            Error::UnterminatedConstruct { location, .. }
            | Error::MalformedAttribute { location, .. }
            | Error::MalformedTag { location, .. }
            | Error::EmptyTagName { location }
            | Error::MismatchedEndTag { location, .. }
            | Error::UnexpectedEndTag { location, .. }
            | Error::DepthLimitExceeded { location, .. } => Some(*location),
        }
    }

    /// Stable error code for this kind of error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io { .. } => "X-1-1",
            Error::UnterminatedConstruct { .. } => "X-1-2",
            Error::MalformedAttribute { .. } => "X-1-3",
            Error::MalformedTag { .. } => "X-1-4",
            Error::EmptyTagName { .. } => "X-1-5",
            Error::MismatchedEndTag { .. } => "X-1-6",
            Error::UnexpectedEndTag { .. } => "X-1-7",
            Error::DepthLimitExceeded { .. } => "X-1-8",
        }
    }

    /// Convert this error to a DiagnosticMessage with the appropriate X-1-* code.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let builder = match self {
            Error::Io { path, source } => DiagnosticMessageBuilder::error("XML Input Unavailable")
                .problem(format!("Could not read `{}`", path.display()))
                .add_detail(source.to_string()),

            Error::UnterminatedConstruct { construct, .. } => {
                DiagnosticMessageBuilder::error("Unexpected End of XML Input")
                    .problem(format!(
                        "The {} was never closed; expected `{}`",
                        construct,
                        construct.terminator()
                    ))
            }

            Error::MalformedAttribute { tag, message, .. } => {
                DiagnosticMessageBuilder::error("Malformed XML Attribute")
                    .problem(format!("Attribute list of <{}> is malformed", tag))
                    .add_detail(message.clone())
                    .add_hint("Attributes are written as key=\"value\" or key='value'?")
            }

            Error::MalformedTag { tag, message, .. } => {
                DiagnosticMessageBuilder::error("Malformed XML Tag")
                    .problem(format!("Tag <{}> is malformed", tag))
                    .add_detail(message.clone())
            }

            Error::EmptyTagName { .. } => DiagnosticMessageBuilder::error("Empty XML Tag Name")
                .problem("A `<` must be followed by an element name")
                .add_hint("Escaping a literal `<` in text is not supported; remove it?"),

            Error::MismatchedEndTag {
                expected, found, ..
            } => DiagnosticMessageBuilder::error("Mismatched XML End Tag")
                .problem(format!(
                    "End tag </{}> does not match start tag <{}>",
                    found, expected
                ))
                .add_detail(format!("Expected: </{}>", expected))
                .add_detail(format!("Found: </{}>", found))
                .add_hint("Check that all opening tags have matching closing tags?"),

            Error::UnexpectedEndTag { found, .. } => {
                DiagnosticMessageBuilder::error("Unexpected XML End Tag")
                    .problem(format!("End tag </{}> closes no open element", found))
                    .add_hint("Remove the extra end tag?")
            }

            Error::DepthLimitExceeded { limit, .. } => {
                DiagnosticMessageBuilder::error("XML Nesting Too Deep")
                    .problem(format!("Elements are nested deeper than {}", limit))
                    .add_hint("Raise the maximum depth in the parse options?")
            }
        };

        let builder = builder.with_code(self.code());
        match self.location() {
            Some(location) => builder.with_location(location).build(),
            None => builder.build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(offset: usize) -> Location {
        Location {
            offset,
            row: 0,
            column: offset,
        }
    }

    #[test]
    fn test_display_includes_location() {
        let err = Error::MismatchedEndTag {
            expected: "a".to_string(),
            found: "b".to_string(),
            location: at(3),
        };
        assert_eq!(
            err.to_string(),
            "Mismatched end tag at 1:4: expected </a>, found </b>"
        );
    }

    #[test]
    fn test_unterminated_display() {
        let err = Error::UnterminatedConstruct {
            construct: Construct::Comment,
            location: at(0),
        };
        assert_eq!(err.to_string(), "Unterminated comment at 1:1: expected -->");
    }

    #[test]
    fn test_error_to_diagnostic_codes() {
        let cases = [
            (
                Error::UnterminatedConstruct {
                    construct: Construct::StartTag,
                    location: at(0),
                },
                "X-1-2",
            ),
            (
                Error::MalformedAttribute {
                    tag: "a".to_string(),
                    message: "missing quote".to_string(),
                    location: at(3),
                },
                "X-1-3",
            ),
            (Error::EmptyTagName { location: at(0) }, "X-1-5"),
            (
                Error::UnexpectedEndTag {
                    found: "a".to_string(),
                    location: at(0),
                },
                "X-1-7",
            ),
            (
                Error::DepthLimitExceeded {
                    limit: 2,
                    location: at(6),
                },
                "X-1-8",
            ),
        ];

        for (err, code) in cases {
            let diag = err.to_diagnostic();
            assert_eq!(diag.code.as_deref(), Some(code));
            assert!(diag.is_error());
            assert_eq!(diag.location, err.location());
        }
    }

    #[test]
    fn test_io_error_has_no_location() {
        let err = Error::Io {
            path: PathBuf::from("missing.xml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.location(), None);
        let diag = err.to_diagnostic();
        assert_eq!(diag.code.as_deref(), Some("X-1-1"));
        assert_eq!(diag.title, "XML Input Unavailable");
        assert!(err.to_string().starts_with("Failed to read missing.xml"));
    }
}
