//! Context for XML parsing with diagnostic collection.

use crate::diagnostic::{DiagnosticKind, DiagnosticMessage};

/// Context for XML parsing that collects diagnostics.
///
/// Diagnostics are accumulated during parsing and can be retrieved
/// afterwards, so warnings are available even on successful parses.
///
/// # Example
///
/// ```rust
/// use minixml::{parse_with_context, XmlParseContext};
///
/// let mut ctx = XmlParseContext::new();
/// match parse_with_context("<root>text<child/>tail</root>", &mut ctx) {
///     Ok(doc) => {
///         assert_eq!(doc.root().child_at(0).unwrap().text(), Some("text"));
///         // The trailing "tail" run was discarded with a warning
///         assert_eq!(ctx.warnings().count(), 1);
///     }
///     Err(errors) => {
///         for err in errors {
///             eprintln!("Error: {}", err.title);
///         }
///     }
/// }
/// ```
#[derive(Debug, Default)]
pub struct XmlParseContext {
    /// Accumulated diagnostic messages during parsing.
    diagnostics: Vec<DiagnosticMessage>,
}

impl XmlParseContext {
    /// Create a new XML parse context.
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    /// Add a diagnostic message to the context.
    pub fn add_diagnostic(&mut self, diagnostic: DiagnosticMessage) {
        self.diagnostics.push(diagnostic);
    }

    /// Check if any diagnostics have been collected.
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Get all collected diagnostics.
    pub fn diagnostics(&self) -> &[DiagnosticMessage] {
        &self.diagnostics
    }

    /// Warnings only.
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Warning)
    }

    /// Take all collected diagnostics, leaving the context empty.
    pub fn take_diagnostics(&mut self) -> Vec<DiagnosticMessage> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Check if any errors (not warnings) have been collected.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(DiagnosticMessage::is_error)
    }
}
