//! Diagnostic messages for parse errors and warnings.
//!
//! Messages follow a tidyverse-like structure: a short title, an optional
//! problem statement, bulleted details and hints ending with `?`. When the
//! source text is available, [`DiagnosticMessage::to_text`] renders a source
//! snippet with ariadne.

use crate::location::Location;
use serde::{Deserialize, Serialize};

/// The kind of diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// An error that prevents completion
    Error,
    /// A warning that doesn't prevent completion but indicates a problem
    Warning,
    /// Informational message
    Info,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Info => "info",
        }
    }
}

/// A diagnostic message.
///
/// Structure:
/// 1. **Code**: Optional error code (e.g., "X-1-3") for searchability
/// 2. **Title**: Brief error message
/// 3. **Kind**: Error, Warning, Info
/// 4. **Problem**: What went wrong
/// 5. **Details**: Specific information
/// 6. **Hints**: Optional guidance for fixing (ends with ?)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    pub title: String,

    pub kind: DiagnosticKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,

    /// Where in the source the issue occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Named source text used to render a snippet around a diagnostic location.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    pub name: &'a str,
    pub content: &'a str,
    color: bool,
}

impl<'a> SourceFile<'a> {
    pub fn new(name: &'a str, content: &'a str) -> Self {
        Self {
            name,
            content,
            color: false,
        }
    }

    /// Enable ANSI colors in rendered snippets.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

impl DiagnosticMessage {
    /// Create a new diagnostic message with just a title and kind.
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            code: None,
            title: title.into(),
            kind,
            problem: None,
            details: Vec::new(),
            hints: Vec::new(),
            location: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }

    /// Render this diagnostic message as text.
    ///
    /// Format without a source:
    /// ```text
    /// Error [X-1-3]: title
    /// Problem statement here
    /// ✖ Detail 1
    /// ? Hint 1
    /// ```
    ///
    /// With a source and a location, the title and problem are shown by an
    /// ariadne report pointing into the source, followed by the details and
    /// hints.
    pub fn to_text(&self, source: Option<&SourceFile<'_>>) -> String {
        let mut result = String::new();

        let snippet = match (source, self.location) {
            (Some(source), Some(location)) => self.render_ariadne_source_context(source, location),
            _ => None,
        };

        match snippet {
            Some(snippet) => result.push_str(&snippet),
            None => {
                let kind = match self.kind {
                    DiagnosticKind::Error => "Error",
                    DiagnosticKind::Warning => "Warning",
                    DiagnosticKind::Info => "Info",
                };
                match &self.code {
                    Some(code) => result.push_str(&format!("{kind} [{code}]: {}\n", self.title)),
                    None => result.push_str(&format!("{kind}: {}\n", self.title)),
                }
                if let Some(problem) = &self.problem {
                    result.push_str(problem);
                    result.push('\n');
                }
                if let Some(location) = self.location {
                    result.push_str(&format!("at {location}\n"));
                }
            }
        }

        for detail in &self.details {
            result.push_str(&format!("✖ {detail}\n"));
        }
        for hint in &self.hints {
            result.push_str(&format!("? {hint}\n"));
        }

        result
    }

    /// Render this diagnostic message as a JSON value.
    ///
    /// ```
    /// use minixml::DiagnosticMessageBuilder;
    ///
    /// let msg = DiagnosticMessageBuilder::error("Something went wrong").build();
    /// let json = msg.to_json();
    /// assert_eq!(json["kind"], "error");
    /// assert_eq!(json["title"], "Something went wrong");
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let mut obj = json!({
            "kind": self.kind.as_str(),
            "title": self.title,
        });

        if let Some(code) = &self.code {
            obj["code"] = json!(code);
        }
        if let Some(problem) = &self.problem {
            obj["problem"] = json!(problem);
        }
        if !self.details.is_empty() {
            obj["details"] = json!(self.details);
        }
        if !self.hints.is_empty() {
            obj["hints"] = json!(self.hints);
        }
        if let Some(location) = &self.location {
            obj["location"] = json!({
                "offset": location.offset,
                "line": location.line(),
                "column": location.column + 1,
            });
        }

        obj
    }

    fn render_ariadne_source_context(
        &self,
        source: &SourceFile<'_>,
        location: Location,
    ) -> Option<String> {
        use ariadne::{Color, Config, Label, Report, ReportKind, Source};

        let (report_kind, color) = match self.kind {
            DiagnosticKind::Error => (ReportKind::Error, Color::Red),
            DiagnosticKind::Warning => (ReportKind::Warning, Color::Yellow),
            DiagnosticKind::Info => (ReportKind::Advice, Color::Cyan),
        };

        // ariadne indexes by char, locations are byte offsets
        let start = location.char_offset(source.content);
        let span = start..start + 1;
        let name = source.name.to_string();

        let mut report = Report::build(report_kind, name.clone(), start)
            .with_config(Config::default().with_color(source.color));

        report = match &self.code {
            Some(code) => report.with_message(format!("[{}] {}", code, self.title)),
            None => report.with_message(&self.title),
        };

        let label_message = self.problem.as_deref().unwrap_or(&self.title);
        report = report.with_label(
            Label::new((name.clone(), span))
                .with_message(label_message)
                .with_color(color),
        );

        let mut output = Vec::new();
        report
            .finish()
            .write((name, Source::from(source.content)), &mut output)
            .ok()?;

        String::from_utf8(output).ok()
    }
}

/// Builder for [`DiagnosticMessage`].
///
/// ```
/// use minixml::DiagnosticMessageBuilder;
///
/// let msg = DiagnosticMessageBuilder::error("Malformed XML Attribute")
///     .with_code("X-1-3")
///     .problem("Attribute values must be quoted")
///     .add_hint("Wrap the value in double quotes?")
///     .build();
/// assert_eq!(msg.code.as_deref(), Some("X-1-3"));
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    message: DiagnosticMessage,
}

impl DiagnosticMessageBuilder {
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(DiagnosticKind::Error, title),
        }
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(DiagnosticKind::Warning, title),
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(DiagnosticKind::Info, title),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.message.code = Some(code.into());
        self
    }

    pub fn problem(mut self, problem: impl Into<String>) -> Self {
        self.message.problem = Some(problem.into());
        self
    }

    pub fn add_detail(mut self, detail: impl Into<String>) -> Self {
        self.message.details.push(detail.into());
        self
    }

    pub fn add_hint(mut self, hint: impl Into<String>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.message.location = Some(location);
        self
    }

    pub fn build(self) -> DiagnosticMessage {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DiagnosticMessage {
        DiagnosticMessageBuilder::error("Mismatched XML End Tag")
            .with_code("X-1-6")
            .problem("End tag </b> does not match start tag <a>")
            .add_detail("Expected: </a>")
            .add_hint("Check that all opening tags have matching closing tags?")
            .with_location(Location {
                offset: 3,
                row: 0,
                column: 3,
            })
            .build()
    }

    #[test]
    fn test_builder_sets_fields() {
        let msg = sample();
        assert_eq!(msg.kind, DiagnosticKind::Error);
        assert!(msg.is_error());
        assert_eq!(msg.code.as_deref(), Some("X-1-6"));
        assert_eq!(msg.details.len(), 1);
        assert_eq!(msg.hints.len(), 1);
    }

    #[test]
    fn test_to_text_without_source() {
        insta::assert_snapshot!(sample().to_text(None), @r"
        Error [X-1-6]: Mismatched XML End Tag
        End tag </b> does not match start tag <a>
        at 1:4
        ✖ Expected: </a>
        ? Check that all opening tags have matching closing tags?
        ");
    }

    #[test]
    fn test_to_text_with_source_renders_snippet() {
        let source = SourceFile::new("doc.xml", "<a></b>");
        let text = sample().to_text(Some(&source));
        assert!(text.contains("[X-1-6] Mismatched XML End Tag"));
        assert!(text.contains("doc.xml"));
        assert!(text.contains("End tag </b> does not match start tag <a>"));
        assert!(text.contains("? Check that all opening tags"));
    }

    #[test]
    fn test_to_json() {
        let json = sample().to_json();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["code"], "X-1-6");
        assert_eq!(json["location"]["line"], 1);
        assert_eq!(json["location"]["column"], 4);
        assert_eq!(json["details"][0], "Expected: </a>");
    }

    #[test]
    fn test_warning_without_code() {
        let msg = DiagnosticMessageBuilder::warning("Discarded text").build();
        assert!(!msg.is_error());
        assert_eq!(msg.to_text(None), "Warning: Discarded text\n");
    }
}
