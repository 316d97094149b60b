//! Single-pass scanner that builds a [`Document`].
//!
//! The parser walks the input once, left to right, keeping an explicit stack
//! of open elements. The top of the stack is the element new children and
//! text attach to; `ROOT` sits at the bottom and is never popped.

use crate::diagnostic::{DiagnosticMessage, DiagnosticMessageBuilder};
use crate::error::{Construct, Error, ParseResult, Result};
use crate::observer::{NoopObserver, ParseObserver};
use crate::options::ParseOptions;
use crate::scanner::{AttributeFault, Cursor, is_whitespace, trim};
use crate::tree::{Attribute, Document, NodeId};
use crate::XmlParseContext;
use std::path::Path;

static NOOP: NoopObserver = NoopObserver;

/// Parse XML text into a [`Document`] with the default options.
///
/// # Example
///
/// ```rust
/// let doc = minixml::parse("<shelf><book/><book/></shelf>").unwrap();
/// assert_eq!(doc.root().child_at(0).unwrap().child_count(), 2);
/// ```
///
/// # Errors
///
/// Returns an error if the markup cannot be scanned; see [`Error`].
pub fn parse(input: &str) -> Result<Document> {
    XmlParser::new().parse(input)
}

/// Parse raw bytes. Invalid UTF-8 is replaced, the declared encoding is not
/// interpreted.
pub fn parse_bytes(input: &[u8]) -> Result<Document> {
    XmlParser::new().parse_bytes(input)
}

/// Read a whole file and parse it.
///
/// # Errors
///
/// Returns [`Error::Io`] if the path cannot be opened or fully read, or a
/// syntax error from parsing its contents.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document> {
    XmlParser::new().parse_file(path)
}

pub fn parse_with_options(input: &str, options: ParseOptions) -> Result<Document> {
    XmlParser::new().with_options(options).parse(input)
}

/// Parse XML, collecting warnings and errors into `ctx`.
///
/// Warnings are recorded even when parsing succeeds. On failure the
/// context also receives the error, which is returned as well.
///
/// ```rust
/// use minixml::{parse_with_context, XmlParseContext};
///
/// let mut ctx = XmlParseContext::new();
/// let errors = parse_with_context("<a></b>", &mut ctx).unwrap_err();
/// assert_eq!(errors[0].code.as_deref(), Some("X-1-6"));
/// assert!(ctx.has_errors());
/// ```
pub fn parse_with_context(input: &str, ctx: &mut XmlParseContext) -> ParseResult<Document> {
    XmlParser::new().parse_with_context(input, ctx)
}

/// Configurable parser.
///
/// ```rust
/// use minixml::{ParseOptions, TracingObserver, XmlParser};
///
/// let observer = TracingObserver;
/// let parser = XmlParser::new()
///     .with_options(ParseOptions::lenient())
///     .with_observer(&observer);
/// let doc = parser.parse("<a><b></a></b>").unwrap();
/// assert_eq!(doc.len(), 2);
/// ```
#[derive(Clone)]
pub struct XmlParser<'o> {
    options: ParseOptions,
    observer: &'o dyn ParseObserver,
}

impl Default for XmlParser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlParser<'static> {
    pub fn new() -> Self {
        Self {
            options: ParseOptions::default(),
            observer: &NOOP,
        }
    }
}

impl<'o> XmlParser<'o> {
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Report parse events to `observer`.
    pub fn with_observer<'p>(self, observer: &'p dyn ParseObserver) -> XmlParser<'p> {
        XmlParser {
            options: self.options,
            observer,
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn parse(&self, input: &str) -> Result<Document> {
        self.run(input).0
    }

    pub fn parse_bytes(&self, input: &[u8]) -> Result<Document> {
        self.parse(&String::from_utf8_lossy(input))
    }

    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Document> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_bytes(&bytes)
    }

    pub fn parse_with_context(
        &self,
        input: &str,
        ctx: &mut XmlParseContext,
    ) -> ParseResult<Document> {
        let (result, warnings) = self.run(input);
        for warning in warnings {
            ctx.add_diagnostic(warning);
        }
        match result {
            Ok(document) => Ok(document),
            Err(err) => {
                let diagnostic = err.to_diagnostic();
                ctx.add_diagnostic(diagnostic.clone());
                Err(vec![diagnostic])
            }
        }
    }

    fn run(&self, input: &str) -> (Result<Document>, Vec<DiagnosticMessage>) {
        tracing::debug!(
            bytes = input.len(),
            check_end_tags = self.options.check_end_tags,
            max_depth = ?self.options.max_depth,
            "Parsing XML"
        );

        let mut state = ParseState::new(input, &self.options, self.observer);
        let result = state.run();
        let warnings = std::mem::take(&mut state.warnings);

        match &result {
            Ok(()) => tracing::debug!(
                elements = state.document.len(),
                warnings = warnings.len(),
                "Parsed XML"
            ),
            Err(err) => tracing::debug!(error = %err, "XML parse failed"),
        }

        (result.map(|()| state.document), warnings)
    }
}

/// Internal parser state.
struct ParseState<'a, 'o> {
    cursor: Cursor<'a>,

    document: Document,

    /// Open elements, innermost last. `ROOT` is always at the bottom.
    stack: Vec<NodeId>,

    options: &'o ParseOptions,

    observer: &'o dyn ParseObserver,

    warnings: Vec<DiagnosticMessage>,

    /// Only the first `<?xml ...?>` fills the declaration.
    seen_declaration: bool,
}

impl<'a, 'o> ParseState<'a, 'o> {
    fn new(input: &'a str, options: &'o ParseOptions, observer: &'o dyn ParseObserver) -> Self {
        Self {
            cursor: Cursor::new(input),
            document: Document::new(),
            stack: vec![NodeId::ROOT],
            options,
            observer,
            warnings: Vec::new(),
            seen_declaration: false,
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(NodeId::ROOT)
    }

    /// Number of open elements, not counting `ROOT`.
    fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    fn run(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            match self.cursor.peek() {
                None => break,
                Some(b'<') => self.markup()?,
                Some(_) => self.text()?,
            }
        }
        self.finish();
        Ok(())
    }

    fn markup(&mut self) -> Result<()> {
        let start = self.cursor.pos();
        self.cursor.advance(1);
        self.cursor.skip_whitespace();

        if self.cursor.test(b"?") {
            self.processing_instruction(start)
        } else if self.cursor.test(b"!--") {
            self.comment(start)
        } else if self.cursor.test(b"!") {
            self.declaration(start)
        } else if self.cursor.test(b"/") {
            self.end_tag(start)
        } else {
            self.start_tag(start)
        }
    }

    fn processing_instruction(&mut self, start: usize) -> Result<()> {
        self.cursor.advance(1);
        let content_start = self.cursor.pos();
        let content = self
            .cursor
            .scan_past(b"?>")
            .ok_or_else(|| self.unterminated(Construct::ProcessingInstruction, start))?;

        let target = content
            .split(|c: char| c.is_ascii_whitespace())
            .next()
            .unwrap_or_default();
        self.observer.on_instruction(target);

        if target == "xml" && !self.seen_declaration {
            self.seen_declaration = true;
            let body_start = content_start + target.len();
            self.xml_declaration(body_start, content_start + content.len());
        }
        Ok(())
    }

    /// Read the pseudo-attributes of `<?xml ...?>` between `start` and `end`.
    fn xml_declaration(&mut self, start: usize, end: usize) {
        let mut cursor = Cursor::bounded(self.cursor.text(), start, end);
        let mut attributes = Vec::new();
        loop {
            cursor.skip_whitespace();
            if !cursor.has_next() {
                break;
            }
            match cursor.scan_attribute() {
                Ok((key, value)) => attributes.push(Attribute::new(key, value)),
                Err(fault) => {
                    let offset = fault.offset().unwrap_or(start);
                    self.warn(
                        DiagnosticMessageBuilder::warning("Malformed XML Declaration Ignored")
                            .with_code("X-2-4")
                            .problem("The pseudo-attributes of `<?xml ...?>` could not be read")
                            .add_detail(fault.message()),
                        offset,
                    );
                    return;
                }
            }
        }
        self.document.set_declaration(attributes);
    }

    fn comment(&mut self, start: usize) -> Result<()> {
        self.cursor.advance(3);
        self.cursor
            .scan_past(b"-->")
            .ok_or_else(|| self.unterminated(Construct::Comment, start))?;
        self.observer.on_comment(start..self.cursor.pos());
        Ok(())
    }

    fn declaration(&mut self, start: usize) -> Result<()> {
        self.cursor.advance(1);
        self.cursor
            .scan_past(b">")
            .ok_or_else(|| self.unterminated(Construct::Declaration, start))?;
        self.observer.on_declaration(start..self.cursor.pos());
        Ok(())
    }

    fn end_tag(&mut self, start: usize) -> Result<()> {
        self.cursor.advance(1);
        let name = self
            .cursor
            .scan_until_byte(b'>')
            .map(trim)
            .ok_or_else(|| self.unterminated(Construct::EndTag, start))?;
        self.cursor.advance(1);

        if self.depth() == 0 {
            if self.options.check_end_tags {
                return Err(Error::UnexpectedEndTag {
                    found: name.to_string(),
                    location: self.cursor.location(start),
                });
            }
            self.warn(
                DiagnosticMessageBuilder::warning("Stray XML End Tag Ignored")
                    .with_code("X-2-2")
                    .problem(format!("End tag </{}> closes no open element", name)),
                start,
            );
            return Ok(());
        }

        if self.options.check_end_tags {
            let expected = self.document.tag(self.current()).unwrap_or_default();
            if expected != name {
                return Err(Error::MismatchedEndTag {
                    expected: expected.to_string(),
                    found: name.to_string(),
                    location: self.cursor.location(start),
                });
            }
        }

        self.close_current(false);
        Ok(())
    }

    fn start_tag(&mut self, start: usize) -> Result<()> {
        let name = self
            .cursor
            .take_while(|b| !is_whitespace(b) && b != b'/' && b != b'>');
        if name.is_empty() {
            return Err(if self.cursor.has_next() {
                Error::EmptyTagName {
                    location: self.cursor.location(start),
                }
            } else {
                self.unterminated(Construct::StartTag, start)
            });
        }

        let depth = self.depth() + 1;
        if let Some(limit) = self.options.max_depth
            && depth > limit
        {
            return Err(Error::DepthLimitExceeded {
                limit,
                location: self.cursor.location(start),
            });
        }

        let parent = self.current();
        let id = self.document.open_element(parent, name, start);
        self.stack.push(id);
        self.observer.on_tag_open(name, depth);

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.peek() {
                None => return Err(self.unterminated(Construct::StartTag, start)),
                Some(b'>') => {
                    self.cursor.advance(1);
                    return Ok(());
                }
                Some(b'/') => {
                    let slash = self.cursor.pos();
                    self.cursor.advance(1);
                    self.cursor.skip_whitespace();
                    return match self.cursor.peek() {
                        Some(b'>') => {
                            self.cursor.advance(1);
                            self.close_current(true);
                            Ok(())
                        }
                        None => Err(self.unterminated(Construct::StartTag, start)),
                        Some(_) => Err(Error::MalformedTag {
                            tag: name.to_string(),
                            message: "expected `>` after `/`".to_string(),
                            location: self.cursor.location(slash),
                        }),
                    };
                }
                Some(_) => match self.cursor.scan_attribute() {
                    Ok((key, value)) => {
                        self.document.push_attribute(id, key, value);
                        self.observer.on_attribute(name, key, value);
                    }
                    Err(fault) => return Err(self.attribute_error(name, start, fault)),
                },
            }
        }
    }

    fn text(&mut self) -> Result<()> {
        let start = self.cursor.pos();
        let current = self.current();

        let Some(run) = self.cursor.scan_until_byte(b'<') else {
            if current != NodeId::ROOT {
                return Err(self.unterminated(Construct::Text, start));
            }
            self.discard_text(start, "Text after the last element was discarded");
            return Ok(());
        };

        let text = trim(run);
        if current == NodeId::ROOT {
            self.discard_text(start, "Text outside of any element was discarded");
        } else if self.document.set_text(current, text) {
            let tag = self.document.tag(current).unwrap_or_default();
            self.observer.on_text(tag, text);
        } else {
            let tag = self.document.tag(current).unwrap_or_default().to_string();
            self.discard_text(
                start,
                &format!("Mixed content in <{}> was discarded", tag),
            );
        }
        Ok(())
    }

    fn discard_text(&mut self, start: usize, problem: &str) {
        self.warn(
            DiagnosticMessageBuilder::warning("XML Text Discarded")
                .with_code("X-2-1")
                .problem(problem)
                .add_hint("Only the first text run of an element without children is kept?"),
            start,
        );
    }

    fn close_current(&mut self, self_closing: bool) {
        if self.depth() == 0 {
            return;
        }
        if let Some(id) = self.stack.pop() {
            self.document.close_element(id, self.cursor.pos());
            if let Some(tag) = self.document.tag(id) {
                self.observer.on_tag_close(tag, self_closing);
            }
        }
    }

    /// Accept whatever is still open at the end of input.
    fn finish(&mut self) {
        let end = self.cursor.end();
        let unclosed: Vec<NodeId> = self.stack.drain(1..).collect();
        for id in unclosed {
            self.document.close_element(id, end);
            let (tag, start) = match self.document.get(id) {
                Some(node) => (node.tag().to_string(), node.span().start),
                None => continue,
            };
            self.warn(
                DiagnosticMessageBuilder::warning("Unclosed XML Element")
                    .with_code("X-2-3")
                    .problem(format!("Element <{}> was never closed", tag))
                    .add_hint(format!("Add </{}> before the end of the input?", tag)),
                start,
            );
        }
        self.document.close_element(NodeId::ROOT, end);
    }

    fn warn(&mut self, builder: DiagnosticMessageBuilder, offset: usize) {
        let location = self.cursor.location(offset);
        let message = builder.with_location(location).build();
        let summary = message.problem.as_deref().unwrap_or(&message.title);
        self.observer.on_warning(summary, location);
        self.warnings.push(message);
    }

    fn unterminated(&self, construct: Construct, start: usize) -> Error {
        Error::UnterminatedConstruct {
            construct,
            location: self.cursor.location(start),
        }
    }

    fn attribute_error(&self, tag: &str, start: usize, fault: AttributeFault<'_>) -> Error {
        match fault {
            AttributeFault::EndOfInput => self.unterminated(Construct::StartTag, start),
            AttributeFault::UnterminatedValue { quote_at, .. } => {
                self.unterminated(Construct::AttributeValue, quote_at)
            }
            AttributeFault::EmptyKey { .. }
            | AttributeFault::MissingEquals { .. }
            | AttributeFault::MissingQuote { .. } => Error::MalformedAttribute {
                tag: tag.to_string(),
                message: fault.message(),
                location: self.cursor.location(fault.offset().unwrap_or(start)),
            },
        }
    }
}
