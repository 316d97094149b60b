//! Observer abstraction for parse events.
//!
//! The parser reports what it recognizes (tags opened and closed, attributes,
//! text, skipped comments and instructions, warnings) to a [`ParseObserver`].
//! The default is [`NoopObserver`]; [`TracingObserver`] forwards events to
//! `tracing`, and [`RecordingObserver`] keeps them for inspection.

use crate::location::Location;
use std::ops::Range;
use std::sync::{Mutex, PoisonError};

/// Observer for parse events.
///
/// All methods have empty default implementations, allowing observers
/// to implement only the events they care about.
pub trait ParseObserver: Send + Sync {
    /// A start tag was recognized and its node attached to the tree.
    ///
    /// `depth` is 1 for top-level elements.
    fn on_tag_open(&self, _tag: &str, _depth: usize) {}

    /// An element was closed by its end tag or a self-closing `/>`.
    fn on_tag_close(&self, _tag: &str, _self_closing: bool) {}

    /// An attribute was recorded on the element `tag`.
    fn on_attribute(&self, _tag: &str, _key: &str, _value: &str) {}

    /// Trimmed inner text was recorded on the element `tag`.
    fn on_text(&self, _tag: &str, _text: &str) {}

    /// A comment spanning `span` was skipped.
    fn on_comment(&self, _span: Range<usize>) {}

    /// A processing instruction with the given target was skipped.
    fn on_instruction(&self, _target: &str) {}

    /// A markup declaration such as `<!DOCTYPE ...>` was skipped.
    fn on_declaration(&self, _span: Range<usize>) {}

    /// Input was accepted but something was dropped or left open.
    fn on_warning(&self, _message: &str, _location: Location) {}
}

/// No-op observer implementation.
///
/// This is the observer used when no other is specified.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ParseObserver for NoopObserver {}

/// Tracing observer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ParseObserver for TracingObserver {
    fn on_tag_open(&self, tag: &str, depth: usize) {
        tracing::debug!(tag, depth, "Parsed start tag");
    }

    fn on_tag_close(&self, tag: &str, self_closing: bool) {
        tracing::debug!(tag, self_closing, "Closed element");
    }

    fn on_attribute(&self, tag: &str, key: &str, value: &str) {
        tracing::trace!(tag, key, value, "Parsed attribute");
    }

    fn on_text(&self, tag: &str, text: &str) {
        tracing::trace!(tag, text, "Parsed inner text");
    }

    fn on_comment(&self, span: Range<usize>) {
        tracing::trace!(start = span.start, end = span.end, "Skipped comment");
    }

    fn on_instruction(&self, target: &str) {
        tracing::trace!(target, "Skipped processing instruction");
    }

    fn on_declaration(&self, span: Range<usize>) {
        tracing::trace!(start = span.start, end = span.end, "Skipped declaration");
    }

    fn on_warning(&self, message: &str, location: Location) {
        tracing::warn!(%location, "{}", message);
    }
}

/// An owned record of one observer callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    TagOpen { tag: String, depth: usize },
    TagClose { tag: String, self_closing: bool },
    Attribute { tag: String, key: String, value: String },
    Text { tag: String, text: String },
    Comment { span: Range<usize> },
    Instruction { target: String },
    Declaration { span: Range<usize> },
    Warning { message: String, location: Location },
}

/// Observer that records every event in order.
///
/// ```rust
/// use minixml::{ParseEvent, RecordingObserver, XmlParser};
///
/// let recorder = RecordingObserver::new();
/// XmlParser::new().with_observer(&recorder).parse("<a/>").unwrap();
/// assert_eq!(
///     recorder.events(),
///     vec![
///         ParseEvent::TagOpen { tag: "a".into(), depth: 1 },
///         ParseEvent::TagClose { tag: "a".into(), self_closing: true },
///     ]
/// );
/// ```
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ParseEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the events recorded so far.
    pub fn events(&self) -> Vec<ParseEvent> {
        self.lock().clone()
    }

    /// Take the recorded events, leaving the recorder empty.
    pub fn take_events(&self) -> Vec<ParseEvent> {
        std::mem::take(&mut *self.lock())
    }

    fn record(&self, event: ParseEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ParseEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ParseObserver for RecordingObserver {
    fn on_tag_open(&self, tag: &str, depth: usize) {
        self.record(ParseEvent::TagOpen {
            tag: tag.to_string(),
            depth,
        });
    }

    fn on_tag_close(&self, tag: &str, self_closing: bool) {
        self.record(ParseEvent::TagClose {
            tag: tag.to_string(),
            self_closing,
        });
    }

    fn on_attribute(&self, tag: &str, key: &str, value: &str) {
        self.record(ParseEvent::Attribute {
            tag: tag.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    fn on_text(&self, tag: &str, text: &str) {
        self.record(ParseEvent::Text {
            tag: tag.to_string(),
            text: text.to_string(),
        });
    }

    fn on_comment(&self, span: Range<usize>) {
        self.record(ParseEvent::Comment { span });
    }

    fn on_instruction(&self, target: &str) {
        self.record(ParseEvent::Instruction {
            target: target.to_string(),
        });
    }

    fn on_declaration(&self, span: Range<usize>) {
        self.record(ParseEvent::Declaration { span });
    }

    fn on_warning(&self, message: &str, location: Location) {
        self.record(ParseEvent::Warning {
            message: message.to_string(),
            location,
        });
    }
}
