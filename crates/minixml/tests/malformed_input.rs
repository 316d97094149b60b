use minixml::{
    Construct, Error, ParseEvent, ParseOptions, RecordingObserver, SourceFile, XmlParseContext,
    XmlParser, parse, parse_file, parse_with_context, parse_with_options,
};
use std::io::Write;

fn unterminated(input: &str) -> (Construct, usize) {
    match parse(input) {
        Err(Error::UnterminatedConstruct {
            construct,
            location,
        }) => (construct, location.offset),
        other => panic!("expected an unterminated construct for {input:?}, got {other:?}"),
    }
}

#[test]
fn test_unterminated_constructs() {
    assert_eq!(
        unterminated("<?xml version=\"1.0\""),
        (Construct::ProcessingInstruction, 0)
    );
    assert_eq!(unterminated("<a/><!-- open -"), (Construct::Comment, 4));
    assert_eq!(unterminated("<!DOCTYPE html"), (Construct::Declaration, 0));
    assert_eq!(unterminated("<a"), (Construct::StartTag, 0));
    assert_eq!(unterminated("<a k=\"v\""), (Construct::StartTag, 0));
    assert_eq!(unterminated("<a k=\"v"), (Construct::AttributeValue, 5));
    assert_eq!(unterminated("<a></a"), (Construct::EndTag, 3));
    assert_eq!(unterminated("<a>dangling text"), (Construct::Text, 3));
    assert_eq!(unterminated("<"), (Construct::StartTag, 0));
}

#[test]
fn test_nul_terminates_input() {
    let doc = parse("<a>x</a>\0<b>").unwrap();
    assert_eq!(doc.root().child_count(), 1);

    // Truncated by the NUL, so the comment never ends
    assert!(matches!(
        parse("<!-- a \0 -->"),
        Err(Error::UnterminatedConstruct {
            construct: Construct::Comment,
            ..
        })
    ));
}

#[test]
fn test_missing_quote_aborts_parse() {
    let err = parse("<library><book id=1></book></library>").unwrap_err();
    match err {
        Error::MalformedAttribute {
            tag,
            message,
            location,
        } => {
            assert_eq!(tag, "book");
            assert!(message.contains("`id`"), "{message}");
            assert_eq!(location.offset, 18);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_missing_equals() {
    assert!(matches!(
        parse("<input disabled>"),
        Err(Error::MalformedAttribute { ref tag, .. }) if tag == "input"
    ));
}

#[test]
fn test_attribute_key_runs_to_equals() {
    let doc = parse(r#"<x a b="1"/>"#).unwrap();
    let x = doc.root().child_at(0).unwrap();
    assert_eq!(x.attribute("a b"), Some("1"));
    assert_eq!(x.attributes().len(), 1);

    match parse("<x a b/>") {
        Err(Error::MalformedAttribute {
            message, location, ..
        }) => {
            assert!(message.contains("`a b`"), "{message}");
            assert_eq!(location.offset, 6);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_malformed_self_closing() {
    let err = parse("<a / b>").unwrap_err();
    assert!(matches!(err, Error::MalformedTag { ref tag, .. } if tag == "a"));
    assert_eq!(err.location().map(|l| l.offset), Some(3));
}

#[test]
fn test_empty_tag_name() {
    assert!(matches!(parse("<>"), Err(Error::EmptyTagName { .. })));
    assert!(matches!(parse("<a>< ></a>"), Err(Error::EmptyTagName { .. })));
}

#[test]
fn test_end_tag_checks() {
    assert!(matches!(
        parse("<a><b></a></b>"),
        Err(Error::MismatchedEndTag { ref expected, ref found, .. })
            if expected == "b" && found == "a"
    ));
    assert!(matches!(
        parse("<a/></a>"),
        Err(Error::UnexpectedEndTag { ref found, .. }) if found == "a"
    ));
}

#[test]
fn test_lenient_ignores_stray_end_tag() {
    let options = ParseOptions::lenient();
    let doc = parse_with_options("<a/></a><b/>", options.clone()).unwrap();
    assert_eq!(doc.root().child_count(), 2);

    let mut ctx = XmlParseContext::new();
    XmlParser::new()
        .with_options(options)
        .parse_with_context("</x>", &mut ctx)
        .unwrap();
    let warning = ctx.warnings().next().unwrap();
    assert_eq!(warning.code.as_deref(), Some("X-2-2"));
}

#[test]
fn test_mixed_content_is_discarded_with_warning() {
    let mut ctx = XmlParseContext::new();
    let doc = parse_with_context("<p>one<b>two</b>three</p>", &mut ctx).unwrap();
    let p = doc.root().child_at(0).unwrap();
    assert_eq!(p.text(), Some("one"));
    assert_eq!(p.child_at(0).unwrap().text(), Some("two"));

    let codes: Vec<_> = ctx.warnings().filter_map(|d| d.code.as_deref()).collect();
    assert_eq!(codes, vec!["X-2-1"]);
}

#[test]
fn test_many_mixed_content_warnings() {
    let runs = 50_000;
    let input = format!("<r>\n{}</r>", "<p>a<b/>c</p>".repeat(runs));
    let mut ctx = XmlParseContext::new();
    let doc = parse_with_context(&input, &mut ctx).unwrap();
    assert_eq!(doc.len(), 1 + 2 * runs);

    let warnings: Vec<_> = ctx.warnings().collect();
    assert_eq!(warnings.len(), runs);
    let last = warnings[runs - 1].location.unwrap();
    assert_eq!(last.offset, 4 + 13 * (runs - 1) + 8);
    assert_eq!((last.row, last.column), (1, 13 * (runs - 1) + 8));
}

#[test]
fn test_top_level_text_is_discarded() {
    let mut ctx = XmlParseContext::new();
    let doc = parse_with_context("before <a/> after", &mut ctx).unwrap();
    assert_eq!(doc.root().text(), None);
    assert_eq!(doc.root().child_count(), 1);
    assert_eq!(ctx.warnings().count(), 2);
}

#[test]
fn test_malformed_declaration_is_ignored() {
    let mut ctx = XmlParseContext::new();
    let doc = parse_with_context("<?xml version=1.0?><a/>", &mut ctx).unwrap();
    assert!(doc.declaration().is_empty());
    assert_eq!(doc.root().child_count(), 1);
    assert_eq!(
        ctx.warnings().next().and_then(|d| d.code.as_deref()),
        Some("X-2-4")
    );
}

#[test]
fn test_only_first_declaration_counts() {
    let doc =
        parse(r#"<?xml version="1.0" encoding="UTF-8"?><?xml encoding="latin1"?><a/>"#).unwrap();
    assert_eq!(doc.declared_encoding(), Some("UTF-8"));
}

#[test]
fn test_entities_are_not_decoded() {
    let doc = parse(r#"<a title="x &amp; y">1 &lt; 2</a>"#).unwrap();
    let a = doc.root().child_at(0).unwrap();
    assert_eq!(a.attribute("title"), Some("x &amp; y"));
    assert_eq!(a.text(), Some("1 &lt; 2"));
}

#[test]
fn test_doctype_is_skipped() {
    let recorder = RecordingObserver::new();
    let doc = XmlParser::new()
        .with_observer(&recorder)
        .parse("<!DOCTYPE note><note/>")
        .unwrap();
    assert_eq!(doc.root().child_at(0).unwrap().tag(), "note");
    assert_eq!(
        recorder.events()[0],
        ParseEvent::Declaration { span: 0..15 }
    );
}

#[test]
fn test_observer_sequence_for_nested_document() {
    let recorder = RecordingObserver::new();
    XmlParser::new()
        .with_observer(&recorder)
        .parse("<a><b/><c>x</c></a><d>")
        .unwrap();

    let events = recorder.take_events();
    let summary: Vec<String> = events
        .iter()
        .map(|event| match event {
            ParseEvent::TagOpen { tag, depth } => format!("open {tag} {depth}"),
            ParseEvent::TagClose { tag, self_closing } => format!("close {tag} {self_closing}"),
            ParseEvent::Text { tag, text } => format!("text {tag} {text}"),
            ParseEvent::Warning { message, .. } => format!("warn {message}"),
            other => format!("{other:?}"),
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            "open a 1",
            "open b 2",
            "close b true",
            "open c 2",
            "text c x",
            "close c false",
            "close a false",
            "open d 1",
            "warn Element <d> was never closed",
        ]
    );
}

#[test]
fn test_error_diagnostic_renders_snippet() {
    let input = "<library>\n  <book id=1/>\n</library>";
    let mut ctx = XmlParseContext::new();
    let errors = parse_with_context(input, &mut ctx).unwrap_err();
    let diagnostic = &errors[0];
    assert_eq!(diagnostic.code.as_deref(), Some("X-1-3"));
    assert_eq!(diagnostic.location.map(|l| l.line()), Some(2));

    let text = diagnostic.to_text(Some(&SourceFile::new("library.xml", input)));
    assert!(text.contains("library.xml"), "{text}");
    assert!(text.contains("Malformed XML Attribute"), "{text}");
    assert!(text.contains("<book id=1/>"), "{text}");
}

#[test]
fn test_parse_file_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.xml");
    let err = parse_file(&path).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert_eq!(err.to_diagnostic().code.as_deref(), Some("X-1-1"));
}

#[test]
fn test_parse_file_lossy_bytes() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>caf\xe9</a>")
        .unwrap();
    let doc = parse_file(file.path()).unwrap();
    assert_eq!(doc.declared_encoding(), Some("ISO-8859-1"));
    assert_eq!(doc.root().child_at(0).unwrap().text(), Some("caf\u{fffd}"));
}

#[test]
fn test_deep_nesting_does_not_recurse() {
    let depth = 100_000;
    let input = format!("{}{}", "<n>".repeat(depth), "</n>".repeat(depth));
    let doc = parse(&input).unwrap();
    assert_eq!(doc.len(), depth);
    let deepest = doc.root().descendants().last().unwrap();
    assert_eq!(deepest.tag(), "n");
    assert_eq!(deepest.child_count(), 0);
    assert_eq!(doc.root().find_by_path(&"n/".repeat(depth), true), Some(deepest));
}
