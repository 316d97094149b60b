//! `minixml`: parse an XML file and query the resulting tree.

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use minixml::{
    Document, NodeRef, ParseOptions, SourceFile, TracingObserver, XmlParseContext, XmlParser,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "minixml")]
#[command(about = "Parse an XML file and query the resulting tree")]
#[command(version)]
struct Cli {
    /// Close elements on any end tag instead of requiring matching names
    #[arg(long, global = true)]
    lenient: bool,

    /// Maximum element nesting depth
    #[arg(long, global = true, value_name = "N")]
    max_depth: Option<usize>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Log every parse event
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the whole tree
    Tree { file: PathBuf },

    /// Follow child indices down from the document root
    Child {
        file: PathBuf,

        /// Zero-based child index at each level
        #[arg(required = true)]
        indices: Vec<usize>,
    },

    /// Find the first element whose tag matches, in document order
    Find {
        file: PathBuf,
        name: String,

        /// Match tags containing NAME instead of equal to it
        #[arg(long)]
        substring: bool,
    },

    /// Follow a slash-separated path of tags from the document root
    Path {
        file: PathBuf,
        path: String,

        /// Match tags containing each segment instead of equal to it
        #[arg(long)]
        substring: bool,
    },

    /// Print one attribute of the element at a path
    Attr {
        file: PathBuf,
        path: String,
        key: String,

        /// Match tags containing each segment instead of equal to it
        #[arg(long)]
        substring: bool,
    },

    /// Count the elements whose tag matches
    Count {
        file: PathBuf,
        name: String,

        /// Match tags containing NAME instead of equal to it
        #[arg(long)]
        substring: bool,
    },
}

impl Command {
    fn file(&self) -> &Path {
        match self {
            Command::Tree { file }
            | Command::Child { file, .. }
            | Command::Find { file, .. }
            | Command::Path { file, .. }
            | Command::Attr { file, .. }
            | Command::Count { file, .. } => file,
        }
    }
}

/// What a query produced.
enum Answer<'a> {
    Node(NodeRef<'a>),
    Value(&'a str),
    Count(usize),
    Missing(String),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(log_filter(cli.verbose, cli.trace));

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// `-v`, `-vv` and `--trace` override the environment. Otherwise
/// `MINIXML_LOG` is read, then `RUST_LOG`.
fn log_filter(verbose: u8, trace: bool) -> EnvFilter {
    match (verbose, trace) {
        (_, true) | (2.., _) => "minixml=trace".into(),
        (1, false) => "minixml=debug".into(),
        (0, false) => EnvFilter::try_from_env("MINIXML_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| "minixml=warn".into()),
    }
}

fn init_logging(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let path = cli.command.file();
    let bytes = std::fs::read(path).map_err(|source| minixml::Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source = String::from_utf8_lossy(&bytes);

    let options = ParseOptions::default()
        .with_check_end_tags(!cli.lenient)
        .with_max_depth(cli.max_depth);
    let observer = TracingObserver;
    let parser = XmlParser::new().with_options(options);
    let parser = if cli.trace {
        parser.with_observer(&observer)
    } else {
        parser
    };

    let mut ctx = XmlParseContext::new();
    let result = parser.parse_with_context(&source, &mut ctx);

    let name = path.display().to_string();
    let source_file = SourceFile::new(&name, &source).with_color(std::io::stderr().is_terminal());
    for diagnostic in ctx.diagnostics() {
        match cli.format {
            Format::Text => eprint!("{}", diagnostic.to_text(Some(&source_file))),
            Format::Json => eprintln!("{}", diagnostic.to_json()),
        }
    }

    let Ok(document) = result else {
        return Ok(ExitCode::FAILURE);
    };

    tracing::debug!(elements = document.len(), "Loaded {}", name);

    let reply = answer(&cli.command, &document);
    Ok(print_answer(&reply, cli.format))
}

fn answer<'a>(command: &'a Command, document: &'a Document) -> Answer<'a> {
    let root = document.root();
    match command {
        Command::Tree { .. } => Answer::Node(root),

        Command::Child { indices, .. } => indices
            .iter()
            .try_fold(root, |node, &index| node.child_at(index))
            .map_or_else(
                || Answer::Missing(format!("No child at index path {:?}", indices)),
                Answer::Node,
            ),

        Command::Find {
            name, substring, ..
        } => root.find_tag(name, !substring).map_or_else(
            || Answer::Missing(format!("No element matches `{}`", name)),
            Answer::Node,
        ),

        Command::Path {
            path, substring, ..
        } => root.find_by_path(path, !substring).map_or_else(
            || Answer::Missing(format!("No element at path `{}`", path)),
            Answer::Node,
        ),

        Command::Attr {
            path,
            key,
            substring,
            ..
        } => match root.find_by_path(path, !substring) {
            None => Answer::Missing(format!("No element at path `{}`", path)),
            Some(node) => node.attribute(key).map_or_else(
                || Answer::Missing(format!("<{}> has no attribute `{}`", node.tag(), key)),
                Answer::Value,
            ),
        },

        Command::Count {
            name, substring, ..
        } => Answer::Count(root.find_all(name, !substring).count()),
    }
}

fn print_answer(answer: &Answer<'_>, format: Format) -> ExitCode {
    match (answer, format) {
        (Answer::Missing(message), Format::Text) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
        (Answer::Missing(message), Format::Json) => {
            println!("{}", serde_json::json!({ "found": false, "message": message }));
            return ExitCode::FAILURE;
        }
        (Answer::Node(node), Format::Text) => print!("{}", node.dump()),
        (Answer::Node(node), Format::Json) => println!("{}", node.to_json()),
        (Answer::Value(value), Format::Text) => println!("{}", value),
        (Answer::Value(value), Format::Json) => {
            println!("{}", serde_json::json!({ "value": value }));
        }
        (Answer::Count(count), Format::Text) => println!("{}", count),
        (Answer::Count(count), Format::Json) => {
            println!("{}", serde_json::json!({ "count": count }));
        }
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"<library>
  <book id="1"><title>The Great Gatsby</title><rating value="4.5"/></book>
  <book id="2"><title>1984</title><rating value="4.9"/></book>
</library>"#;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("minixml").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = cli(&["find", "doc.xml", "title", "--lenient", "--max-depth", "8", "-vv"]);
        assert!(cli.lenient);
        assert_eq!(cli.max_depth, Some(8));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, Format::Text);
        assert_eq!(cli.command.file(), Path::new("doc.xml"));
    }

    #[test]
    fn test_trace_flag_raises_log_level() {
        assert_eq!(log_filter(0, true).to_string(), "minixml=trace");
        assert_eq!(log_filter(1, true).to_string(), "minixml=trace");
        assert_eq!(log_filter(2, false).to_string(), "minixml=trace");
        assert_eq!(log_filter(1, false).to_string(), "minixml=debug");
    }

    #[test]
    fn test_child_requires_indices() {
        assert!(Cli::try_parse_from(["minixml", "child", "doc.xml"]).is_err());
        let cli = cli(&["child", "doc.xml", "0", "1", "--format", "json"]);
        assert_eq!(cli.format, Format::Json);
        assert!(matches!(cli.command, Command::Child { ref indices, .. } if indices == &[0, 1]));
    }

    #[test]
    fn test_rejects_negative_index() {
        assert!(Cli::try_parse_from(["minixml", "child", "doc.xml", "-1"]).is_err());
    }

    #[test]
    fn test_answers() {
        let document = minixml::parse(LIBRARY).unwrap();

        let attr = cli(&["attr", "doc.xml", "library/book/rating", "value"]);
        assert!(matches!(answer(&attr.command, &document), Answer::Value("4.5")));

        let child = cli(&["child", "doc.xml", "0", "1", "0"]);
        match answer(&child.command, &document) {
            Answer::Node(node) => assert_eq!(node.text(), Some("1984")),
            _ => panic!("expected a node"),
        }

        let count = cli(&["count", "doc.xml", "tit", "--substring"]);
        assert!(matches!(answer(&count.command, &document), Answer::Count(2)));

        let missing = cli(&["path", "doc.xml", "library/shelf"]);
        assert!(matches!(answer(&missing.command, &document), Answer::Missing(_)));

        let out_of_range = cli(&["child", "doc.xml", "0", "5"]);
        assert!(matches!(
            answer(&out_of_range.command, &document),
            Answer::Missing(_)
        ));
    }
}
