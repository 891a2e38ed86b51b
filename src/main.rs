use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use regex::Regex;
use tracing::{debug, error};

use axquery::element::{Node, Session};
use axquery::error::{AxError, Result};
use axquery::qualifier::{Expected, Filters};
use axquery::search::{Cardinality, SearchResult};
use axquery::settings::Settings;
use axquery::snapshot::MemoryTree;
use axquery::{debug as diagnostics, member};

#[derive(Parser)]
#[command(name = "axquery")]
#[command(about = "Search an accessibility tree snapshot")]
#[command(version)]
struct Cli {
    /// JSON snapshot of the tree to search
    snapshot: PathBuf,
    /// Element kind to look for, e.g. `button` or `text_fields`
    kind: String,
    /// Attribute filters, `title=Send` or `title=/^Se/` for a pattern
    filters: Vec<String>,
    /// Report every match
    #[arg(long, conflicts_with = "one")]
    all: bool,
    /// Report the first match only
    #[arg(long)]
    one: bool,
    /// Print the whole tree before searching
    #[arg(long)]
    dump: bool,
    /// Settings file, layered over `axquery.toml`
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli, settings) {
        Ok(found) if found => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "search failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

// without --all or --one the kind's grammatical number decides
#[allow(deprecated)]
fn run(cli: &Cli, settings: Settings) -> Result<bool> {
    let tree = Arc::new(MemoryTree::open(&cli.snapshot)?);
    debug!(elements = tree.len(), snapshot = %cli.snapshot.display(), "snapshot loaded");
    let root = tree.root();
    let session = Arc::new(Session::new(tree).with_settings(settings));
    let root = Node::new(session, root);

    if cli.dump {
        print!("{}", diagnostics::text_subtree(&root)?);
    }

    let filters = parse_filters(&cli.filters)?;
    let cardinality = if cli.all {
        Cardinality::All
    } else if cli.one {
        Cardinality::One
    } else {
        Cardinality::infer(&cli.kind)
    };

    let found = root.search(&cli.kind, &filters, None, cardinality)?;
    if found.is_blank() {
        println!("{}", member::search_failure(&root, &cli.kind, &filters));
        return Ok(false);
    }
    match found {
        SearchResult::One(Some(node)) => println!("{node}"),
        SearchResult::One(None) => {}
        SearchResult::All(nodes) => {
            for node in nodes {
                println!("{node}");
            }
        }
    }
    Ok(true)
}

fn parse_filters(args: &[String]) -> Result<Filters> {
    let mut filters = Filters::new();
    for arg in args {
        let Some((key, raw)) = arg.split_once('=') else {
            return Err(AxError::Config(format!("filter '{arg}' is not of the form key=value")));
        };
        filters.insert(key, parse_expected(raw)?);
    }
    Ok(filters)
}

fn parse_expected(raw: &str) -> Result<Expected> {
    if let Some(pattern) = raw.strip_prefix('/').and_then(|r| r.strip_suffix('/')) {
        return Regex::new(pattern)
            .map(Expected::Pattern)
            .map_err(|e| AxError::Config(format!("bad pattern /{pattern}/: {e}")));
    }
    let expected = match raw {
        "true" => Expected::from(true),
        "false" => Expected::from(false),
        "nil" => Expected::from(axquery::value::Value::Nil),
        _ => match raw.parse::<i64>() {
            Ok(i) => Expected::from(i),
            Err(_) => Expected::from(raw),
        },
    };
    Ok(expected)
}
