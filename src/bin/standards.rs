//! Command-line front end for the standards catalog.
//!
//! Every invocation resolves `Config` from the environment, registers the
//! enabled sources, restores snapshots when `SNAPSHOT_DIR` is set, refreshes
//! the catalog and answers one request. Responses are JSON envelopes on stdout
//! (`{"status": "success", "data": ...}` or `{"status": "error", "error": ...}`);
//! logs go to stderr.

use anyhow::{Context, Result, anyhow, bail};
use devstandards::config::{SERVER_NAME, VERSION};
use devstandards::logging::init_logging;
use devstandards::sources::builtin_sources;
use devstandards::{
    Config, JsonSnapshotStore, KNOWN_SEVERITIES, Origin, QuerySpec, SearchRequest, Severity,
    StandardsAggregator, StandardsCatalog,
};
use serde_json::{Value, json};
use std::env;
use std::sync::Arc;
use tracing::{info, warn};

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

/// Returns false when the request was answered with an error envelope.
fn run() -> Result<bool> {
    let command = Command::parse()?;
    let config = Config::from_env()?;
    init_logging(&config);

    let aggregator = StandardsAggregator::new(builtin_sources(&config))
        .context("registering standards sources")?;
    let catalog = open_catalog(&config)?;

    let report = aggregator.refresh_all(&catalog);
    for failure in &report.failures {
        warn!(origin = %failure.origin, error = %failure.error, "source unavailable");
    }

    let response = match command {
        Command::Query(spec) => query(&aggregator, &catalog, &spec),
        Command::Search(request) => search(&aggregator, &request),
        Command::Get(id) => get(&catalog, &id),
        Command::Categories => categories(&aggregator, &catalog),
        Command::Sources => sources(&aggregator),
    };

    let ok = response.get("status").and_then(Value::as_str) == Some("success");
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(ok)
}

fn open_catalog(config: &Config) -> Result<StandardsCatalog> {
    let Some(dir) = &config.snapshot_dir else {
        return Ok(StandardsCatalog::new());
    };
    let store = JsonSnapshotStore::open(dir)
        .with_context(|| format!("opening snapshot directory {}", dir.display()))?;
    let catalog = StandardsCatalog::with_snapshot_store(Arc::new(store));
    match catalog.restore_from_snapshots() {
        Ok(restored) => info!(restored, dir = %dir.display(), "restored snapshots"),
        Err(err) => warn!(error = %err, "ignoring unreadable snapshots"),
    }
    Ok(catalog)
}

fn success(data: Value) -> Value {
    json!({ "status": "success", "data": data })
}

fn failure(message: String) -> Value {
    json!({ "status": "error", "error": message })
}

fn query(aggregator: &StandardsAggregator, catalog: &StandardsCatalog, spec: &QuerySpec) -> Value {
    let standards = catalog.query(spec);
    success(json!({
        "standards": standards,
        "metadata": {
            "total": standards.len(),
            "server": SERVER_NAME,
            "version": VERSION,
            "sources": aggregator.source_info(),
        }
    }))
}

fn search(aggregator: &StandardsAggregator, request: &SearchRequest) -> Value {
    let results = aggregator.search(request);
    let scope = |values: &[String]| {
        if values.is_empty() {
            json!("all")
        } else {
            json!(values)
        }
    };
    success(json!({
        "query": request.query,
        "results": results,
        "metadata": {
            "count": results.len(),
            "categories_searched": scope(&request.categories),
            "tags_searched": scope(&request.tags),
        }
    }))
}

fn get(catalog: &StandardsCatalog, id: &str) -> Value {
    match catalog.require(id) {
        Ok(standard) => success(json!({ "standard": standard })),
        Err(err) => failure(err.to_string()),
    }
}

fn categories(aggregator: &StandardsAggregator, catalog: &StandardsCatalog) -> Value {
    let categories = aggregator.categories(catalog);
    success(json!({
        "categories": categories,
        "metadata": {
            "total_categories": categories.len(),
            "total_standards": catalog.len(),
        }
    }))
}

fn sources(aggregator: &StandardsAggregator) -> Value {
    success(json!({ "sources": aggregator.source_info() }))
}

enum Command {
    Query(QuerySpec),
    Search(SearchRequest),
    Get(String),
    Categories,
    Sources,
}

impl Command {
    fn parse() -> Result<Self> {
        let mut args = Vec::new();
        for arg in env::args_os().skip(1) {
            args.push(
                arg.into_string()
                    .map_err(|_| anyhow!("invalid UTF-8 in argument"))?,
            );
        }
        Self::parse_from(args)
    }

    fn parse_from(args: Vec<String>) -> Result<Self> {
        let mut args = args.into_iter();
        let Some(subcommand) = args.next() else {
            usage(2);
        };

        match subcommand.as_str() {
            "query" => parse_query(args).map(Command::Query),
            "search" => parse_search(args).map(Command::Search),
            "get" => {
                let id = args.next().ok_or_else(|| anyhow!("get requires an ID"))?;
                if let Some(extra) = args.next() {
                    bail!("unexpected argument: {extra}");
                }
                Ok(Command::Get(id))
            }
            "categories" => no_more_args(args).map(|()| Command::Categories),
            "sources" => no_more_args(args).map(|()| Command::Sources),
            "--help" | "-h" | "help" => usage(0),
            other => bail!("unknown command: {other}"),
        }
    }
}

fn parse_query(mut args: impl Iterator<Item = String>) -> Result<QuerySpec> {
    let mut spec = QuerySpec::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--category" => spec.category = Some(next_value("--category", &mut args)?),
            "--subcategory" => spec.subcategory = Some(next_value("--subcategory", &mut args)?),
            "--severity" => spec.severity = Some(next_severity(&mut args)?),
            "--origin" => spec.origin = Some(Origin(next_value("--origin", &mut args)?)),
            "--search" => spec.search = Some(next_value("--search", &mut args)?),
            "--limit" => spec.limit = next_count("--limit", &mut args)?,
            "--offset" => spec.offset = next_count("--offset", &mut args)?,
            "--help" | "-h" => usage(0),
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(spec)
}

fn parse_search(mut args: impl Iterator<Item = String>) -> Result<SearchRequest> {
    let mut query: Option<String> = None;
    let mut request = SearchRequest::new("");
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--category" => request.categories.push(next_value("--category", &mut args)?),
            "--tag" => request.tags.push(next_value("--tag", &mut args)?),
            "--limit" => request.limit = next_count("--limit", &mut args)?,
            "--help" | "-h" => usage(0),
            flag if flag.starts_with("--") => bail!("unknown argument: {flag}"),
            _ if query.is_some() => bail!("search takes a single QUERY argument"),
            _ => query = Some(arg),
        }
    }
    request.query = query.ok_or_else(|| anyhow!("search requires a QUERY"))?;
    Ok(request)
}

fn next_value(flag: &str, args: &mut impl Iterator<Item = String>) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} requires a value"))
}

fn next_severity(args: &mut impl Iterator<Item = String>) -> Result<Severity> {
    let raw = next_value("--severity", args)?;
    let severity = Severity::parse(&raw);
    if !severity.is_known() {
        let allowed = KNOWN_SEVERITIES
            .iter()
            .map(Severity::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        bail!("--severity must be one of {allowed}, got '{raw}'");
    }
    Ok(severity)
}

fn next_count(flag: &str, args: &mut impl Iterator<Item = String>) -> Result<usize> {
    let raw = next_value(flag, args)?;
    raw.parse()
        .with_context(|| format!("{flag} expects a non-negative integer, got '{raw}'"))
}

fn no_more_args(mut args: impl Iterator<Item = String>) -> Result<()> {
    match args.next() {
        Some(extra) => bail!("unexpected argument: {extra}"),
        None => Ok(()),
    }
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: standards <command> [options]\n\nCommands:\n  query [--category C] [--subcategory S] [--severity L] [--origin O]\n        [--search T] [--limit N] [--offset N]\n                            Filtered, severity-ordered catalog listing.\n  search QUERY [--category C]... [--tag T]... [--limit N]\n                            Free-text search across sources.\n  get ID                    Fetch one standard.\n  categories                Categories with record counts.\n  sources                   Registered sources.\n\nEnvironment:\n  DEVSTANDARDS_PROJECT_ROOT, DATA_DIR, SNAPSHOT_DIR, PLUGINS_ENABLED,\n  LOG_LEVEL, LOG_FORMAT (text|json), RUST_LOG"
    );
    std::process::exit(code);
}
