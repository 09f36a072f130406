//! Stockscope CLI — look up companies, show daily history, compare performance.
//!
//! Usage:
//! - `stockscope "Apple Inc"` — detail and candlestick views for one company
//! - `stockscope Apple Microsoft` — normalized comparison of several companies
//! - `stockscope` — prompt for comma-separated company names
//! - `stockscope --cache-status AAPL MSFT` — report cache entries by ticker
//! - `stockscope --clear-cache AAPL` — remove cache entries by ticker

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use stockscope_core::config::AppConfig;
use stockscope_core::data::{AlphaVantageClient, CacheStore, SymbolResolver, TimeSeriesFetcher};
use stockscope_core::export::{ExportFormat, Exporter};
use stockscope_core::render::{TextRenderer, DEFAULT_ROWS};
use stockscope_core::{deliver, Pipeline};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "stockscope",
    version,
    about = "Stockscope — daily stock history, moving averages and comparisons"
)]
#[command(group(ArgGroup::new("cache_action").args(["cache_status", "clear_cache"])))]
struct Cli {
    /// Company names (or ticker symbols with --cache-status / --clear-cache).
    /// One name shows details; two or more are compared.
    companies: Vec<String>,

    /// Export the single-company result to the export directory.
    #[arg(long, value_enum)]
    export: Option<ExportArg>,

    /// Path to a TOML config file. Defaults to <config dir>/stockscope/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cache directory (overrides config).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Export directory (overrides config).
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// API key (overrides config and environment).
    #[arg(long)]
    api_key: Option<String>,

    /// Ignore cached data and fetch again.
    #[arg(long, default_value_t = false)]
    refresh: bool,

    /// Number of most recent rows shown per view.
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    rows: usize,

    /// Debug-level logging (RUST_LOG still wins when set).
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Report cache entries for the given ticker symbols and exit.
    #[arg(long, default_value_t = false)]
    cache_status: bool,

    /// Remove cache entries for the given ticker symbols and exit.
    #[arg(long, default_value_t = false)]
    clear_cache: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportArg {
    Csv,
    Excel,
}

impl From<ExportArg> for ExportFormat {
    fn from(arg: ExportArg) -> Self {
        match arg {
            ExportArg::Csv => ExportFormat::Csv,
            ExportArg::Excel => ExportFormat::Excel,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    debug!(
        cache_dir = %config.cache_dir.display(),
        export_dir = %config.export_dir.display(),
        "configuration loaded"
    );
    let cache = CacheStore::with_freshness(&config.cache_dir, config.freshness());

    if cli.cache_status {
        return run_cache_status(&cache, &cli.companies);
    }
    if cli.clear_cache {
        return run_cache_clear(&cache, &cli.companies);
    }

    let companies = if cli.companies.is_empty() {
        let stdin = io::stdin();
        prompt_companies(stdin.lock(), io::stderr())?
    } else {
        cli.companies.clone()
    };

    let client = AlphaVantageClient::new(
        config.base_url.clone(),
        config.effective_api_key(),
        config.timeout(),
    )
    .context("failed to set up the HTTP client")?;

    let pipeline = Pipeline::new(
        SymbolResolver::new(&client),
        TimeSeriesFetcher::new(&client, cache).force_refresh(cli.refresh),
        config.ma_windows.clone(),
    );
    let outcome = pipeline.run(&companies)?;

    let exporter = Exporter::new(&config.export_dir);
    let mut renderer = TextRenderer::stdout().with_rows(cli.rows);
    let export = cli.export.map(|arg| (&exporter, ExportFormat::from(arg)));

    if let Some(path) = deliver(&outcome, &mut renderer, export)? {
        println!("Data exported to {}", path.display());
    }

    Ok(())
}

/// Log to stderr so tables on stdout stay clean.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,stockscope={level},stockscope_core={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// File (explicit or default location) → environment → command-line flags.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => match default_config_path() {
            Some(path) => AppConfig::from_file_or_default(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => AppConfig::default(),
        },
    }
    .with_env_overrides();

    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(dir) = &cli.export_dir {
        config.export_dir = dir.clone();
    }
    if let Some(key) = &cli.api_key {
        config.api_key = Some(key.clone());
    }
    config.validate()?;
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("stockscope").join("config.toml"))
}

/// Ask for company names on one line, comma separated.
fn prompt_companies(mut input: impl BufRead, mut prompt: impl Write) -> Result<Vec<String>> {
    write!(
        prompt,
        "Enter company names (comma-separated for comparison): "
    )?;
    prompt.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let companies = split_companies(&line);
    if companies.is_empty() {
        bail!("no company names provided");
    }
    Ok(companies)
}

fn split_companies(line: &str) -> Vec<String> {
    line.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

fn run_cache_status(cache: &CacheStore, symbols: &[String]) -> Result<()> {
    if symbols.is_empty() {
        bail!("--cache-status needs at least one ticker symbol");
    }
    print_cache_dir(cache.cache_dir());

    let now = chrono::Utc::now();
    println!(
        "{:<8} {:<8} {:<6} {:>8}  {}",
        "Symbol", "Cached", "Fresh", "Rows", "Last updated"
    );
    println!("{}", "-".repeat(58));
    for symbol in symbols {
        let status = cache.status(symbol, now);
        println!(
            "{:<8} {:<8} {:<6} {:>8}  {}",
            status.symbol,
            if status.cached { "yes" } else { "no" },
            if status.fresh { "yes" } else { "no" },
            status
                .row_count
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
            status
                .last_updated
                .map_or_else(|| "-".to_string(), |t| t.to_rfc3339()),
        );
    }
    Ok(())
}

fn run_cache_clear(cache: &CacheStore, symbols: &[String]) -> Result<()> {
    if symbols.is_empty() {
        bail!("--clear-cache needs at least one ticker symbol");
    }
    print_cache_dir(cache.cache_dir());

    for symbol in symbols {
        cache
            .clear(symbol)
            .with_context(|| format!("failed to clear cache entry for {symbol}"))?;
        println!("Removed {symbol}");
    }
    Ok(())
}

fn print_cache_dir(dir: &Path) {
    println!("Cache: {}", dir.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_single_company_with_export() {
        let cli = Cli::try_parse_from(["stockscope", "Apple Inc", "--export", "excel"]).unwrap();
        assert_eq!(cli.companies, ["Apple Inc"]);
        assert_eq!(cli.export, Some(ExportArg::Excel));
        assert_eq!(ExportFormat::from(ExportArg::Excel), ExportFormat::Excel);
        assert_eq!(cli.rows, DEFAULT_ROWS);
        assert!(!cli.refresh);
    }

    #[test]
    fn parses_comparison_and_overrides() {
        let cli = Cli::try_parse_from([
            "stockscope",
            "Apple",
            "Microsoft",
            "--cache-dir",
            "/tmp/cache",
            "--api-key",
            "KEY",
            "--refresh",
            "--rows",
            "30",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.companies, ["Apple", "Microsoft"]);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/cache")));
        assert_eq!(cli.api_key.as_deref(), Some("KEY"));
        assert!(cli.refresh);
        assert_eq!(cli.rows, 30);
        assert!(cli.verbose);
    }

    #[test]
    fn rejects_unknown_export_format() {
        assert!(Cli::try_parse_from(["stockscope", "Apple", "--export", "pdf"]).is_err());
    }

    #[test]
    fn cache_actions_are_exclusive() {
        assert!(
            Cli::try_parse_from(["stockscope", "AAPL", "--cache-status", "--clear-cache"]).is_err()
        );
    }

    #[test]
    fn prompt_splits_on_commas() {
        let mut shown = Vec::new();
        let names = prompt_companies(&b" Apple Inc , ,Microsoft\n"[..], &mut shown).unwrap();
        assert_eq!(names, ["Apple Inc", "Microsoft"]);
        assert!(String::from_utf8(shown).unwrap().starts_with("Enter company names"));
    }

    #[test]
    fn blank_prompt_is_error() {
        let err = prompt_companies(&b" , \n"[..], io::sink()).unwrap_err();
        assert_eq!(err.to_string(), "no company names provided");
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "cache_dir = \"from-file\"\napi_key = \"FILEKEY\"\n").unwrap();

        let cli = Cli::try_parse_from([
            "stockscope",
            "--config",
            path.to_str().unwrap(),
            "--export-dir",
            "out",
            "--api-key",
            "FLAGKEY",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();

        assert_eq!(config.cache_dir, PathBuf::from("from-file"));
        assert_eq!(config.export_dir, PathBuf::from("out"));
        assert_eq!(config.effective_api_key(), "FLAGKEY");
    }

    #[test]
    fn clear_cache_refuses_paths_outside_cache_dir() {
        let root = tempfile::tempdir().unwrap();
        let outside = root.path().join("x_data.json");
        std::fs::write(&outside, b"{}").unwrap();
        let cache = CacheStore::new(root.path().join("cache"));

        assert!(run_cache_clear(&cache, &["../x".to_string()]).is_err());
        assert!(outside.exists());
    }

    #[test]
    fn missing_explicit_config_is_fatal() {
        let cli = Cli::try_parse_from(["stockscope", "--config", "/nonexistent/stockscope.toml"])
            .unwrap();
        assert!(load_config(&cli).is_err());
    }
}
