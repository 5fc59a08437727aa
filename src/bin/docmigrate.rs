//! CLI binary for docmigrate.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `MigrationConfig`, wires up the HTTP source and a directory target, and
//! prints per-document results.

use anyhow::{Context, Result};
use clap::Parser;
use docmigrate::{
    migrate_documents, run_migration, DocumentId, HttpSource, LocalDirTarget,
    MigrationConfig, MigrationFailure, MigrationProgressCallback, MigrationRun,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI definition ───────────────────────────────────────────────────────────

/// Migrate scanned document archives into chain-of-custody packages.
#[derive(Debug, Parser)]
#[command(name = "docmigrate", version, about)]
struct Cli {
    /// Base URL of the source inventory service.
    #[arg(long, env = "DOCMIGRATE_SOURCE_URL")]
    source_url: String,

    /// Bearer token for the source service.
    #[arg(long, env = "DOCMIGRATE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Migrate only these document ids (comma-separated) instead of the
    /// full pending inventory.
    #[arg(long, value_delimiter = ',')]
    ids: Vec<String>,

    /// Local directory standing in for the remote target root.
    #[arg(long, default_value = "./delivered")]
    target_dir: std::path::PathBuf,

    /// Remote directory under which per-document directories are created.
    #[arg(long, default_value = "/incoming")]
    remote_root: String,

    /// Number of documents migrated concurrently.
    #[arg(short = 'j', long, default_value_t = 4)]
    concurrency: usize,

    /// Source fetch timeout in seconds.
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Verbose logging (-v: info, -vv: debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ── indicatif progress callback ──────────────────────────────────────────────

/// Terminal progress: one bar for the run, a log line per document.
/// Documents complete out of order under concurrency; the bar only counts.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{bar:40.green/238}] {pos:>3}/{len} documents  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Arc::new(Self { bar })
    }
}

impl MigrationProgressCallback for CliProgress {
    fn on_run_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
    }

    fn on_document_complete(&self, doc_id: &DocumentId, page_count: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            doc_id,
            dim(&format!("{page_count} pages"))
        ));
        self.bar.inc(1);
    }

    fn on_document_failed(&self, doc_id: &DocumentId, failure: &MigrationFailure) {
        self.bar
            .println(format!("  {} {}  {}", red("✗"), doc_id, red(&failure.to_string())));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _total: usize, _succeeded: usize) {
        self.bar.finish_and_clear();
    }
}

// ── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let source = Arc::new(
        HttpSource::new(&cli.source_url, cli.token.clone(), cli.timeout)
            .context("failed to construct HTTP source")?,
    );
    let target = Arc::new(LocalDirTarget::new(&cli.target_dir));

    let config = MigrationConfig::builder()
        .concurrency(cli.concurrency)
        .remote_root(&cli.remote_root)
        .fetch_timeout_secs(cli.timeout)
        .progress_callback(CliProgress::new())
        .build()
        .context("invalid configuration")?;

    let run = if cli.ids.is_empty() {
        run_migration(source, target, &config)
            .await
            .context("failed to list pending documents")?
    } else {
        let ids = cli
            .ids
            .iter()
            .map(|s| DocumentId::from(s.as_str()))
            .collect();
        migrate_documents(ids, source, target, &config).await
    };

    print_summary(&run);

    if run.stats.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "docmigrate=warn",
        1 => "docmigrate=info",
        _ => "docmigrate=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(run: &MigrationRun) {
    let s = &run.stats;
    if s.failed == 0 {
        eprintln!(
            "{} {} documents migrated ({} pages) in {:.1}s",
            green("✔"),
            bold(&s.succeeded.to_string()),
            s.total_pages,
            s.duration_ms as f64 / 1000.0
        );
    } else {
        eprintln!(
            "{} {}/{} documents migrated, {} failed in {:.1}s",
            red("✘"),
            s.succeeded,
            s.total,
            bold(&s.failed.to_string()),
            s.duration_ms as f64 / 1000.0
        );
        for (id, failure) in run.failures() {
            eprintln!("    {} {}", dim(&format!("{id}:")), failure);
        }
    }
}
