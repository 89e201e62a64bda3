use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use report::{ReportConfig, ReportPipeline, RunOptions};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Build an Uwazi talent report (PDF) from an assessment workbook.
#[derive(Debug, Parser)]
#[command(name = "uwazi-report", version, about)]
struct Cli {
    /// Assessment workbook (.xlsx, .xls, .ods).
    workbook: PathBuf,

    /// Directory for the generated PDF. Defaults to the platform data directory.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// TOML file overriding branding, page and chart settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write the display payload (metrics, tables, charts as data URIs).
    #[arg(long, value_name = "FILE")]
    summary_json: Option<PathBuf>,

    /// Issue date printed under the title, `YYYY-MM-DD`. Defaults to today (UTC).
    #[arg(long, value_parser = parse_date)]
    issued_on: Option<Date>,

    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing(cli.quiet, cli.verbose) {
        eprintln!("uwazi-report: {error:#}");
        std::process::exit(1);
    }

    match run(&cli) {
        Ok(path) => {
            if !cli.quiet {
                println!("{}", path.display());
            }
        }
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "report generation failed");
            eprintln!("{}", report::core::error::USER_FAILURE_MESSAGE);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<PathBuf> {
    let config = match &cli.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    let pipeline = ReportPipeline::new(config).context("invalid report configuration")?;

    let bytes = fs::read(&cli.workbook)
        .with_context(|| format!("failed to read workbook {}", cli.workbook.display()))?;

    let options = RunOptions {
        issued_on: Some(cli.issued_on.unwrap_or_else(|| OffsetDateTime::now_utc().date())),
        ..RunOptions::default()
    };
    let output = pipeline.synthesize_with(&bytes, &options)?;

    let dir = match &cli.out {
        Some(dir) => dir.clone(),
        None => default_output_dir()?,
    };
    let path = write_file(&dir, &output.filename, &output.document.bytes)?;
    tracing::info!(path = %path.display(), pages = output.document.page_count, "report written");

    if let Some(summary_path) = &cli.summary_json {
        let json = serde_json::to_vec_pretty(&output.view()).context("failed to serialise report summary")?;
        fs::write(summary_path, json)
            .with_context(|| format!("failed to write {}", summary_path.display()))?;
    }

    Ok(path)
}

fn default_output_dir() -> anyhow::Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("africa", "Uwazi", "Uwazi")
        .context("unable to determine report directory")?;
    Ok(dirs.data_dir().join("reports"))
}

fn write_file(dir: &Path, filename: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(filename);
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn parse_date(raw: &str) -> Result<Date, String> {
    Date::parse(raw, format_description!("[year]-[month]-[day]")).map_err(|err| err.to_string())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("UWAZI_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
