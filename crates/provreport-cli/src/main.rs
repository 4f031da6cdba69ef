//! Provreport CLI
//!
//! Generates W3C PROV reports for data products in a registry snapshot:
//! - `report`: build the document for one data product and write it as
//!   PROV-JSON, PROV-XML, PROV-N, JPEG or SVG
//! - `summary`: print element and relation counts for a report
//! - `formats`: list the supported formats and their content types

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use provreport_builder::{generate_prov_document_for_id, ReportConfig};
use provreport_document::{serialize_prov_document, ProvDocument, RenderOptions, ReportFormat};
use provreport_records::{RecordId, SnapshotRegistry};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod summary;

use summary::DocumentSummary;

const ENV_BASE_URL: &str = "PROVREPORT_BASE_URL";
const ENV_DOT_BIN: &str = "PROVREPORT_DOT_BIN";

#[derive(Parser)]
#[command(name = "provreport")]
#[command(author, version, about = "Provenance reports for registry data products")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a provenance report for one data product.
    Report(ReportArgs),

    /// Print node and relation counts of a generated report.
    Summary(SourceArgs),

    /// List supported report formats.
    Formats,
}

#[derive(Args)]
struct SourceArgs {
    /// Registry snapshot (JSON).
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Data product id.
    #[arg(short = 'p', long)]
    data_product: RecordId,

    /// Default namespace of the report (env: PROVREPORT_BASE_URL).
    #[arg(long)]
    base_url: Option<String>,

    /// Runner name used when the user directory has none.
    #[arg(long)]
    unknown_user_name: Option<String>,
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output format: json|xml|provn|jpg|svg. Unknown values fall back to json.
    #[arg(short, long)]
    format: Option<String>,

    /// Accept header to negotiate the format from when `--format` is absent.
    #[arg(long)]
    accept: Option<String>,

    /// Leave element attributes out of rendered images.
    #[arg(long)]
    no_attributes: bool,

    /// Graphviz `dot` executable for image formats (env: PROVREPORT_DOT_BIN).
    #[arg(long)]
    dot_bin: Option<PathBuf>,

    /// Output path (defaults to stdout).
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report(args) => cmd_report(&args),
        Commands::Summary(args) => cmd_summary(&args),
        Commands::Formats => {
            cmd_formats();
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn report_config(args: &SourceArgs) -> ReportConfig {
    let mut config = ReportConfig::default();
    if let Some(url) = args.base_url.clone().or_else(|| env::var(ENV_BASE_URL).ok()) {
        config = config.with_base_url(url);
    }
    if let Some(name) = &args.unknown_user_name {
        config.unknown_user_name = name.clone();
    }
    config
}

fn render_options(args: &ReportArgs) -> RenderOptions {
    let mut options = RenderOptions {
        show_attributes: !args.no_attributes,
        ..RenderOptions::default()
    };
    if let Some(p) = args.dot_bin.clone().or_else(|| env::var_os(ENV_DOT_BIN).map(PathBuf::from)) {
        options.dot_program = p;
    }
    options
}

fn load_document(args: &SourceArgs) -> Result<ProvDocument> {
    let registry = SnapshotRegistry::from_path(&args.snapshot)
        .with_context(|| format!("loading snapshot {}", args.snapshot.display()))?;
    let config = report_config(args);
    let doc = generate_prov_document_for_id(&registry, args.data_product, &config)
        .with_context(|| format!("building report for data product {}", args.data_product))?;
    Ok(doc)
}

fn cmd_report(args: &ReportArgs) -> Result<()> {
    let doc = load_document(&args.source)?;
    let format = ReportFormat::negotiate(args.format.as_deref(), args.accept.as_deref());
    if let Some(requested) = &args.format {
        if ReportFormat::from_name(requested).is_none() {
            tracing::warn!(requested = %requested, using = format.as_str(), "unrecognised format");
        }
    }

    let report = serialize_prov_document(&doc, format, &render_options(args))
        .with_context(|| format!("rendering {} report", format.as_str()))?;

    tracing::info!(
        data_product = args.source.data_product,
        format = format.as_str(),
        bytes = report.body.len(),
        "report generated"
    );

    match &args.out {
        Some(path) => {
            write_file(path, &report.body)?;
            eprintln!(
                "{} {} ({})",
                "wrote".green().bold(),
                path.display().to_string().bold(),
                report.content_type
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&report.body)?;
            if !format.is_image() {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
        }
    }
    Ok(())
}

fn write_file(path: &Path, body: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))
}

fn cmd_summary(args: &SourceArgs) -> Result<()> {
    let doc = load_document(args)?;
    let title = format!("data product {}", args.data_product);
    print!("{}", DocumentSummary::of(&doc).render(&title));
    Ok(())
}

fn cmd_formats() {
    for format in ReportFormat::ALL {
        let default = if format == ReportFormat::default() {
            " (default)".dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "{} {}{}",
            format!("{:<6}", format.as_str()).bold(),
            format.content_type(),
            default
        );
    }
}
