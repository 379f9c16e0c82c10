//! PDF Merger CLI - Command line tool for merging and reordering PDF pages.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_merger_core::{AppConfig, PdfMerger, pdf};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pdf-merge")]
#[command(author, version, about = "Merge PDF documents, page by page", long_about = None)]
struct Args {
    /// Input PDF files, in load order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output PDF file (default: <prefix>_<timestamp>.pdf in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Page order over the flattened page list, 1-based (e.g. "3,1,4-6").
    /// Pages may repeat; unlisted pages are dropped. Default keeps load order.
    #[arg(long)]
    order: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Parse a 1-based page-order spec into 0-based indices.
///
/// Unlike a page *filter*, the spec is an ordering: entries keep their
/// written order and may repeat. Out-of-range entries are an error rather
/// than being silently dropped.
fn parse_order(spec: &str, total: usize) -> Result<Vec<usize>> {
    let mut result = Vec::new();

    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((start, end)) = part.split_once('-') {
            let start: usize = start.trim().parse().context("Invalid page range start")?;
            let end: usize = end.trim().parse().context("Invalid page range end")?;
            if start == 0 || end == 0 || start > end {
                anyhow::bail!("Invalid page range: {part}");
            }
            for page in start..=end {
                if page > total {
                    anyhow::bail!("Page {page} out of range (document set has {total} pages)");
                }
                result.push(page - 1); // Convert to 0-indexed
            }
        } else {
            let page: usize = part.parse().context("Invalid page number")?;
            if page == 0 || page > total {
                anyhow::bail!("Page {page} out of range (document set has {total} pages)");
            }
            result.push(page - 1); // Convert to 0-indexed
        }
    }

    if result.is_empty() {
        anyhow::bail!("Empty page order spec");
    }
    Ok(result)
}

fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    let mut merger = PdfMerger::new(config);

    // Setup progress bar over input files
    #[allow(clippy::cast_possible_truncation)]
    let pb = ProgressBar::new(args.inputs.len() as u64);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    for path in &args.inputs {
        pb.set_message(path.display().to_string());

        let bytes = std::fs::read(path)
            .context(format!("Failed to read input: {}", path.display()))?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        merger
            .add_source(name, bytes)
            .context(format!("Failed to load PDF: {}", path.display()))?;
        pb.inc(1);
    }
    pb.finish_with_message("Inputs loaded");

    let total_pages = merger.sequence().len();
    info!(
        "Loaded {} documents ({} pages)",
        merger.registry().len(),
        total_pages
    );

    // Assemble, in spec order when one was given
    let assembled = if let Some(ref spec) = args.order {
        let order = parse_order(spec, total_pages)?;
        info!("Assembling {} pages in custom order", order.len());

        let slots: Vec<_> = order
            .iter()
            .filter_map(|&i| merger.sequence().get(i).cloned())
            .collect();
        pdf::assemble(&slots, merger.registry()).context("Failed to assemble output")?
    } else {
        merger.assemble().context("Failed to assemble output")?
    };

    for skip in &assembled.skipped {
        tracing::warn!(
            "Skipped page {} of source {}: {}",
            skip.page_index + 1,
            skip.source_id,
            skip.reason
        );
    }

    // Determine output path
    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(merger.output_filename()));

    // Save output
    std::fs::write(&output_path, &assembled.bytes)
        .context(format!("Failed to write output: {}", output_path.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Merged PDF saved to: {}", output_path.display());
    }

    Ok(())
}
