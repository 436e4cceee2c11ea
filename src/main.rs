use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use imgbudget::{BatchItem, BatchOrchestrator, Descriptor, EngineConfig, ImageOutput, PolicyKind};
use tracing_subscriber::EnvFilter;

/// Recompress images until each fits a byte budget.
#[derive(Parser, Debug)]
#[command(name = "imgbudget", version)]
#[command(about = "Recompress images to fit a byte budget")]
#[command(long_about = "Recompress images to fit a byte budget.
Each input is re-encoded as JPEG at decreasing quality, and then decreasing dimensions,
until it fits the budget of the selected policy. Inputs can be file paths, http(s) URLs
or data:image/ URIs.")]
struct Args {
    /// Files, URLs or data URIs to compress
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Compression policy (overrides the config file)
    #[arg(short, long, value_enum)]
    policy: Option<PolicyKind>,

    /// Directory for compressed outputs
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Total timeout for each remote fetch, in milliseconds (overrides the config file)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print a JSON report instead of one line per input
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("imgbudget=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.fetch.timeout_ms = timeout_ms;
    }

    let descriptors = args
        .inputs
        .iter()
        .map(|input| read_input(input))
        .collect::<Result<Vec<_>>>()?;

    let mut orchestrator = BatchOrchestrator::new(&config)?;
    let batch = orchestrator.compress_all(&descriptors);

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        for (index, (input, item)) in args.inputs.iter().zip(&batch.items).enumerate() {
            if let Some(path) = write_output(dir, index, input, item)? {
                tracing::debug!(path = %path.display(), "wrote output");
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
    } else {
        for (input, item) in args.inputs.iter().zip(&batch.items) {
            println!("{}", summary_line(input, item));
        }
        println!(
            "{} processed, {} failed, {} skipped: {} -> {} bytes",
            batch.processed_count,
            batch.failed_count,
            batch.skipped_count,
            batch.total_original_bytes,
            batch.total_final_bytes
        );
    }

    Ok(())
}

/// URLs and data URIs are classified as text; anything else must be a readable file.
fn read_input(input: &str) -> Result<Descriptor> {
    match Descriptor::parse(input) {
        Descriptor::Image(source) => Ok(Descriptor::Image(source)),
        Descriptor::Unrecognized(_) => {
            let bytes = std::fs::read(input).with_context(|| format!("reading {input}"))?;
            Ok(Descriptor::bytes(bytes))
        }
    }
}

fn write_output(dir: &Path, index: usize, input: &str, item: &BatchItem) -> Result<Option<PathBuf>> {
    if !item.outcome.success {
        return Ok(None);
    }
    let Some(bytes) = item.output.image_bytes() else {
        return Ok(None);
    };
    // short-circuited inputs keep their original encoding
    let extension = image::guess_format(&bytes)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("img");
    let path = dir.join(format!("{}.{extension}", output_stem(index, input)));
    std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(Some(path))
}

/// File inputs keep their stem; URLs and data URIs are numbered by position.
fn output_stem(index: usize, input: &str) -> String {
    match Descriptor::parse(input) {
        Descriptor::Unrecognized(_) => Path::new(input)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("image-{index}")),
        Descriptor::Image(_) => format!("image-{index}"),
    }
}

fn summary_line(input: &str, item: &BatchItem) -> String {
    let label = if input.starts_with("data:") {
        "<data uri>"
    } else {
        input
    };
    let outcome = &item.outcome;
    if !outcome.success {
        return format!(
            "{label}: failed ({})",
            outcome.error_detail.as_deref().unwrap_or("unknown error")
        );
    }
    if matches!(item.output, ImageOutput::Text(_)) {
        return format!("{label}: skipped (not an image)");
    }
    format!(
        "{label}: {} -> {} bytes ({:.1}% saved, {} attempts{})",
        outcome.original_size_bytes,
        outcome.final_size_bytes,
        outcome.compression_ratio,
        outcome.attempts_used,
        if outcome.target_achieved {
            ""
        } else {
            ", over budget"
        }
    )
}
