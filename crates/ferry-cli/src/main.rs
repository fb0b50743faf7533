mod io;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ferry_client::ReqwestFetcher;
use ferry_core::{ResolverConfig, ResourceResolver, StaticDirectory, TracingProgressReporter};

use crate::io::{Format, read_batch, write_batch};

#[derive(Parser)]
#[command(name = "ferry", version, about = "Download the media referenced by an import batch")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every referenced resource and rewrite fields to local file names
    Resolve {
        /// Input batch (CSV with a header row, or a JSON array of objects)
        input: PathBuf,

        /// Media base directory; files land in its `import/` subdirectory
        #[arg(short, long, env = "FERRY_MEDIA_DIR")]
        media_dir: PathBuf,

        /// Where to write the rewritten batch (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Input/output format (guessed from the input extension if omitted)
        #[arg(long, value_enum)]
        format: Option<Format>,

        /// Maximum fetches in flight (overrides FERRY_CONCURRENCY)
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Single-URL field to resolve; repeat to list several (replaces defaults)
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Delimited multi-URL field to resolve; repeat to list several (replaces defaults)
        #[arg(long = "list-field")]
        list_fields: Vec<String>,

        /// Re-download files that already exist locally
        #[arg(long, default_value_t = false)]
        overwrite_existing: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ferry=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            input,
            media_dir,
            output,
            format,
            concurrency,
            fields,
            list_fields,
            overwrite_existing,
        } => {
            let config = build_config(concurrency, fields, list_fields, overwrite_existing)?;
            let format = format.unwrap_or_else(|| Format::from_path(&input));
            cmd_resolve(&input, &media_dir, output.as_deref(), format, config).await?;
        }
    }

    Ok(())
}

/// Layer CLI flags over the environment-derived config.
fn build_config(
    concurrency: Option<usize>,
    fields: Vec<String>,
    list_fields: Vec<String>,
    overwrite_existing: bool,
) -> Result<ResolverConfig> {
    let mut config = ResolverConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;

    if let Some(limit) = concurrency {
        config = config.with_concurrency_limit(limit);
    }
    if !fields.is_empty() {
        config = config.with_scalar_fields(fields);
    }
    if !list_fields.is_empty() {
        config = config.with_list_fields(list_fields);
    }
    if overwrite_existing {
        config = config.with_overwrite_existing(true);
    }

    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}

async fn cmd_resolve(
    input: &Path,
    media_dir: &Path,
    output: Option<&Path>,
    format: Format,
    config: ResolverConfig,
) -> Result<()> {
    // 1. Load the batch
    let file = File::open(input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))?;
    let mut batch = read_batch(BufReader::new(file), format)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    tracing::info!(
        "Loaded {} records from {}",
        batch.len(),
        input.display()
    );

    // 2. Resolve resources
    let fetcher = ReqwestFetcher::new().context("Failed to create HTTP client")?;
    let resolver = ResourceResolver::new(
        fetcher,
        StaticDirectory::new(media_dir),
        TracingProgressReporter,
        config,
    );
    let stats = resolver
        .process(batch.records_mut())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if stats.failures > 0 {
        tracing::warn!(failures = stats.failures, "Some resources could not be downloaded");
    }

    // 3. Write the rewritten batch
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            write_batch(&batch, BufWriter::new(file))?;
            tracing::info!("Wrote {} records to {}", batch.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_batch(&batch, stdout.lock())?;
        }
    }

    Ok(())
}
