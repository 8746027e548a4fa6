//! ABRICATE Sequences to JSON Database Converter
//!
//! Converts an ABRICATE `sequences` FASTA (headers of the form
//! `>DB~~~GENE~~~ACCESSION~~~RESISTANCE description`) into the JSON
//! database read by `abricate`.
//!
//! Usage:
//!   cargo run --release --bin abricate_makedb -- \
//!     -i db/ncbi/sequences \
//!     -n ncbi \
//!     -o db/ncbi.json.gz

use abricate::database::Database;
use anyhow::{Context, Result};
use clap::Parser;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "abricate_makedb")]
#[command(version)]
#[command(about = "Build an abricate JSON database from an ABRICATE sequences FASTA")]
struct Args {
    /// ABRICATE `sequences` FASTA, optionally gzipped
    #[arg(short = 'i', long, value_name = "FILE")]
    input: PathBuf,

    /// Database name (defaults to the input's parent directory name)
    #[arg(short = 'n', long, value_name = "NAME")]
    name: Option<String>,

    /// Output JSON file; `.gz` enables compression
    #[arg(short = 'o', long, value_name = "FILE")]
    output: PathBuf,

    #[arg(short = 'v', long)]
    verbose: bool,
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default = if args.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();

    let start_time = Instant::now();

    let name = match &args.name {
        Some(n) => n.clone(),
        None => args
            .input
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Cannot infer database name from {}; pass --name", args.input.display()))?
            .to_string(),
    };

    let database = Database::from_fasta(&name, open_input(&args.input)?)
        .with_context(|| format!("Failed to import {}", args.input.display()))?;
    tracing::info!(database = %name, genes = database.len(), "imported sequences");

    database
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    tracing::info!(
        output = %args.output.display(),
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "database written"
    );
    Ok(())
}
