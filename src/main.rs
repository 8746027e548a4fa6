use abricate::alignment::Aligner;
use abricate::blastn::BlastN;
use abricate::database::Database;
use abricate::finder::ResistanceGeneFinder;
use abricate::minimap2::Minimap2;
use abricate::report::{write_header, write_rows, ReportRow};
use abricate::seqio::{FastaReader, FastaRecord};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn parse_percent(s: &str) -> Result<f64, String> {
    let val: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(0.0..=100.0).contains(&val) {
        Err(format!("must be between 0 and 100, got {}", val))
    } else {
        Ok(val)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AlignerKind {
    Blastn,
    Minimap2,
}

#[derive(Parser)]
#[command(name = "abricate")]
#[command(version)]
#[command(about = "Screen contigs for antimicrobial resistance and virulence genes")]
#[command(long_about = r#"
abricate - mass screening of contigs for resistance and virulence genes

Every sequence of INPUT is aligned against the selected gene database.
Genes matched above --minid identity and covering at least --mincov percent
of their length are reported, one tab-separated line per hit:

  #FILE SEQUENCE START END STRAND GENE COVERAGE COVERAGE_MAP GAPS
  %COVERAGE %IDENTITY DATABASE ACCESSION PRODUCT RESISTANCE

DATABASES:
  Looked up as <datadir>/<name>.json or <datadir>/<name>.json.gz.
  Build one from an ABRICATE 'sequences' file with abricate_makedb.

EXAMPLES:
  abricate contigs.fa
  abricate --db card --minid 90 --mincov 60 contigs.fa.gz
  abricate --aligner minimap2 --datadir /data/abricate contigs.fa
"#)]
struct Args {
    #[arg(value_name = "INPUT", help_heading = "Input")]
    input: PathBuf,

    #[arg(long = "db", alias = "database", value_name = "NAME", default_value = "ncbi", help_heading = "Database")]
    db: String,

    #[arg(long, value_name = "DIR", env = "ABRICATE_DATADIR", default_value = "db", help_heading = "Database")]
    datadir: PathBuf,

    #[arg(long, value_name = "PERCENT", default_value = "80.0", value_parser = parse_percent, help_heading = "Filtering")]
    minid: f64,

    #[arg(long, value_name = "PERCENT", default_value = "80.0", value_parser = parse_percent, help_heading = "Filtering")]
    mincov: f64,

    #[arg(long, help_heading = "Filtering")]
    dedup: bool,

    #[arg(long, value_enum, default_value = "blastn", help_heading = "Alignment")]
    aligner: AlignerKind,

    #[arg(short = 't', long, value_name = "NUM", default_value = "1", help_heading = "Runtime")]
    threads: usize,

    #[arg(long, help_heading = "Output")]
    noheader: bool,

    #[arg(short = 'v', long, help_heading = "Output")]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

/// Exit code carried by the first error in the chain that has one.
fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<abricate::Error>() {
            return e.exit_code();
        }
        if let Some(e) = cause.downcast_ref::<io::Error>() {
            return e.raw_os_error().unwrap_or(1);
        }
    }
    1
}

fn build_aligner(kind: AlignerKind) -> Result<Box<dyn Aligner + Send + Sync>> {
    Ok(match kind {
        AlignerKind::Blastn => Box::new(BlastN::new()?),
        AlignerKind::Minimap2 => Box::new(Minimap2::new()?),
    })
}

fn screen_record<A: Aligner>(
    finder: &ResistanceGeneFinder<A>,
    file: &str,
    record: &FastaRecord,
) -> Result<Vec<ReportRow>> {
    let mut rows = Vec::new();
    for hit in finder
        .find_genes(&record.seq)
        .with_context(|| format!("Failed to search {}", record.name))?
    {
        let hit = hit.with_context(|| format!("Failed to evaluate hits of {}", record.name))?;
        rows.push(ReportRow::from_hit(file, &record.name, &hit));
    }
    Ok(rows)
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let threads = if args.threads == 0 { num_cpus::get() } else { args.threads };

    let database = Database::from_name(&args.db, &args.datadir)?;
    tracing::info!(database = database.name(), genes = database.len(), "loaded database");

    let finder = ResistanceGeneFinder::new(database, build_aligner(args.aligner)?)
        .with_thresholds(args.minid, args.mincov)?
        .with_deduplication(args.dedup);

    let records = FastaReader::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?
        .collect::<abricate::Result<Vec<_>>>()
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    tracing::info!(sequences = records.len(), threads, "screening {}", args.input.display());

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();

    let file = args.input.display().to_string();
    let rows: Vec<Vec<ReportRow>> = records
        .par_iter()
        .map(|record| screen_record(&finder, &file, record))
        .collect::<Result<_>>()?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if !args.noheader {
        write_header(&mut out)?;
    }
    let mut found = 0;
    for per_record in &rows {
        write_rows(&mut out, per_record)?;
        found += per_record.len();
    }
    out.flush()?;

    tracing::info!(
        hits = found,
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "done"
    );
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(err) = run(&args) {
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}
