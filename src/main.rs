//! Command-line interface for synth
//!
//! # Usage Examples
//!
//! ```bash
//! # Ten records from every table, seed taken from the schema
//! synth --schema sessions.yaml
//!
//! # 100k records of one table into a file, with an explicit seed
//! synth --schema sessions.yaml --table visits --count 100000 \
//!   --seed 7 --output visits.jsonl
//!
//! # Show vocabulary and restart diagnostics
//! RUST_LOG=synth_generator=debug synth --schema sessions.yaml
//! ```
//!
//! Output is one JSON object per line.

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use synth_core::Schema;
use synth_generator::RecordGenerator;
use tracing::{debug, info};

/// Default buffer size for JSONL writing.
const DEFAULT_BUFFER_SIZE: usize = 8192;

#[derive(Parser, Debug)]
#[command(name = "synth")]
#[command(about = "Generate realistic synthetic records from a YAML schema")]
#[command(long_about = None)]
struct Cli {
    /// Path to schema YAML file
    #[arg(long, short = 's', env = "SYNTH_SCHEMA")]
    schema: PathBuf,

    /// Table to generate (default: every table, in schema order)
    #[arg(long, short = 't')]
    table: Option<String>,

    /// Number of records to generate per table
    #[arg(long, short = 'n', default_value = "10")]
    count: u64,

    /// Root seed (overrides the schema seed)
    #[arg(long, env = "SYNTH_SEED")]
    seed: Option<u64>,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let schema = Schema::from_file(&cli.schema)
        .with_context(|| format!("Failed to load schema from {:?}", cli.schema))?;

    let tables: Vec<String> = match &cli.table {
        Some(table) => {
            if schema.get_table(table).is_none() {
                anyhow::bail!(
                    "Table '{table}' not found in schema (available: {})",
                    schema.table_names().join(", ")
                );
            }
            vec![table.clone()]
        }
        None => schema.table_names().iter().map(|t| t.to_string()).collect(),
    };

    let mut generator = match cli.seed {
        Some(seed) => RecordGenerator::with_seed(schema, seed),
        None => RecordGenerator::new(schema),
    }
    .context("Failed to build record generator")?;

    let sink: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {path:?}"))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, sink);

    let started = Instant::now();
    let mut written = 0u64;
    for table in &tables {
        info!(
            "Generating {} records for table '{}' (seed {})",
            cli.count,
            table,
            generator.seed()
        );
        for record in generator.records(table, cli.count)? {
            let record =
                record.with_context(|| format!("Failed to generate a record for '{table}'"))?;
            serde_json::to_writer(&mut writer, &record.to_json())?;
            writeln!(writer)?;

            written += 1;
            if written % 10000 == 0 {
                debug!("Written {} records", written);
            }
        }
    }
    writer.flush().context("Failed to flush output")?;

    info!(
        "Wrote {} records in {:.2?}",
        written,
        started.elapsed()
    );
    Ok(())
}
