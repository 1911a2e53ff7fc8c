//! Headless triage of a single patient record.
//!
//! Reads one JSON record with the thirteen clinical features and prints the
//! triage report.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin assess -- [record.json] [--json]
//! echo '{"age": 61, ...}' | cargo run --bin assess
//! ```
//!
//! Logs go to stderr (default filter `warn`) so stdout carries only the report.

use std::env;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiotriage::adapters::artifacts::TriageArtifacts;
use cardiotriage::adapters::sanitize::SanitizingMakeWriter;
use cardiotriage::config::TriageConfig;
use cardiotriage::{PatientFeatures, TriageService};

struct Args {
    input: Option<PathBuf>,
    json: bool,
}

fn usage() -> String {
    "Usage: assess [record.json] [--json]  (reads stdin when no file is given)".to_string()
}

fn parse_args() -> Result<Args> {
    let mut input = None;
    let mut json = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => return Err(anyhow!(usage())),
            _ if input.is_none() && !arg.starts_with('-') => input = Some(PathBuf::from(arg)),
            _ => return Err(anyhow!(usage())),
        }
    }

    Ok(Args { input, json })
}

fn read_record(input: Option<&PathBuf>) -> Result<PatientFeatures> {
    let reader: Box<dyn Read> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {path:?}"))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    serde_json::from_reader(reader).context("Patient record is not valid JSON for the 13 features")
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(SanitizingMakeWriter::new(io::stderr)),
        )
        .init();

    let args = parse_args()?;
    let config = TriageConfig::from_env();

    let artifacts = TriageArtifacts::load(&config.artifacts)
        .with_context(|| format!("Failed to load artifacts from {:?}", config.artifacts.dir))?;
    let service = TriageService::from_artifacts(&artifacts)?;

    let record = read_record(args.input.as_ref())?;
    let report = service.assess(&record)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text());
    }

    Ok(())
}
