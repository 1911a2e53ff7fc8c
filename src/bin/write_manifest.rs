//! Manifest utility for triage artifacts.
//!
//! Hashes the model and scaler files and writes `manifest.json` next to them,
//! so later loads can detect corrupted or swapped artifacts.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin write_manifest -- [artifact_dir] [--model <file>] [--scaler <file>]
//! ```
//!
//! Defaults come from the same environment variables the application reads.
//! The files must load as a consistent scaler/classifier pair before a
//! manifest is written for them.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use cardiotriage::adapters::artifacts::{ArtifactManifest, TriageArtifacts, MANIFEST_FILE};
use cardiotriage::config::{ArtifactSettings, TriageConfig};
use cardiotriage::ports::Classifier;

fn usage() -> String {
    "Usage: write_manifest [artifact_dir] [--model <file>] [--scaler <file>]".to_string()
}

fn parse_args(mut settings: ArtifactSettings) -> Result<ArtifactSettings> {
    let mut args = env::args().skip(1);
    let mut dir_seen = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--model" => settings.model_file = args.next().ok_or_else(|| anyhow!(usage()))?,
            "--scaler" => settings.scaler_file = args.next().ok_or_else(|| anyhow!(usage()))?,
            "-h" | "--help" => return Err(anyhow!(usage())),
            _ if !dir_seen && !arg.starts_with('-') => {
                settings.dir = PathBuf::from(arg);
                dir_seen = true;
            }
            _ => return Err(anyhow!(usage())),
        }
    }

    Ok(settings)
}

fn main() -> Result<()> {
    let settings = parse_args(TriageConfig::from_env().artifacts)?;

    let artifacts = TriageArtifacts::load_unverified(&settings)
        .with_context(|| format!("Refusing to write manifest for {:?}", settings.dir))?;

    let manifest = ArtifactManifest::for_files(
        &settings.dir,
        &[settings.model_file.as_str(), settings.scaler_file.as_str()],
    )?;

    let out_path = settings.dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(&out_path, format!("{json}\n"))
        .with_context(|| format!("Failed to write {out_path:?}"))?;

    println!("Wrote {}", out_path.display());
    for (name, digest) in &manifest.files {
        println!("  {name}: {digest}");
    }
    if !artifacts.classifier.supports_probability() {
        println!("Note: no probability calibration; reports will show distance only.");
    }

    Ok(())
}
