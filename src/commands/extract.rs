//! `srcinfo extract`: print every compilation record of the build directory.

use super::Workspace;
use crate::build::{self, CompilationRecord};
use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::borrow::Cow;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One shell-quoted line per file: `<file> -I<dir>... -D<define>...`
    Text,
    /// A JSON array of `{file, includes, defines}` objects
    Json,
}

fn quote(s: &str) -> Cow<'_, str> {
    shlex::try_quote(s).unwrap_or(Cow::Borrowed(s))
}

/// Render one record as a single shell-style line.
pub fn format_record(record: &CompilationRecord) -> String {
    let mut parts = vec![quote(&record.file.to_string_lossy()).into_owned()];
    for inc in &record.includes {
        parts.push(quote(&format!("-I{}", inc.display())).into_owned());
    }
    for def in &record.defines {
        parts.push(quote(&format!("-D{}", def)).into_owned());
    }
    parts.join(" ")
}

pub fn render(records: &[CompilationRecord], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => records
            .iter()
            .map(format_record)
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => serde_json::to_string_pretty(records)?,
    })
}

// --- Helper: Extract with a spinner while the dry run is going ---
pub fn collect_records(ws: &Workspace) -> Result<Vec<CompilationRecord>> {
    let options = ws.build_info_options()?;
    let start_time = Instant::now();

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message(format!("Reading build log in {}", options.build_dir.display()));
    pb.enable_steady_tick(Duration::from_millis(120));

    let result = build::build_info(&options);
    pb.finish_and_clear();
    let records = result?;

    eprintln!(
        "{} Extracted {} records in {:.2?}",
        "✓".green(),
        records.len(),
        start_time.elapsed()
    );
    Ok(records)
}

pub fn run_extract(ws: &Workspace, format: OutputFormat) -> Result<()> {
    let records = collect_records(ws)?;
    if records.is_empty() {
        eprintln!("{} No compile commands found in the build log.", "!".yellow());
    }
    let out = render(&records, format)?;
    if !out.is_empty() {
        println!("{}", out);
    }
    Ok(())
}
