//! `srcinfo check -- <tool> [args...]`
//!
//! Runs an analysis tool once per compiled file, in parallel, with that file's
//! include paths and defines appended: `<tool> [args...] -I<dir>... -D<def>... <file>`.

use super::Workspace;
use super::extract::collect_records;
use crate::build::CompilationRecord;
use crate::jobs::{FinishedJob, ProcessJob, ProcessPool, default_jobs};
use anyhow::{Result, bail};
use colored::*;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub jobs: Option<usize>,
    pub timeout: Option<Duration>,
}

/// The analysis command for one record, run from the build directory.
pub fn check_command(tool: &[String], record: &CompilationRecord, build_dir: &Path) -> Result<Command> {
    let Some((program, args)) = tool.split_first() else {
        bail!("No analysis tool given (usage: srcinfo check -- <tool> [args...])");
    };

    let mut cmd = Command::new(program);
    cmd.args(args);
    for inc in &record.includes {
        cmd.arg(format!("-I{}", inc.display()));
    }
    for def in &record.defines {
        cmd.arg(format!("-D{}", def));
    }
    cmd.arg(&record.file);
    cmd.current_dir(build_dir);
    Ok(cmd)
}

fn report(done: &FinishedJob, file: &Path) {
    let ok = done.status.success();
    let mark = if ok { "✓".green() } else { "x".red() };
    let note = if done.timed_out {
        " (timed out)".yellow().to_string()
    } else {
        String::new()
    };
    println!("{} {}{}", mark, file.display(), note);

    for stream in [&done.stdout, &done.stderr] {
        let text = String::from_utf8_lossy(stream);
        let text = text.trim_end();
        if !text.is_empty() {
            println!("{}", text);
        }
    }
}

/// Returns `true` when every job exited successfully.
pub fn run_check(ws: &Workspace, tool: &[String], options: &CheckOptions) -> Result<bool> {
    let Some(program) = tool.first() else {
        bail!("No analysis tool given (usage: srcinfo check -- <tool> [args...])");
    };
    let records = collect_records(ws)?;
    if records.is_empty() {
        println!("{} Nothing to check.", "!".yellow());
        return Ok(true);
    }

    let jobs = options
        .jobs
        .or(ws.config.jobs)
        .unwrap_or_else(default_jobs);

    let mut pool = ProcessPool::new(jobs)
        .with_poll_interval(Duration::from_millis(ws.config.poll_interval_ms));
    if let Some(timeout) = options.timeout {
        pool = pool.with_timeout(timeout);
    }

    let mut process_jobs = Vec::with_capacity(records.len());
    for record in &records {
        let cmd = check_command(tool, record, &ws.build_dir)?;
        process_jobs.push(ProcessJob::command(cmd));
    }

    println!(
        "{} Checking {} files with {} ({} jobs)...",
        "🔍".cyan(),
        records.len(),
        program.bold(),
        pool.max_concurrency()
    );
    let start_time = Instant::now();

    let reports = pool.run(process_jobs, |done| {
        report(done, &records[done.index].file);
        Ok(None)
    })?;

    let failed = reports.iter().filter(|r| !r.success()).count();
    if failed == 0 {
        println!(
            "{} Checked {} files in {:.2?}",
            "✓".green(),
            reports.len(),
            start_time.elapsed()
        );
    } else {
        println!(
            "{} {} of {} files failed ({:.2?})",
            "x".red(),
            failed,
            reports.len(),
            start_time.elapsed()
        );
    }
    Ok(failed == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_check_command_layout() -> Result<()> {
        let record = CompilationRecord {
            file: PathBuf::from("/src/a.c"),
            includes: vec![PathBuf::from("/src/inc")],
            defines: vec!["X=1".into()],
        };
        let tool = vec!["cppcheck".to_string(), "--quiet".to_string()];
        let cmd = check_command(&tool, &record, Path::new("/build"))?;

        assert_eq!(cmd.get_program(), "cppcheck");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(args, ["--quiet", "-I/src/inc", "-DX=1", "/src/a.c"]);
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/build")));
        Ok(())
    }

    #[test]
    fn test_check_command_requires_tool() {
        let record = CompilationRecord {
            file: PathBuf::from("a.c"),
            includes: vec![],
            defines: vec![],
        };
        assert!(check_command(&[], &record, Path::new(".")).is_err());
    }
}
