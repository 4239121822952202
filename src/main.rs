//! # srcinfo CLI Entry Point
//!
//! Parses arguments with clap, loads `srcinfo.toml`, checks that the build
//! directory has been configured, then routes to the command handlers.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use srcinfo::cache::{CACHE_FILE, CMakeCache};
use srcinfo::commands::{self, Workspace, check::CheckOptions, extract::OutputFormat};
use srcinfo::config;
use srcinfo::error::SrcInfoError;

#[derive(Parser)]
#[command(name = "srcinfo")]
#[command(about = "Per-file compile metadata from CMake build logs", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// CMake build directory (the one holding CMakeCache.txt)
    #[arg(short = 'B', long, global = true, default_value = ".")]
    build_dir: PathBuf,

    /// Config file [default: <build-dir>/srcinfo.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Source root that --ignore prefixes are relative to
    #[arg(long, global = true)]
    source_dir: Option<PathBuf>,

    /// Leave out files whose path relative to the source root starts with PREFIX
    #[arg(long = "ignore", value_name = "PREFIX", global = true)]
    ignore: Vec<String>,

    /// Do not recognise the C compiler
    #[arg(long, global = true)]
    no_c: bool,

    /// Do not recognise the C++ compiler
    #[arg(long, global = true)]
    no_cxx: bool,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every compilation record (default)
    Extract {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Run an analysis tool over every compiled file
    Check {
        /// Concurrent jobs [default: number of CPUs]
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Kill a job after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Tool and its arguments; -I/-D flags and the file are appended
        #[arg(last = true, required = true, num_args = 1..)]
        tool: Vec<String>,
    },
    /// Read CMakeCache.txt
    Cache {
        #[command(subcommand)]
        op: CacheOp,
    },
    /// Print the compiler's predefined macros
    Defines {
        /// Use the C++ compiler instead of the C compiler
        #[arg(long)]
        cxx: bool,
        /// Print as -DNAME=VALUE arguments
        #[arg(long)]
        args: bool,
    },
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

#[derive(Subcommand)]
enum CacheOp {
    /// Print the value of one variable
    Get { name: String },
    /// List variables
    Ls {
        /// Include INTERNAL and STATIC entries
        #[arg(long)]
        all: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("srcinfo=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(Commands::Completion { shell }) = &cli.command {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    if !CMakeCache::new(&cli.build_dir).exists() {
        eprintln!(
            "{} {} not found in {}",
            "x".red(),
            CACHE_FILE,
            cli.build_dir.display()
        );
        eprintln!(
            "   {} This must run from a configured CMake build directory (or pass -B <dir>).",
            "💡".yellow()
        );
        return Ok(ExitCode::FAILURE);
    }

    // File values first, then command-line overrides
    let mut cfg = config::load_config(&cli.build_dir, cli.config.as_deref())?;
    if cli.source_dir.is_some() {
        cfg.source_dir = cli.source_dir.clone();
    }
    cfg.ignore.extend(cli.ignore.iter().cloned());
    if cli.no_c {
        cfg.use_c = false;
    }
    if cli.no_cxx {
        cfg.use_cxx = false;
    }

    let ws = Workspace::new(cli.build_dir.clone(), cfg);

    match dispatch(cli.command, &ws) {
        Ok(code) => Ok(code),
        Err(err) => match err.downcast_ref::<SrcInfoError>() {
            Some(e) if e.is_configuration() => {
                eprintln!("{} {}", "x".red(), e);
                eprintln!(
                    "   {} Re-run cmake in {} so its cache is complete.",
                    "💡".yellow(),
                    ws.build_dir.display()
                );
                Ok(ExitCode::FAILURE)
            }
            _ => Err(err),
        },
    }
}

fn dispatch(command: Option<Commands>, ws: &Workspace) -> Result<ExitCode> {
    match command {
        None => commands::extract::run_extract(ws, OutputFormat::Text)?,
        Some(Commands::Extract { format }) => commands::extract::run_extract(ws, format)?,
        Some(Commands::Check {
            jobs,
            timeout,
            tool,
        }) => {
            let options = CheckOptions {
                jobs,
                timeout: timeout.map(Duration::from_secs),
            };
            if !commands::check::run_check(ws, &tool, &options)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(Commands::Cache { op }) => match op {
            CacheOp::Get { name } => commands::inspect::cache_get(ws, &name)?,
            CacheOp::Ls { all } => commands::inspect::cache_list(ws, all)?,
        },
        Some(Commands::Defines { cxx, args }) => commands::inspect::print_defines(ws, cxx, args)?,
        // handled before the cache check
        Some(Commands::Completion { .. }) => {}
    }

    Ok(ExitCode::SUCCESS)
}
