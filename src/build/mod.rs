mod commands;
mod defines;
mod log;
mod utils;

pub use commands::{COMPILER_SENTINEL, CompilationRecord, CompileCommand, Interpreter, parse_line};
pub use defines::{define_to_arg, defines_as_args, defines_as_source, defines_to_args};
pub use log::{decode_lines, dry_run};
pub use utils::{
    HEADER_EXTENSIONS, IgnoreRules, SOURCE_EXTENSIONS, absolutize, is_c_any, is_header,
    is_source, normalize, relative_to,
};

use crate::cache::CMakeCache;
use crate::error::Result;
use crate::toolchain;
use std::path::PathBuf;

/// Inputs to one extraction run.
#[derive(Debug, Clone)]
pub struct BuildInfoOptions {
    pub build_dir: PathBuf,
    pub source_dir: PathBuf,
    pub use_c: bool,
    pub use_cxx: bool,
    pub ignore: Vec<String>,
}

/// Cache -> toolchain -> dry-run transcript -> records.
pub fn build_info(options: &BuildInfoOptions) -> Result<Vec<CompilationRecord>> {
    let cache = CMakeCache::new(&options.build_dir);
    let tc = toolchain::resolve(&cache, options.use_c, options.use_cxx)?;
    let compilers = tc.compilers();
    tracing::info!("compilers: {}", compilers.join(" "));

    let lines = dry_run(tc.build_tool, &tc.make_program, &options.build_dir)?;

    Interpreter::new(&compilers, &options.build_dir)
        .with_ignore(IgnoreRules::new(&options.source_dir, options.ignore.clone()))
        .extract(&lines)
}
