//! Toolchain resolution from the CMake cache
//!
//! Nothing is searched on `PATH`: the compilers and build program are exactly
//! the ones CMake recorded when the build directory was configured, since those
//! are the strings that appear in the build log.

pub mod types;

pub use types::{BuildTool, Toolchain};

use crate::cache::CMakeCache;
use crate::error::{Result, SrcInfoError};
use std::path::PathBuf;

pub const C_COMPILER_VAR: &str = "CMAKE_C_COMPILER";
pub const CXX_COMPILER_VAR: &str = "CMAKE_CXX_COMPILER";
pub const MAKE_PROGRAM_VAR: &str = "CMAKE_MAKE_PROGRAM";

/// Look up the build program and classify it.
pub fn resolve_build_tool(cache: &CMakeCache) -> Result<(BuildTool, PathBuf)> {
    let program = PathBuf::from(cache.lookup_or_fail(MAKE_PROGRAM_VAR)?);
    match BuildTool::from_program(&program) {
        Some(tool) => Ok((tool, program)),
        None => Err(SrcInfoError::UnknownBuildTool {
            variable: MAKE_PROGRAM_VAR.to_string(),
            path: program.display().to_string(),
        }),
    }
}

/// Resolve the toolchain; only the enabled languages' compilers are required.
pub fn resolve(cache: &CMakeCache, use_c: bool, use_cxx: bool) -> Result<Toolchain> {
    let (build_tool, make_program) = resolve_build_tool(cache)?;

    let cc_path = if use_c {
        Some(cache.lookup_or_fail(C_COMPILER_VAR)?)
    } else {
        None
    };
    let cxx_path = if use_cxx {
        Some(cache.lookup_or_fail(CXX_COMPILER_VAR)?)
    } else {
        None
    };

    tracing::debug!(?build_tool, ?cc_path, ?cxx_path, "resolved toolchain");

    Ok(Toolchain {
        cc_path,
        cxx_path,
        make_program,
        build_tool,
    })
}
