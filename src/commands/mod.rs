//! CLI command handlers
//!
//! Each handler receives a [`Workspace`]: the build directory, its cache and
//! the merged configuration (file values overridden by command-line flags).

pub mod check;
pub mod extract;
pub mod inspect;

use crate::build::BuildInfoOptions;
use crate::cache::CMakeCache;
use crate::config::SrcInfoConfig;
use anyhow::Result;
use std::path::PathBuf;

/// Cache variable CMake stores the top-level source directory in.
pub const HOME_DIRECTORY_VAR: &str = "CMAKE_HOME_DIRECTORY";

pub struct Workspace {
    pub build_dir: PathBuf,
    pub cache: CMakeCache,
    pub config: SrcInfoConfig,
}

impl Workspace {
    pub fn new(build_dir: PathBuf, config: SrcInfoConfig) -> Self {
        let cache = CMakeCache::new(&build_dir);
        Self {
            build_dir,
            cache,
            config,
        }
    }

    /// Configured source root, else the one CMake recorded, else the CWD.
    pub fn source_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.config.source_dir {
            return Ok(dir.clone());
        }
        if let Some(dir) = self.cache.lookup(HOME_DIRECTORY_VAR)? {
            return Ok(PathBuf::from(dir));
        }
        Ok(std::env::current_dir()?)
    }

    pub fn build_info_options(&self) -> Result<BuildInfoOptions> {
        Ok(BuildInfoOptions {
            build_dir: self.build_dir.clone(),
            source_dir: self.source_dir()?,
            use_c: self.config.use_c,
            use_cxx: self.config.use_cxx,
            ignore: self.config.ignore.clone(),
        })
    }
}
