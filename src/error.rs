//! Error taxonomy for extraction.
//!
//! Configuration errors mean the build directory is unusable as-is, consistency
//! errors mean the build log no longer matches the filesystem. Both are fatal
//! to an extraction run; the binary turns them into a diagnostic and exit code 1.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SrcInfoError {
    #[error("CMakeCache.txt not found in {}", .0.display())]
    CacheNotFound(PathBuf),

    #[error("unable to find {0:?} in CMakeCache.txt")]
    MissingVariable(String),

    #[error("{variable}: \"{path}\" is not known (make/gmake/ninja)")]
    UnknownBuildTool { variable: String, path: String },

    #[error("include directory {} from the build log is missing", .0.display())]
    MissingIncludeDir(PathBuf),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SrcInfoError {
    /// True for errors caused by the environment rather than by the log contents.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SrcInfoError::CacheNotFound(_)
                | SrcInfoError::MissingVariable(_)
                | SrcInfoError::UnknownBuildTool { .. }
        )
    }
}

pub type Result<T, E = SrcInfoError> = std::result::Result<T, E>;
