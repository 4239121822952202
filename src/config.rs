use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "srcinfo.toml";

/// Optional `srcinfo.toml`; every field falls back to a default.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SrcInfoConfig {
    /// Source root for ignore rules (defaults to `CMAKE_HOME_DIRECTORY`)
    pub source_dir: Option<PathBuf>,
    /// Path prefixes, relative to the source root, to leave out
    pub ignore: Vec<String>,
    pub use_c: bool,
    pub use_cxx: bool,
    /// Concurrent jobs for `check` (defaults to the CPU count)
    pub jobs: Option<usize>,
    pub poll_interval_ms: u64,
}

impl Default for SrcInfoConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            ignore: Vec::new(),
            use_c: true,
            use_cxx: true,
            jobs: None,
            poll_interval_ms: 100,
        }
    }
}

// --- Helper: Load Config (explicit path must exist, default path may not) ---
pub fn load_config(build_dir: &Path, explicit: Option<&Path>) -> Result<SrcInfoConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = build_dir.join(CONFIG_FILE);
            if !default.exists() {
                return Ok(SrcInfoConfig::default());
            }
            default
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: SrcInfoConfig = toml::from_str(&content).with_context(|| {
        format!(
            "Failed to parse {} - check for syntax errors (missing quotes, brackets)",
            path.display()
        )
    })?;

    tracing::debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_default_file_gives_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = load_config(dir.path(), None)?;
        assert_eq!(config, SrcInfoConfig::default());
        assert!(config.use_c && config.use_cxx);
        Ok(())
    }

    #[test]
    fn test_partial_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join(CONFIG_FILE),
            "ignore = [\"extern/\", \"intern/vendor/\"]\nuse_cxx = false\njobs = 3\n",
        )?;
        let config = load_config(dir.path(), None)?;
        assert_eq!(config.ignore, ["extern/", "intern/vendor/"]);
        assert!(config.use_c);
        assert!(!config.use_cxx);
        assert_eq!(config.jobs, Some(3));
        assert_eq!(config.poll_interval_ms, 100);
        Ok(())
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn test_unknown_key_is_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(CONFIG_FILE), "ignored = []\n")?;
        let err = load_config(dir.path(), None).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
        Ok(())
    }
}
