//! `CMakeCache.txt` reader.
//!
//! The cache is a flat list of `NAME:TYPE=VALUE` (or `NAME=VALUE`) lines with
//! comments interleaved. Nothing is memoised: every lookup re-reads the file,
//! so a reconfigured build directory is always seen as it is now.
//!
//! ## Example
//!
//! ```no_run
//! use srcinfo::cache::CMakeCache;
//!
//! let cache = CMakeCache::new("build");
//! let cc = cache.lookup_or_fail("CMAKE_C_COMPILER")?;
//! # Ok::<(), srcinfo::error::SrcInfoError>(())
//! ```

use crate::error::{Result, SrcInfoError};
use regex::Regex;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::LazyLock;

pub const CACHE_FILE: &str = "CMakeCache.txt";

static CACHE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_\-]+)(?::([A-Za-z0-9_\-]*))?=(.*)$").expect("cache line pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheVariable {
    pub name: String,
    /// CMake type (`FILEPATH`, `STRING`, `INTERNAL`...), empty when untyped.
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// Parse one cache line, `None` for comments, blanks and anything malformed.
pub fn parse_line(line: &str) -> Option<CacheVariable> {
    let caps = CACHE_LINE.captures(line.trim())?;
    Some(CacheVariable {
        name: caps[1].to_string(),
        kind: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        value: caps[3].to_string(),
    })
}

/// Handle on the cache file of one build directory.
#[derive(Debug, Clone)]
pub struct CMakeCache {
    dir: PathBuf,
}

impl CMakeCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Lazily iterate variables in file order. Each call opens the file again.
    pub fn iter(&self) -> Result<CacheVariables> {
        let file = File::open(self.path()).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SrcInfoError::CacheNotFound(self.dir.clone()),
            _ => SrcInfoError::Io(e),
        })?;
        Ok(CacheVariables {
            lines: BufReader::new(file).split(b'\n'),
        })
    }

    /// Value of the first variable called `name`; later duplicates are ignored.
    pub fn lookup(&self, name: &str) -> Result<Option<String>> {
        for var in self.iter()? {
            let var = var?;
            if var.name == name {
                return Ok(Some(var.value));
            }
        }
        Ok(None)
    }

    /// Like [`lookup`](Self::lookup), but a missing variable is a configuration error.
    pub fn lookup_or_fail(&self, name: &str) -> Result<String> {
        self.lookup(name)?
            .ok_or_else(|| SrcInfoError::MissingVariable(name.to_string()))
    }
}

/// Iterator returned by [`CMakeCache::iter`]. Not restartable.
pub struct CacheVariables {
    lines: io::Split<BufReader<File>>,
}

impl Iterator for CacheVariables {
    type Item = Result<CacheVariable>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = match self.lines.next()? {
                Ok(raw) => raw,
                Err(e) => return Some(Err(e.into())),
            };
            if let Some(var) = parse_line(&String::from_utf8_lossy(&raw)) {
                return Some(Ok(var));
            }
        }
    }
}
