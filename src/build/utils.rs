use std::path::{Component, Path, PathBuf};

/// Extensions of files that are compiled on their own.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cpp", "cxx", "m", "mm", "rc", "cc", "inl", "osl"];

/// Extensions of files that are only ever included.
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "hxx", "hh"];

fn has_extension(path: &str, exts: &[&str]) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| exts.contains(&ext.to_string_lossy().as_ref()))
}

pub fn is_source(path: &str) -> bool {
    has_extension(path, SOURCE_EXTENSIONS)
}

pub fn is_header(path: &str) -> bool {
    has_extension(path, HEADER_EXTENSIONS)
}

pub fn is_c_any(path: &str) -> bool {
    is_source(path) || is_header(path)
}

// --- Helper: Lexical path normalisation (no filesystem access) ---
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// `path` made absolute against `base` (itself made absolute against the CWD).
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    let absolute = std::path::absolute(&joined).unwrap_or(joined);
    normalize(&absolute)
}

/// `path` relative to `base`, stepping out with `..` where they diverge.
/// Both must already be absolute and normalised.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_comps: Vec<Component> = path.components().collect();
    let base_comps: Vec<Component> = base.components().collect();

    let common = path_comps
        .iter()
        .zip(base_comps.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_comps.len() {
        out.push("..");
    }
    for comp in &path_comps[common..] {
        out.push(comp);
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Path-prefix filters, matched against a file's path relative to the source root.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    source_dir: PathBuf,
    prefixes: Vec<String>,
}

impl IgnoreRules {
    pub fn new(source_dir: &Path, prefixes: Vec<String>) -> Self {
        Self {
            source_dir: absolutize(source_dir, Path::new(".")),
            prefixes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// `file` is taken relative to `base_dir` when it is not absolute.
    pub fn is_ignored(&self, file: &Path, base_dir: &Path) -> bool {
        if self.is_empty() {
            return false;
        }
        let rel = relative_to(&absolutize(file, base_dir), &self.source_dir);
        let rel = rel.to_string_lossy();
        self.prefixes.iter().any(|prefix| rel.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_classification() {
        for f in ["a.c", "b.cpp", "c.cxx", "d.m", "e.mm", "f.rc", "g.cc", "h.inl", "i.osl"] {
            assert!(is_source(f), "{f}");
            assert!(!is_header(f), "{f}");
        }
        for f in ["a.h", "b.hpp", "c.hxx", "d.hh"] {
            assert!(is_header(f), "{f}");
            assert!(!is_source(f), "{f}");
            assert!(is_c_any(f), "{f}");
        }
        for f in ["-o", "lib.a", "main.o", "Makefile", ".c", "dep.d"] {
            assert!(!is_c_any(f), "{f}");
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_absolutize_relative_against_base() {
        assert_eq!(
            absolutize(Path::new("../inc"), Path::new("/src/build")),
            PathBuf::from("/src/inc")
        );
        assert_eq!(
            absolutize(Path::new("/usr/include"), Path::new("/src/build")),
            PathBuf::from("/usr/include")
        );
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(Path::new("/src/vendor/lib.c"), Path::new("/src")),
            PathBuf::from("vendor/lib.c")
        );
        assert_eq!(
            relative_to(Path::new("/other/x.c"), Path::new("/src/tree")),
            PathBuf::from("../../other/x.c")
        );
        assert_eq!(
            relative_to(Path::new("/src"), Path::new("/src")),
            PathBuf::from(".")
        );
    }

    #[test]
    fn test_ignore_is_prefix_not_substring() {
        let rules = IgnoreRules::new(Path::new("/src"), vec!["vendor/".to_string()]);
        let build = Path::new("/src/build");
        assert!(rules.is_ignored(Path::new("/src/vendor/lib.c"), build));
        assert!(!rules.is_ignored(Path::new("/src/src/vendor_stub.c"), build));
        // relative paths are resolved against the build directory first
        assert!(rules.is_ignored(Path::new("../vendor/zlib/inflate.c"), build));
    }

    #[test]
    fn test_no_rules_ignores_nothing() {
        let rules = IgnoreRules::default();
        assert!(rules.is_empty());
        assert!(!rules.is_ignored(Path::new("/anything.c"), Path::new("/")));
    }
}
