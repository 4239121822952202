//! Build log interpretation.
//!
//! A line is a compile command when one of its whitespace-separated tokens is
//! exactly a configured compiler path. Only the arguments after that token are
//! looked at; everything before it (`cd dir &&`, launchers, env assignments)
//! is dropped.

use super::utils::{IgnoreRules, absolutize, is_source};
use crate::error::{Result, SrcInfoError};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Stands in for whichever compiler path matched, so the re-split can find it.
pub const COMPILER_SENTINEL: &str = "%COMPILER%";

/// Source file plus the include paths and defines it is compiled with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilationRecord {
    pub file: PathBuf,
    pub includes: Vec<PathBuf>,
    pub defines: Vec<String>,
}

/// The flags of one compile command, before include paths are resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileCommand {
    /// Sorted.
    pub sources: Vec<String>,
    pub includes: Vec<String>,
    pub defines: Vec<String>,
}

// --- Helper: Join flags that were written as two tokens ---
fn normalize_flags(args: &str) -> String {
    args.replace(" -isystem", " -I")
        .replace(" -D ", " -D")
        .replace(" -I ", " -I")
}

// --- Helper: Keep word-leading `#` literal so the split never sees a comment ---
fn escape_comment_marks(args: &str) -> String {
    let mut out = String::with_capacity(args.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut word_start = true;
    for ch in args.chars() {
        let literal = escaped;
        if escaped {
            escaped = false;
        } else {
            match quote {
                Some(q) if ch == q => quote = None,
                Some('"') if ch == '\\' => escaped = true,
                Some(_) => {}
                None => match ch {
                    '\\' => escaped = true,
                    '\'' | '"' => quote = Some(ch),
                    '#' if word_start => out.push('\\'),
                    _ => {}
                },
            }
        }
        word_start = !literal && quote.is_none() && !escaped && ch.is_whitespace();
        out.push(ch);
    }
    out
}

/// Parse one log line, `None` when it does not invoke any of `compilers`.
pub fn parse_line(line: &str, compilers: &[String]) -> Option<CompileCommand> {
    let mut matched = false;
    let tokens: Vec<&str> = line
        .split_whitespace()
        .map(|tok| {
            if compilers.iter().any(|c| c == tok) {
                matched = true;
                COMPILER_SENTINEL
            } else {
                tok
            }
        })
        .collect();
    if !matched {
        return None;
    }

    let joined = escape_comment_marks(&normalize_flags(&tokens.join(" ")));
    let Some(mut args) = shlex::split(&joined) else {
        tracing::warn!(line, "unbalanced quoting in compile command, skipping");
        return None;
    };

    let Some(pos) = args.iter().position(|a| a == COMPILER_SENTINEL) else {
        tracing::debug!(line, "compiler token swallowed by quoting, skipping");
        return None;
    };
    args.drain(..=pos);

    let mut cmd = CompileCommand::default();
    for arg in &args {
        if is_source(arg) {
            cmd.sources.push(arg.clone());
        }
        if let Some(inc) = arg.strip_prefix("-I") {
            cmd.includes.push(inc.trim().to_string());
        }
        if let Some(def) = arg.strip_prefix("-D") {
            cmd.defines.push(def.trim().to_string());
        }
    }
    cmd.sources.sort();
    Some(cmd)
}

/// Walks a build log and produces one record per compiled source file.
pub struct Interpreter<'a> {
    compilers: &'a [String],
    build_dir: PathBuf,
    ignore: IgnoreRules,
}

impl<'a> Interpreter<'a> {
    pub fn new(compilers: &'a [String], build_dir: &Path) -> Self {
        Self {
            compilers,
            build_dir: build_dir.to_path_buf(),
            ignore: IgnoreRules::default(),
        }
    }

    pub fn with_ignore(mut self, ignore: IgnoreRules) -> Self {
        self.ignore = ignore;
        self
    }

    // --- Helper: Resolve include paths, all of which must exist ---
    fn resolve_includes(&self, includes: &[String]) -> Result<Vec<PathBuf>> {
        includes
            .iter()
            .map(|inc| {
                let path = Path::new(inc);
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    absolutize(path, &self.build_dir)
                };
                if path.exists() {
                    Ok(path)
                } else {
                    Err(SrcInfoError::MissingIncludeDir(path))
                }
            })
            .collect()
    }

    /// Records in log order; stops at the first include path that is missing on disk.
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<CompilationRecord>> {
        tracing::info!("parsing build log ({} lines) ...", lines.len());
        let mut records = Vec::new();

        for line in lines {
            let Some(cmd) = parse_line(line.as_ref(), self.compilers) else {
                continue;
            };
            let includes = self.resolve_includes(&cmd.includes)?;

            for source in cmd.sources {
                let file = PathBuf::from(source);
                if self.ignore.is_ignored(&file, &self.build_dir) {
                    tracing::debug!(file = %file.display(), "ignored");
                    continue;
                }
                records.push(CompilationRecord {
                    file,
                    includes: includes.clone(),
                    defines: cmd.defines.clone(),
                });
            }
        }

        tracing::info!("done! {} records", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn compilers() -> Vec<String> {
        vec!["/usr/bin/cc".to_string(), "/usr/bin/c++".to_string()]
    }

    #[test]
    fn test_non_compile_line_is_skipped() {
        let c = compilers();
        assert!(parse_line("/usr/bin/ar qc libfoo.a a.o b.o", &c).is_none());
        assert!(parse_line("", &c).is_none());
        // substring of a token is not a match
        assert!(parse_line("/usr/bin/ccache -c a.c", &c).is_none());
    }

    #[test]
    fn test_parse_basic_command() {
        let cmd = parse_line(
            "cd /b && /usr/bin/cc -DFOO=1 -I/inc -o a.o -c /src/a.c",
            &compilers(),
        )
        .unwrap();
        assert_eq!(cmd.sources, ["/src/a.c"]);
        assert_eq!(cmd.includes, ["/inc"]);
        assert_eq!(cmd.defines, ["FOO=1"]);
    }

    #[test]
    fn test_tokens_before_compiler_are_dropped() {
        let cmd = parse_line(
            "/usr/bin/env -DLAUNCHER -I/launcher pre.c /usr/bin/c++ -I/real x.cc",
            &compilers(),
        )
        .unwrap();
        assert_eq!(cmd.sources, ["x.cc"]);
        assert_eq!(cmd.includes, ["/real"]);
        assert!(cmd.defines.is_empty());
    }

    #[test]
    fn test_isystem_counts_as_include() {
        let c = compilers();
        let a = parse_line("/usr/bin/cc -isystem /x -c a.c", &c).unwrap();
        let b = parse_line("/usr/bin/cc -I /x -c a.c", &c).unwrap();
        let d = parse_line("/usr/bin/cc -isystem/x -c a.c", &c).unwrap();
        assert_eq!(a.includes, ["/x"]);
        assert_eq!(a, b);
        assert_eq!(a, d);
    }

    #[test]
    fn test_separated_define_is_joined() {
        let cmd = parse_line("/usr/bin/cc -D NDEBUG -D 'NAME=\"x y\"' -c a.c", &compilers())
            .unwrap();
        assert_eq!(cmd.defines, ["NDEBUG", "NAME=\"x y\""]);
    }

    #[test]
    fn test_headers_are_not_sources() {
        let cmd = parse_line("/usr/bin/c++ -include pch.hh -c b.cpp", &compilers()).unwrap();
        assert_eq!(cmd.sources, ["b.cpp"]);
    }

    #[test]
    fn test_hash_words_are_not_comments() {
        let c = compilers();
        let cmd = parse_line("/usr/bin/cc -DA #x -Iinc -c b.c", &c).unwrap();
        assert_eq!(cmd.sources, ["b.c"]);
        assert_eq!(cmd.includes, ["inc"]);
        assert_eq!(cmd.defines, ["A"]);

        let cmd = parse_line("/usr/bin/cc -DFOO=1 -c a.c #!x b.c", &c).unwrap();
        assert_eq!(cmd.sources, ["a.c", "b.c"]);

        // quoted and mid-word `#` pass through untouched
        let cmd = parse_line("/usr/bin/cc -D'X #y' -DN#1 \"#q\" -c a.c", &c).unwrap();
        assert_eq!(cmd.defines, ["X #y", "N#1"]);
        assert_eq!(cmd.sources, ["a.c"]);
    }

    #[test]
    fn test_unbalanced_quote_is_skipped() {
        assert!(parse_line("/usr/bin/cc -DX=\"oops -c a.c", &compilers()).is_none());
    }

    #[test]
    fn test_two_files_share_flags_sorted() -> anyhow::Result<()> {
        let build = tempfile::tempdir()?;
        fs::create_dir(build.path().join("inc"))?;
        let c = vec!["%COMPILER%".to_string()];

        let records = Interpreter::new(&c, build.path()).extract(&["%COMPILER% -Iinc -DX b.c a.c"])?;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].file, PathBuf::from("a.c"));
        assert_eq!(records[1].file, PathBuf::from("b.c"));
        assert_eq!(records[0].includes, records[1].includes);
        assert_eq!(records[0].defines, ["X"]);
        assert_eq!(records[0].defines, records[1].defines);
        assert!(records[0].includes[0].is_absolute());
        assert!(records[0].includes[0].ends_with("inc"));
        Ok(())
    }

    #[test]
    fn test_records_follow_log_order() -> anyhow::Result<()> {
        let build = tempfile::tempdir()?;
        let c = compilers();
        let log = [
            "/usr/bin/c++ -c z.cpp",
            "[ 50%] Linking CXX executable app",
            "/usr/bin/cc -c a.c",
        ];
        let records = Interpreter::new(&c, build.path()).extract(&log)?;
        let files: Vec<_> = records.iter().map(|r| r.file.clone()).collect();
        assert_eq!(files, [PathBuf::from("z.cpp"), PathBuf::from("a.c")]);
        Ok(())
    }

    #[test]
    fn test_missing_include_is_fatal() -> anyhow::Result<()> {
        let build = tempfile::tempdir()?;
        let c = compilers();
        let err = Interpreter::new(&c, build.path())
            .extract(&["/usr/bin/cc -Idoes_not_exist -c a.c"])
            .unwrap_err();
        match err {
            SrcInfoError::MissingIncludeDir(p) => assert!(p.ends_with("does_not_exist")),
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn test_ignore_rules_filter_records() -> anyhow::Result<()> {
        let src = tempfile::tempdir()?;
        let build = src.path().join("build");
        fs::create_dir(&build)?;
        let c = compilers();

        let ignore = IgnoreRules::new(src.path(), vec!["vendor/".to_string()]);
        let vendor = src.path().join("vendor/lib.c");
        let stub = src.path().join("src/vendor_stub.c");
        let line = format!("/usr/bin/cc -c {} {}", vendor.display(), stub.display());

        let records = Interpreter::new(&c, &build)
            .with_ignore(ignore)
            .extract(&[line])?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file, stub);
        Ok(())
    }
}
