use crate::error::{Result, SrcInfoError};
use std::path::Path;
use std::process::{Command, Stdio};

/// The compiler's predefined macros as `#define` lines (GCC and Clang).
pub fn defines_as_source(compiler: &Path) -> Result<String> {
    let output = Command::new(compiler)
        .args(["-dM", "-E", "-"])
        .stdin(Stdio::null())
        .output()
        .map_err(|source| SrcInfoError::Spawn {
            program: compiler.display().to_string(),
            source,
        })?;

    if !output.status.success() {
        tracing::warn!(
            status = ?output.status.code(),
            "{} -dM -E - exited unsuccessfully",
            compiler.display()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// `#define NAME VALUE` becomes `-DNAME=VALUE`, a bare `#define NAME` becomes `-DNAME`.
pub fn define_to_arg(line: &str) -> Option<String> {
    let rest = line.strip_prefix("#define")?;
    let rest = rest.trim_start();
    let (name, value) = match rest.split_once(char::is_whitespace) {
        Some((name, value)) => (name, value.trim_start()),
        None => (rest, ""),
    };
    if name.is_empty() {
        return None;
    }
    if value.is_empty() {
        Some(format!("-D{}", name))
    } else {
        Some(format!("-D{}={}", name, value))
    }
}

pub fn defines_to_args(source: &str) -> Vec<String> {
    source.lines().filter_map(define_to_arg).collect()
}

pub fn defines_as_args(compiler: &Path) -> Result<Vec<String>> {
    Ok(defines_to_args(&defines_as_source(compiler)?))
}
