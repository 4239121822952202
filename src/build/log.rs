use crate::error::{Result, SrcInfoError};
use crate::toolchain::BuildTool;
use std::path::Path;
use std::process::{Command, Stdio};

/// Split captured output into lines, replacing invalid UTF-8 instead of failing.
pub fn decode_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Run the build program in dry-run mode and return its stdout transcript.
///
/// Blocks until the program exits. A non-zero exit is only logged: make with
/// `--keep-going` reports simulated failures but still lists every command.
pub fn dry_run(tool: BuildTool, program: &Path, build_dir: &Path) -> Result<Vec<String>> {
    let args = tool.dry_run_args(build_dir);
    tracing::info!(
        "running '{}' {} ...",
        program.display(),
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let output = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| SrcInfoError::Spawn {
            program: program.display().to_string(),
            source,
        })?;

    if !output.status.success() {
        tracing::warn!(
            status = ?output.status.code(),
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "{} exited unsuccessfully, using its partial transcript",
            tool.display_name()
        );
    }
    tracing::info!("done! {} bytes", output.stdout.len());

    Ok(decode_lines(&output.stdout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_lines_is_lossy() {
        let lines = decode_lines(b"cc -c a.c\r\ncc \xff-c b.c\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "cc -c a.c");
        assert!(lines[1].contains('\u{FFFD}'));
        assert!(lines[1].ends_with("-c b.c"));
        assert_eq!(lines[2], "");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = dry_run(
            BuildTool::Ninja,
            Path::new("/nonexistent/ninja"),
            Path::new("."),
        )
        .unwrap_err();
        assert!(matches!(err, SrcInfoError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_dry_run_captures_stdout() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir()?;
        let fake = dir.path().join("ninja");
        std::fs::write(
            &fake,
            "#!/bin/sh\necho \"args: $*\"\necho '/usr/bin/cc -c a.c'\nexit 1\n",
        )?;
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755))?;

        let lines = dry_run(BuildTool::Ninja, &fake, dir.path())?;
        assert_eq!(
            lines[0],
            format!("args: -C {} -t commands", dir.path().display())
        );
        assert_eq!(lines[1], "/usr/bin/cc -c a.c");
        Ok(())
    }
}
