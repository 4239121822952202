use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Build-orchestration programs whose dry-run output we know how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildTool {
    /// GNU make / gmake (`--dry-run` transcript)
    Make,
    /// Ninja (`-t commands` listing)
    Ninja,
}

impl BuildTool {
    /// Pick the variant from the executable's file name, `None` if unrecognised.
    pub fn from_program(program: &Path) -> Option<Self> {
        let name = program.file_name()?.to_string_lossy();
        if name.starts_with("make") || name.starts_with("gmake") {
            Some(BuildTool::Make)
        } else if name.starts_with("ninja") {
            Some(BuildTool::Ninja)
        } else {
            None
        }
    }

    /// Arguments that list every compile command without running any of them.
    pub fn dry_run_args(&self, build_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-C".into(), build_dir.as_os_str().to_owned()];
        match self {
            BuildTool::Make => args.extend(
                ["--always-make", "--dry-run", "--keep-going", "VERBOSE=1"].map(OsString::from),
            ),
            BuildTool::Ninja => args.extend(["-t", "commands"].map(OsString::from)),
        }
        args
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BuildTool::Make => "make",
            BuildTool::Ninja => "ninja",
        }
    }
}

/// Compilers and build program configured for one CMake build directory.
#[derive(Debug, Clone, Serialize)]
pub struct Toolchain {
    /// `CMAKE_C_COMPILER`, when C is enabled
    pub cc_path: Option<String>,

    /// `CMAKE_CXX_COMPILER`, when C++ is enabled
    pub cxx_path: Option<String>,

    /// `CMAKE_MAKE_PROGRAM`
    pub make_program: PathBuf,

    pub build_tool: BuildTool,
}

impl Toolchain {
    /// Compiler paths to recognise in the build log, C first.
    pub fn compilers(&self) -> Vec<String> {
        self.cc_path
            .iter()
            .chain(self.cxx_path.iter())
            .cloned()
            .collect()
    }
}
