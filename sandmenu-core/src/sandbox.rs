//! Adapter over Sandboxie's `Start.exe`.
//!
//! The tool is located once when the adapter is built. Launches are
//! fire-and-forget: the child is spawned, its pid reported, and the handle
//! dropped. Maintenance commands wait for the tool to exit.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

use crate::error::{Error, Result};

pub const START_EXE_CANDIDATES: [&str; 3] = [
    "C:\\Program Files\\Sandboxie-Plus\\Start.exe",
    "C:\\Program Files\\Sandboxie\\Start.exe",
    "C:\\Program Files (x86)\\Sandboxie\\Start.exe",
];

const MANAGER_EXE: &str = "SandMan.exe";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchOutcome {
    pub success: bool,
    pub message: String,
    pub pid: u32,
}

impl LaunchOutcome {
    pub fn launched(pid: u32) -> Self {
        Self {
            success: true,
            message: format!("Program launched with PID {}", pid),
            pid,
        }
    }

    pub fn failed(err: &Error) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            pid: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SandboxTool {
    start_exe: Option<PathBuf>,
}

impl SandboxTool {
    /// Probes the standard install locations.
    pub fn detect() -> Self {
        Self::detect_from(START_EXE_CANDIDATES.into_iter().map(Path::new))
    }

    pub fn detect_from<'a>(candidates: impl IntoIterator<Item = &'a Path>) -> Self {
        let start_exe = candidates
            .into_iter()
            .find(|path| path.is_file())
            .map(Path::to_path_buf);
        match &start_exe {
            Some(path) => info!(path = %path.display(), "found Sandboxie"),
            None => warn!("Sandboxie Start.exe not found"),
        }
        Self { start_exe }
    }

    pub fn at(start_exe: impl Into<PathBuf>) -> Self {
        Self {
            start_exe: Some(start_exe.into()),
        }
    }

    pub fn absent() -> Self {
        Self { start_exe: None }
    }

    pub fn is_available(&self) -> bool {
        self.start_exe.is_some()
    }

    pub fn start_exe(&self) -> Option<&Path> {
        self.start_exe.as_deref()
    }

    /// Starts `file` inside `sandbox` and returns the pid of the spawned tool.
    ///
    /// The target is checked before the tool, so a missing file never reaches
    /// Sandboxie.
    pub fn launch(&self, file: &Path, sandbox: &str) -> Result<u32> {
        if !file.exists() {
            return Err(Error::TargetMissing(file.to_path_buf()));
        }
        let start_exe = self.require()?;

        let child = Command::new(start_exe)
            .args(launch_args(sandbox, file))
            .spawn()
            .map_err(|source| Error::Spawn {
                program: start_exe.to_path_buf(),
                source,
            })?;
        let pid = child.id();
        info!(pid, sandbox, path = %file.display(), "launched in sandbox");
        Ok(pid)
    }

    /// Terminates every program running in `sandbox`.
    pub fn terminate(&self, sandbox: &str) -> Result<()> {
        self.run(&[box_arg(sandbox).into(), "/terminate".into()])
    }

    /// Deletes the contents of `sandbox` without prompting.
    pub fn delete_contents(&self, sandbox: &str) -> Result<()> {
        self.run(&[box_arg(sandbox).into(), "delete_sandbox_silent".into()])
    }

    /// Opens Sandboxie-Plus's manager, which sits next to `Start.exe`.
    pub fn open_manager(&self) -> Result<u32> {
        let start_exe = self.require()?;
        let manager = start_exe.with_file_name(MANAGER_EXE);
        if !manager.is_file() {
            return Err(Error::TargetMissing(manager));
        }
        let child = Command::new(&manager)
            .spawn()
            .map_err(|source| Error::Spawn {
                program: manager.clone(),
                source,
            })?;
        Ok(child.id())
    }

    fn run(&self, args: &[OsString]) -> Result<()> {
        let start_exe = self.require()?;
        let status = Command::new(start_exe)
            .args(args)
            .status()
            .map_err(|source| Error::Spawn {
                program: start_exe.to_path_buf(),
                source,
            })?;
        if !status.success() {
            return Err(Error::ToolFailed {
                program: start_exe.to_path_buf(),
                status,
            });
        }
        Ok(())
    }

    fn require(&self) -> Result<&Path> {
        self.start_exe.as_deref().ok_or(Error::ToolAbsent)
    }
}

pub fn box_arg(sandbox: &str) -> String {
    format!("/box:{}", sandbox)
}

/// `/box:<name> <file>`, the two positional arguments `Start.exe` expects.
pub fn launch_args(sandbox: &str, file: &Path) -> [OsString; 2] {
    [box_arg(sandbox).into(), file.as_os_str().to_os_string()]
}
