use std::path::PathBuf;

use thiserror::Error;

/// Every failure an action can report. None of these are fatal: the action
/// leaves prior state unchanged and the message is shown to the user.
#[derive(Error, Debug)]
pub enum Error {
    #[error("folder not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a folder: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("folder is not tracked: {}", .0.display())]
    NotTracked(PathBuf),

    #[error("Sandboxie is not installed")]
    ToolAbsent,

    #[error("file not found: {}", .0.display())]
    TargetMissing(PathBuf),

    #[error("failed to start {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exited with {status}", .program.display())]
    ToolFailed {
        program: PathBuf,
        status: std::process::ExitStatus,
    },

    #[error("no folder selected")]
    DialogCancelled,

    #[error("folder selection failed: {0}")]
    DialogFailed(String),

    #[error("folder picker is not available on this platform")]
    DialogUnavailable,

    #[error("sandbox name is empty")]
    BlankSandboxName,

    #[error("no config directory available")]
    NoConfigDir,

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
