use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use tracing::{info, warn};

use crate::config::ConfigStore;
use crate::dialog;
use crate::error::{Error, Result};
use crate::folder;
use crate::icon::{IconCache, IconSource, PlatformIconSource};
use crate::sandbox::{LaunchOutcome, SandboxTool};
use crate::ui_types::{AppState, FileInfo};

/// Composes the config store, directory lister, sandbox adapter and icon
/// cache. Each action returns a fresh snapshot; a failed action leaves the
/// previous state in place.
///
/// `location` is the directory being browsed. It starts at the current folder
/// and moves with `open_folder`/`go_back`, but is never persisted.
pub struct Launcher<S = PlatformIconSource> {
    store: ConfigStore,
    tool: SandboxTool,
    icons: IconCache<S>,
    location: String,
}

impl Launcher {
    /// Loads the per-user config and probes for Sandboxie.
    pub fn open() -> Result<Self> {
        Ok(Self::new(
            ConfigStore::open()?,
            SandboxTool::detect(),
            IconCache::default(),
        ))
    }
}

impl<S: IconSource> Launcher<S> {
    pub fn new(store: ConfigStore, tool: SandboxTool, icons: IconCache<S>) -> Self {
        let location = store.config().current_folder.clone();
        Self {
            store,
            tool,
            icons,
            location,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn tool(&self) -> &SandboxTool {
        &self.tool
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn state(&self) -> AppState {
        let config = self.store.config();
        AppState {
            folder_paths: config.folder_paths.clone(),
            current_folder: config.current_folder.clone(),
            location: self.location.clone(),
            files: self.list_location(),
            selected_sandbox: config.selected_sandbox.clone(),
            available_sandboxes: config.available_sandboxes.clone(),
            sandbox_available: self.tool.is_available(),
            can_go_back: self.can_go_back(),
        }
    }

    fn list_location(&self) -> Vec<FileInfo> {
        if self.location.is_empty() {
            return Vec::new();
        }
        match folder::list_directory(Path::new(&self.location)) {
            Ok(entries) => entries.into_iter().map(FileInfo::from).collect(),
            Err(err) => {
                warn!(location = %self.location, error = %err, "failed to list folder");
                Vec::new()
            }
        }
    }

    /// Tracks a folder and starts browsing it.
    pub fn select_folder(&mut self, path: &str) -> Result<AppState> {
        folder::validate_directory(Path::new(path))?;
        self.store.add_folder(path)?;
        self.store.set_current_folder(path)?;
        self.location = path.to_string();
        Ok(self.state())
    }

    pub fn pick_folder(&mut self) -> Result<AppState> {
        let picked = dialog::pick_folder()?;
        self.select_folder(&picked.to_string_lossy())
    }

    pub fn set_current_folder(&mut self, path: &str) -> Result<AppState> {
        self.store.set_current_folder(path)?;
        self.location = path.to_string();
        Ok(self.state())
    }

    /// Untracks a folder. Browsing inside it falls back to the current folder.
    pub fn remove_folder(&mut self, path: &str) -> Result<AppState> {
        let before = self.store.config().current_folder.clone();
        self.store.remove_folder(path)?;
        let config = self.store.config();
        let inside_removed =
            !config.is_tracked(path) && Path::new(&self.location).starts_with(path);
        if config.current_folder != before || inside_removed {
            self.location = config.current_folder.clone();
        }
        Ok(self.state())
    }

    pub fn set_selected_sandbox(&mut self, name: &str) -> Result<AppState> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::BlankSandboxName);
        }
        self.store.set_selected_sandbox(name)?;
        Ok(self.state())
    }

    pub fn add_sandbox(&mut self, name: &str) -> Result<AppState> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::BlankSandboxName);
        }
        self.store.add_sandbox(name)?;
        Ok(self.state())
    }

    pub fn remove_sandbox(&mut self, name: &str) -> Result<AppState> {
        self.store.remove_sandbox(name)?;
        Ok(self.state())
    }

    pub fn is_sandbox_available(&self) -> bool {
        self.tool.is_available()
    }

    /// Launches `path` in the selected sandbox.
    pub fn launch(&self, path: &str) -> LaunchOutcome {
        let sandbox = self.store.config().selected_sandbox.clone();
        self.launch_in(path, &sandbox)
    }

    pub fn launch_in(&self, path: &str, sandbox: &str) -> LaunchOutcome {
        match self.tool.launch(Path::new(path), sandbox) {
            Ok(pid) => LaunchOutcome::launched(pid),
            Err(err) => {
                warn!(path, sandbox, error = %err, "launch failed");
                LaunchOutcome::failed(&err)
            }
        }
    }

    /// Browses into a folder without touching the tracked list.
    pub fn open_folder(&mut self, path: &str) -> Result<AppState> {
        folder::validate_directory(Path::new(path))?;
        self.location = path.to_string();
        Ok(self.state())
    }

    pub fn go_back(&mut self) -> Result<AppState> {
        let Some(parent) = folder::parent_for_navigation(&self.location) else {
            return Ok(self.state());
        };
        folder::validate_directory(&parent)?;
        self.location = parent.to_string_lossy().to_string();
        Ok(self.state())
    }

    pub fn can_go_back(&self) -> bool {
        if self.location.is_empty() {
            return false;
        }
        folder::parent_for_navigation(&self.location)
            .is_some_and(|parent| folder::validate_directory(&parent).is_ok())
    }

    pub fn file_icon(&self, path: &str) -> Option<String> {
        self.icons.get(path)
    }

    pub fn file_icons(&self, paths: &[String]) -> HashMap<String, String> {
        self.icons.get_batch(paths)
    }

    pub fn terminate_sandbox(&self, name: &str) -> Result<()> {
        self.tool.terminate(name)
    }

    pub fn delete_sandbox_contents(&self, name: &str) -> Result<()> {
        self.tool.delete_contents(name)
    }

    pub fn open_manager(&self) -> Result<u32> {
        self.tool.open_manager()
    }

    pub fn config_path(&self) -> &Path {
        self.store.path()
    }

    /// Opens the config file with the system's default handler, writing it
    /// first if it does not exist yet.
    pub fn open_config_file(&self) -> Result<()> {
        let path = self.store.path();
        if !path.exists() {
            self.store.save()?;
        }
        let mut command = open_with_default_handler(path);
        command.spawn().map_err(|source| Error::Spawn {
            program: command.get_program().into(),
            source,
        })?;
        info!(path = %path.display(), "opened config file");
        Ok(())
    }
}

#[cfg(windows)]
fn open_with_default_handler(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/c", "start", ""]).arg(path);
    command
}

#[cfg(target_os = "macos")]
fn open_with_default_handler(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg(path);
    command
}

#[cfg(not(any(windows, target_os = "macos")))]
fn open_with_default_handler(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}
