use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub const DEFAULT_BOX: &str = "DefaultBox";
/// Lets Sandboxie prompt for the box at launch time.
pub const ASK_BOX: &str = "__ask__";
pub const SENTINEL_BOXES: [&str; 2] = [DEFAULT_BOX, ASK_BOX];

const APP_DIR_NAME: &str = "SandboxieStartMenu";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, deserialize_with = "null_as_default")]
    pub folder_paths: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_folder: String,
    #[serde(
        default = "default_selected_sandbox",
        deserialize_with = "null_as_default_box"
    )]
    pub selected_sandbox: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub available_sandboxes: Vec<String>,
}

fn default_selected_sandbox() -> String {
    DEFAULT_BOX.to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default_box<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_selected_sandbox))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folder_paths: Vec::new(),
            current_folder: String::new(),
            selected_sandbox: default_selected_sandbox(),
            available_sandboxes: SENTINEL_BOXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR_NAME))
    }

    /// Folders that are always tracked: the common Start Menu programs folder
    /// and the user's desktop, each only if it exists.
    pub fn default_folders() -> Vec<String> {
        let common_start = std::env::var_os("ProgramData")
            .map(|p| PathBuf::from(p).join("Microsoft\\Windows\\Start Menu\\Programs"));
        existing_folders([common_start, dirs::desktop_dir()].into_iter().flatten())
    }

    pub fn is_tracked(&self, path: &str) -> bool {
        self.folder_paths.iter().any(|p| p == path)
    }

    pub fn is_sentinel_box(name: &str) -> bool {
        SENTINEL_BOXES.contains(&name)
    }

    /// Restores the invariants a hand-edited or older file may have broken.
    pub fn reconcile(&mut self, default_folders: &[String]) {
        dedup_in_order(&mut self.folder_paths);
        dedup_in_order(&mut self.available_sandboxes);
        self.ensure_sentinel_boxes();
        self.ensure_default_folders(default_folders);
        self.ensure_current_folder();
    }

    fn ensure_sentinel_boxes(&mut self) {
        if !self.available_sandboxes.iter().any(|s| s == DEFAULT_BOX) {
            self.available_sandboxes.insert(0, DEFAULT_BOX.to_string());
        }
        if !self.available_sandboxes.iter().any(|s| s == ASK_BOX) {
            self.available_sandboxes.push(ASK_BOX.to_string());
        }
    }

    fn ensure_default_folders(&mut self, default_folders: &[String]) {
        let mut insert_at = 0;
        for folder in default_folders {
            if !self.is_tracked(folder) {
                self.folder_paths.insert(insert_at, folder.clone());
                insert_at += 1;
            }
        }
    }

    fn ensure_current_folder(&mut self) {
        if !self.current_folder.is_empty() && !self.is_tracked(&self.current_folder) {
            debug!(folder = %self.current_folder, "current folder is no longer tracked");
            self.current_folder.clear();
        }
        if self.current_folder.is_empty() {
            if let Some(first) = self.folder_paths.first() {
                self.current_folder = first.clone();
            }
        }
    }
}

/// Keeps the candidates that exist on disk, in the order given.
pub fn existing_folders<I>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = PathBuf>,
{
    candidates
        .into_iter()
        .filter(|p| p.exists())
        .map(|p| p.to_string_lossy().to_string())
        .collect()
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = Vec::with_capacity(items.len());
    items.retain(|item| {
        if seen.contains(item) {
            false
        } else {
            seen.push(item.clone());
            true
        }
    });
}

/// The on-disk configuration plus the default folders it must keep.
///
/// Every mutation rewrites the whole file. A mutation whose write fails is
/// rolled back in memory, so the store never drifts from what was reported.
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
    default_folders: Vec<String>,
}

impl ConfigStore {
    /// Opens the per-user store, creating it with defaults on first run.
    pub fn open() -> Result<Self> {
        let dir = Config::config_dir().ok_or(Error::NoConfigDir)?;
        Ok(Self::open_in(&dir, Config::default_folders()))
    }

    pub fn open_in(dir: &Path, default_folders: Vec<String>) -> Self {
        let path = dir.join(CONFIG_FILE_NAME);

        let (config, first_run) = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Config>(&content) {
                Ok(config) => (config, false),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "config is not valid JSON, using defaults");
                    (Config::default(), false)
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => (Config::default(), true),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config is unreadable, using defaults");
                (Config::default(), false)
            }
        };

        let mut store = Self {
            path,
            config,
            default_folders,
        };
        store.config.reconcile(&store.default_folders);

        if first_run {
            info!(path = %store.path.display(), "creating initial config");
            if let Err(err) = store.save() {
                warn!(error = %err, "failed to write initial config");
            }
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn snapshot(&self) -> Config {
        self.config.clone()
    }

    pub fn is_default_folder(&self, path: &str) -> bool {
        self.default_folders.iter().any(|f| f == path)
    }

    /// Tracks a folder and makes it current. Already tracked is a no-op.
    pub fn add_folder(&mut self, path: &str) -> Result<()> {
        self.mutate(|config| {
            if config.is_tracked(path) {
                return false;
            }
            config.folder_paths.push(path.to_string());
            config.current_folder = path.to_string();
            true
        })
    }

    /// Stops tracking a folder. Default folders and untracked paths are left alone.
    pub fn remove_folder(&mut self, path: &str) -> Result<()> {
        if self.is_default_folder(path) {
            debug!(path, "refusing to remove a default folder");
            return Ok(());
        }
        self.mutate(|config| {
            let Some(index) = config.folder_paths.iter().position(|p| p == path) else {
                return false;
            };
            config.folder_paths.remove(index);
            if config.current_folder == path {
                config.current_folder = config.folder_paths.first().cloned().unwrap_or_default();
            }
            true
        })
    }

    pub fn set_current_folder(&mut self, path: &str) -> Result<()> {
        if !path.is_empty() && !self.config.is_tracked(path) {
            return Err(Error::NotTracked(PathBuf::from(path)));
        }
        self.mutate(|config| {
            if config.current_folder == path {
                return false;
            }
            config.current_folder = path.to_string();
            true
        })
    }

    /// Any name is accepted, listed or not.
    pub fn set_selected_sandbox(&mut self, name: &str) -> Result<()> {
        self.mutate(|config| {
            if config.selected_sandbox == name {
                return false;
            }
            config.selected_sandbox = name.to_string();
            true
        })
    }

    pub fn add_sandbox(&mut self, name: &str) -> Result<()> {
        self.mutate(|config| {
            if config.available_sandboxes.iter().any(|s| s == name) {
                return false;
            }
            config.available_sandboxes.push(name.to_string());
            true
        })
    }

    /// Sentinel names stay; removing them is a silent no-op.
    pub fn remove_sandbox(&mut self, name: &str) -> Result<()> {
        if Config::is_sentinel_box(name) {
            debug!(sandbox = name, "refusing to remove a reserved sandbox name");
            return Ok(());
        }
        self.mutate(|config| {
            let before = config.available_sandboxes.len();
            config.available_sandboxes.retain(|s| s != name);
            config.available_sandboxes.len() != before
        })
    }

    /// Writes the whole document through a temp file.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        let content = serde_json::to_string_pretty(&self.config)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).map_err(|e| Error::io(&tmp_path, e))?;
        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::io(&self.path, err));
        }
        Ok(())
    }

    fn mutate(&mut self, apply: impl FnOnce(&mut Config) -> bool) -> Result<()> {
        let previous = self.config.clone();
        if !apply(&mut self.config) {
            return Ok(());
        }
        if let Err(err) = self.save() {
            self.config = previous;
            return Err(err);
        }
        Ok(())
    }
}
