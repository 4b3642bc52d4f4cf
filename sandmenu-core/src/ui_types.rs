use serde::{Deserialize, Serialize};

use crate::folder::{DirEntry, EntryKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl From<DirEntry> for FileInfo {
    fn from(entry: DirEntry) -> Self {
        Self {
            name: entry.name,
            path: entry.path.to_string_lossy().to_string(),
            is_dir: entry.kind.is_folder(),
            kind: entry.kind,
            icon: None,
        }
    }
}

/// Everything a front end needs to redraw after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub folder_paths: Vec<String>,
    pub current_folder: String,
    pub location: String,
    pub files: Vec<FileInfo>,
    pub selected_sandbox: String,
    pub available_sandboxes: Vec<String>,
    pub sandbox_available: bool,
    pub can_go_back: bool,
}
