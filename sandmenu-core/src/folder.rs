use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    Exe,
    Bat,
    Cmd,
    Lnk,
}

impl EntryKind {
    pub fn is_folder(self) -> bool {
        self == EntryKind::Folder
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Maps a file name to a launchable kind. Anything outside the allow-list is `None`.
pub fn classify_extension(name: &str) -> Option<EntryKind> {
    let ext = Path::new(name).extension()?.to_string_lossy().to_ascii_lowercase();
    match ext.as_str() {
        "exe" => Some(EntryKind::Exe),
        "bat" => Some(EntryKind::Bat),
        "cmd" => Some(EntryKind::Cmd),
        "lnk" => Some(EntryKind::Lnk),
        _ => None,
    }
}

/// Lists one level of `dir`: subfolders first, then launchable files, each
/// group sorted by name ignoring case.
pub fn list_directory(dir: &Path) -> Result<Vec<DirEntry>> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut entries: Vec<DirEntry> = read_dir
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let path = entry.path();
            let kind = if path.is_dir() {
                EntryKind::Folder
            } else {
                classify_extension(&name)?
            };
            Some(DirEntry { name, path, kind })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.kind
            .is_folder()
            .cmp(&a.kind.is_folder())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    Ok(entries)
}

pub fn validate_directory(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::NotADirectory(path.to_path_buf())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::NotFound(path.to_path_buf()))
        }
        Err(err) => Err(Error::io(path, err)),
    }
}

/// Where "back" leads from `dir`. Roots have nowhere to go, and neither does
/// a bare relative name.
pub fn parent_for_navigation(dir: &str) -> Option<PathBuf> {
    if is_navigation_root(dir) {
        return None;
    }
    Path::new(dir)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Drive roots (`C:\`), UNC share roots (`\\server\share`) and `/`.
/// Either slash style is accepted.
pub fn is_navigation_root(path: &str) -> bool {
    let unified = path.trim().replace('/', "\\");
    let bare = unified.trim_end_matches('\\');
    match bare.as_bytes() {
        [] => true,
        [letter, b':'] => letter.is_ascii_alphabetic(),
        _ => bare
            .strip_prefix("\\\\")
            .is_some_and(|unc| unc.split('\\').filter(|s| !s.is_empty()).count() <= 2),
    }
}
