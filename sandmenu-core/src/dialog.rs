use std::path::PathBuf;

use crate::error::{Error, Result};

/// Forces UTF-8 on stdout so non-ASCII folder names survive the console code page.
#[cfg_attr(not(windows), allow(dead_code))]
const PICK_FOLDER_SCRIPT: &str = r#"
[Console]::OutputEncoding = [System.Text.Encoding]::UTF8
[System.Reflection.Assembly]::LoadWithPartialName('System.windows.forms') | Out-Null
$folder = New-Object System.Windows.Forms.FolderBrowserDialog
$folder.Description = "Select a folder containing programs"
$folder.ShowNewFolderButton = $false
$result = $folder.ShowDialog()
if ($result -eq 'OK') {
    Write-Output $folder.SelectedPath
}
"#;

/// Shows the native folder browser and blocks until it closes.
#[cfg(windows)]
pub fn pick_folder() -> Result<PathBuf> {
    use std::os::windows::process::CommandExt;
    use std::process::Command;

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    let output = Command::new("powershell")
        .args(["-NoProfile", "-STA", "-Command", PICK_FOLDER_SCRIPT])
        .creation_flags(CREATE_NO_WINDOW)
        .output()
        .map_err(|e| Error::DialogFailed(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::DialogFailed(stderr.trim().to_string()));
    }
    parse_picker_output(&output.stdout)
}

#[cfg(not(windows))]
pub fn pick_folder() -> Result<PathBuf> {
    Err(Error::DialogUnavailable)
}

/// The picker prints the chosen path, or nothing when cancelled.
pub fn parse_picker_output(stdout: &[u8]) -> Result<PathBuf> {
    let text = String::from_utf8_lossy(stdout);
    let path = text.trim_start_matches('\u{feff}').trim();
    if path.is_empty() {
        return Err(Error::DialogCancelled);
    }
    Ok(PathBuf::from(path))
}
