use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use sandmenu_core::config::{Config, ConfigStore};
use sandmenu_core::folder;
use sandmenu_core::icon::IconCache;
use sandmenu_core::sandbox::SandboxTool;
use sandmenu_core::ui_types::FileInfo;
use sandmenu_core::Launcher;
use serde::Serialize;

use crate::cli::{Cli, Command};

pub fn run(cli: Cli, config_dir: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let config_dir =
        config_dir.context("no per-user config directory available; pass --config-dir")?;
    let store = ConfigStore::open_in(&config_dir, Config::default_folders());
    let tool = match cli.start_exe {
        Some(path) => SandboxTool::at(path),
        None => SandboxTool::detect(),
    };
    let mut launcher: Launcher = Launcher::new(store, tool, IconCache::default());
    tracing::debug!(
        command = ?cli.command,
        sandboxie = launcher.is_sandbox_available(),
        "dispatching command"
    );

    match cli.command {
        Command::State => print_json(&launcher.state())?,
        Command::List { dir } => {
            let dir = match dir {
                Some(dir) => absolute(&dir)?,
                None => launcher.location().to_string(),
            };
            if dir.is_empty() {
                bail!("no folder selected");
            }
            let files: Vec<FileInfo> = folder::list_directory(Path::new(&dir))?
                .into_iter()
                .map(FileInfo::from)
                .collect();
            print_json(&files)?;
        }
        Command::AddFolder { dir } => print_json(&launcher.select_folder(&absolute(&dir)?)?)?,
        Command::PickFolder => print_json(&launcher.pick_folder()?)?,
        Command::RemoveFolder { dir } => {
            print_json(&launcher.remove_folder(&absolute(&dir)?)?)?
        }
        Command::UseFolder { dir } => {
            print_json(&launcher.set_current_folder(&absolute(&dir)?)?)?
        }
        Command::Open { dir } => print_json(&launcher.open_folder(&absolute(&dir)?)?)?,
        Command::Back => print_json(&launcher.go_back()?)?,
        Command::SelectSandbox { name } => print_json(&launcher.set_selected_sandbox(&name)?)?,
        Command::AddSandbox { name } => print_json(&launcher.add_sandbox(&name)?)?,
        Command::RemoveSandbox { name } => print_json(&launcher.remove_sandbox(&name)?)?,
        Command::Launch { file, sandbox } => {
            let file = absolute(&file)?;
            let outcome = match sandbox {
                Some(sandbox) => launcher.launch_in(&file, &sandbox),
                None => launcher.launch(&file),
            };
            print_json(&outcome)?;
            if !outcome.success {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Terminate { name } => {
            launcher.terminate_sandbox(&name)?;
            println!("Terminated programs in {}", name);
        }
        Command::DeleteContents { name } => {
            launcher.delete_sandbox_contents(&name)?;
            println!("Deleted contents of {}", name);
        }
        Command::Manager => {
            let pid = launcher.open_manager()?;
            println!("Sandboxie manager started with PID {}", pid);
        }
        Command::Icon { file } => {
            let file = absolute(&file)?;
            match launcher.file_icon(&file) {
                Some(icon) => println!("{}", icon),
                None => bail!("no icon available for {}", file),
            }
        }
        Command::ConfigPath => println!("{}", launcher.config_path().display()),
        Command::EditConfig => launcher.open_config_file()?,
    }

    Ok(ExitCode::SUCCESS)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolves relative paths against the working directory; the config only
/// holds absolute paths.
fn absolute(path: &str) -> anyhow::Result<String> {
    let resolved = std::path::absolute(path).with_context(|| format!("invalid path: {}", path))?;
    Ok(resolved.to_string_lossy().to_string())
}
