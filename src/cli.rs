use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "sandmenu",
    version,
    about = "Browse folders of programs and launch them inside a Sandboxie box"
)]
pub struct Cli {
    /// Directory holding config.json (defaults to the per-user app data folder)
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Use this Start.exe instead of probing the standard install paths
    #[arg(long, global = true, value_name = "PATH")]
    pub start_exe: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the current state snapshot
    State,
    /// List the launchable entries of a folder (defaults to the current folder)
    List { dir: Option<String> },
    /// Track a folder and make it current
    AddFolder { dir: String },
    /// Choose a folder with the system dialog and track it
    PickFolder,
    /// Stop tracking a folder
    RemoveFolder { dir: String },
    /// Switch to an already tracked folder
    UseFolder { dir: String },
    /// Browse into a subfolder
    Open { dir: String },
    /// Browse to the parent of the current folder
    Back,
    /// Choose the sandbox used for launches
    SelectSandbox { name: String },
    /// Add a sandbox name to the list
    AddSandbox { name: String },
    /// Remove a sandbox name from the list
    RemoveSandbox { name: String },
    /// Run a program inside a sandbox
    Launch {
        file: String,
        /// Sandbox to use instead of the selected one
        #[arg(long)]
        sandbox: Option<String>,
    },
    /// Terminate every program running in a sandbox
    Terminate { name: String },
    /// Delete a sandbox's contents
    DeleteContents { name: String },
    /// Open the Sandboxie manager
    Manager,
    /// Print a file's icon as a data URL
    Icon { file: String },
    /// Print the location of config.json
    ConfigPath,
    /// Open config.json in the default editor
    EditConfig,
}
