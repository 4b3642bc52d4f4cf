mod cli;
mod commands;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use sandmenu_core::config::Config;

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_dir = cli.config_dir.clone().or_else(Config::config_dir);
    let _guard = logging::init(config_dir.as_deref());

    match commands::run(cli, config_dir) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
