#![deny(clippy::mod_module_files)]

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod graph;
mod run;

fn main() -> Result<ExitCode> {
    let cli = run::Cli::parse();
    let code = run::cli(cli)?;
    Ok(ExitCode::from(code as u8))
}
