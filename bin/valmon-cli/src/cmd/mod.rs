use std::path::PathBuf;

use argh::FromArgs;

use self::{check::CheckArgs, config::ConfigArgs};

pub mod check;
pub mod config;

/// A CLI for checking whether validators keep up with the latest on-chain checkpoint
#[derive(FromArgs, PartialEq, Debug)]
pub struct TopLevel {
    /// path to the TOML config file (default: the platform config dir)
    #[argh(option, long = "config")]
    pub config_file: Option<PathBuf>,

    #[argh(subcommand)]
    pub cmd: Commands,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
pub enum Commands {
    Check(CheckArgs),
    Config(ConfigArgs),
}
