//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod config;
mod run;
mod txn_gen;

#[derive(Subcommand)]
pub enum Commands {
    /// Generate pseudorandom transaction payload files
    TxnGen(txn_gen::TxnGenArgs),
    /// Send payload files through a wallet and mine them into blocks
    Run(run::RunArgs),
    /// Write the default configuration as JSON
    Config(config::ConfigArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::TxnGen(args) => txn_gen::run(args),
        Commands::Run(args) => run::run(args),
        Commands::Config(args) => config::run(args),
    }
}
