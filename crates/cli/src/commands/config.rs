//! Write the default configuration.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use powchain_chain::ChainConfig;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigArgs {
    /// Output file (prints to stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let json = ChainConfig::default()
        .to_json_pretty()
        .context("Failed to serialize config")?;

    match args.out {
        Some(path) => {
            fs::write(&path, &json)
                .with_context(|| format!("Failed to write config to {}", path.display()))?;
            println!(
                "{}  Saved config to: {}",
                "✓".green().bold(),
                path.display().to_string().bright_black()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
