//! Send payload files through a wallet and mine the results.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use powchain_chain::{ChainConfig, Ledger, Miner, Wallet};
use powchain_core::Block;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

#[derive(Args)]
pub struct RunArgs {
    /// Payload files, sent in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// JSON configuration file (defaults apply if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the resulting chain as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => ChainConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ChainConfig::default(),
    };

    let ledger = replay(&args.files, config, !args.json)?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(ledger.chain()).context("Failed to serialize chain")?
        );
        return Ok(());
    }

    println!("{}", "Current chain:".bold().cyan());
    println!();
    for (height, block) in ledger.chain().iter().enumerate() {
        print_block(height, block);
    }

    println!(
        "  Genesis hash: {}",
        ledger.genesis().hash().to_hex().bright_yellow()
    );
    println!(
        "  Last hash:    {}",
        ledger.last().hash().to_hex().bright_yellow()
    );
    println!();

    Ok(())
}

/// Send every file through one seeded wallet, mining each time a full batch
/// is pending. Leftover transactions stay in the pool.
fn replay(files: &[PathBuf], config: ChainConfig, verbose: bool) -> Result<Ledger> {
    let mut ledger = Ledger::new(config).context("Invalid configuration")?;
    let mut wallet = Wallet::for_ledger(&ledger, ledger.config().rng_seed.clone());
    let mut miner = Miner::for_ledger(&ledger);

    if verbose {
        println!("{}", "Starting ledger...".bold().cyan());
        println!();
        println!("  Wallet: {}", short_hex(&wallet.address().to_hex()).bright_yellow());
        println!();
    }

    for file in files {
        let payload =
            fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

        let outcome = wallet.send(&mut ledger, payload);
        if verbose {
            match &outcome {
                Ok(tx_hash) => println!(
                    "{}  Sent {} ({})",
                    "✓".green().bold(),
                    file.display().to_string().bright_black(),
                    short_hex(&tx_hash.to_hex()).bright_yellow()
                ),
                Err(e) => println!(
                    "{}  Rejected {}: {}",
                    "✗".red().bold(),
                    file.display().to_string().bright_black(),
                    e
                ),
            }
        }
        if let Err(e) = outcome {
            warn!(file = %file.display(), error = %e, "transaction rejected");
            continue;
        }

        if ledger.pool().len() >= miner.batch_size() {
            let block_hash = miner.mine(&mut ledger).context("Mining failed")?;
            if verbose {
                println!(
                    "{}  Mined block #{} ({})",
                    "✓".green().bold(),
                    ledger.height(),
                    short_hex(&block_hash.to_hex()).bright_yellow()
                );
            }
        }
    }

    if verbose {
        let pending = ledger.pool().len();
        if pending > 0 {
            println!(
                "  {} transaction(s) left pending (batch size {})",
                pending.to_string().bright_cyan(),
                miner.batch_size()
            );
        }
        println!();
    }

    Ok(ledger)
}

fn print_block(height: usize, block: &Block) {
    let header = &block.header;
    let time = DateTime::<Utc>::from_timestamp(i64::from(header.timestamp), 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| header.timestamp.to_string());

    println!("  {}", format!("#{}", height).bright_black());
    println!("    Version:     {}", header.version);
    println!("    Previous:    {}", header.prev.to_hex().bright_black());
    println!("    Merkle root: {}", header.txn_root.to_hex().bright_black());
    println!("    Timestamp:   {} ({})", header.timestamp, time);
    println!("    Target:      {}", header.target.to_string().bright_cyan());
    println!("    Nonce:       {}", header.nonce);
    println!(
        "    Hash:        {}",
        block.hash().to_hex().bright_yellow()
    );
    println!();
}

fn short_hex(hex: &str) -> &str {
    &hex[..hex.len().min(18)]
}
