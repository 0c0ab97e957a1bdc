//! Ledger orchestration for powchain.
//!
//! This crate ties the core types and consensus rules together:
//! - **Ledger**: the chain of blocks and the only gate into it
//! - **Pool**: verified transactions waiting to be mined
//! - **Wallet**: signs payloads and submits them to a ledger
//! - **Miner**: batches pool transactions into proof-of-work blocks
//! - **Config**: JSON-loadable ledger settings
//!
//! # Example
//!
//! ```rust
//! use powchain_chain::{ChainConfig, Ledger, Miner, Wallet};
//!
//! let config = ChainConfig {
//!     batch_size: 2,
//!     target: 4,
//!     ..ChainConfig::default()
//! };
//! let mut ledger = Ledger::new(config).unwrap();
//! let mut wallet = Wallet::for_ledger(&ledger, "alice");
//! let mut miner = Miner::for_ledger(&ledger);
//!
//! wallet.send(&mut ledger, "first").unwrap();
//! wallet.send(&mut ledger, "second").unwrap();
//! let block_hash = miner.mine(&mut ledger).unwrap();
//!
//! assert_eq!(ledger.last().hash(), block_hash);
//! assert!(ledger.pool().is_empty());
//! ```

pub mod config;
pub mod ledger;
pub mod miner;
pub mod pool;
pub mod wallet;

// Re-export commonly used types
pub use config::{ChainConfig, ConfigError};
pub use ledger::{Ledger, LedgerError, LedgerStats};
pub use miner::{Miner, MinerError};
pub use pool::{Pool, PoolError, PoolStats};
pub use wallet::Wallet;
