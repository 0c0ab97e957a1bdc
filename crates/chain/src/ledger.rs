//! The ledger: an append-only chain of blocks plus the pool that feeds it.
//!
//! Transactions enter the pool only through [`Ledger::submit`], which checks
//! the signature against the claimed sender. Blocks enter the chain only
//! through [`Ledger::append_block`], which checks linkage, commitment, work
//! and that every transaction came from the pool, then consumes those
//! transactions in the same step. A transaction hash is admitted at most
//! once over the life of the ledger.

use crate::config::{ChainConfig, ConfigError};
use crate::pool::{Pool, PoolError, PoolStats};
use powchain_consensus::{BlockValidator, TransactionValidator, ValidationError};
use powchain_core::{
    Blake3, Block, Concatenator, Digest, GroupParams, Hasher, PublicKey, Transaction,
    UnifiedConcat,
};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("block contains a transaction that is not in the pool: {0}")]
    UnpooledTransaction(Digest),

    #[error("block contains the same transaction more than once: {0}")]
    DuplicateTransaction(Digest),

    #[error("transaction already mined: {0}")]
    AlreadyMined(Digest),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Chain of blocks, starting at genesis, plus the pending pool.
#[derive(Debug)]
pub struct Ledger<H: Hasher = Blake3, C: Concatenator = UnifiedConcat> {
    /// Hash function for headers, Merkle nodes and signatures.
    hasher: H,
    /// Layout of the signature challenge input.
    concat: C,
    /// Shared group parameters for signature checks.
    params: Arc<GroupParams>,
    /// Configuration.
    config: ChainConfig,
    /// Blocks in order. Never empty: index 0 is genesis.
    chain: Vec<Block>,
    /// Verified, unmined transactions.
    pool: Pool,
    /// Hashes of every transaction already in a block.
    mined: HashSet<Digest>,
}

impl Ledger {
    /// Create a Blake3 ledger over the default group.
    pub fn new(config: ChainConfig) -> Result<Self> {
        Self::with_parts(Blake3, UnifiedConcat, Arc::new(GroupParams::default()), config)
    }
}

impl<H: Hasher, C: Concatenator> Ledger<H, C> {
    /// Create a ledger with an explicit hasher, challenge layout and group.
    ///
    /// The chain starts with the genesis block and an empty pool.
    pub fn with_parts(
        hasher: H,
        concat: C,
        params: Arc<GroupParams>,
        config: ChainConfig,
    ) -> Result<Self> {
        config.validate()?;

        let genesis = Block::genesis();
        info!(genesis = %genesis.hash_with(&hasher), "ledger created");

        Ok(Self {
            hasher,
            concat,
            params,
            pool: Pool::new(config.pool_capacity),
            config,
            chain: vec![genesis],
            mined: HashSet::new(),
        })
    }

    /// Admit a transaction signed by `sender` into the pool.
    ///
    /// Returns the transaction hash. A hash that is already pending or
    /// already mined is refused. On any error the pool is unchanged.
    pub fn submit(&mut self, tx: Transaction, sender: &PublicKey) -> Result<Digest> {
        let tx_hash = tx.hash_with(&self.hasher);

        if self.mined.contains(&tx_hash) {
            warn!(tx = %tx_hash, "rejected transaction that is already mined");
            return Err(LedgerError::AlreadyMined(tx_hash));
        }

        if let Err(err) = TransactionValidator::validate_signature(
            &self.hasher,
            &self.concat,
            &self.params,
            &tx,
            sender,
        ) {
            warn!(tx = %tx_hash, "rejected transaction with invalid signature");
            return Err(err.into());
        }

        self.pool.add(tx_hash, tx)?;
        debug!(tx = %tx_hash, pending = self.pool.len(), "transaction admitted");
        Ok(tx_hash)
    }

    /// Append a mined block to the chain.
    ///
    /// Checks, in order: the block links to the last block, it commits to
    /// exactly `batch_size` transactions, it carries the current target and
    /// meets it, its transactions are distinct, and each is pending in the
    /// pool. On success the block's transactions leave the pool for good and
    /// the block becomes the new tip. On any error neither the chain nor the
    /// pool changes.
    pub fn append_block(&mut self, block: Block) -> Result<Digest> {
        match self.check_block(&block) {
            Ok((tx_hashes, positions)) => {
                let block_hash = block.hash_with(&self.hasher);
                self.pool.remove_positions(&positions);
                self.mined.extend(tx_hashes);
                self.chain.push(block);
                info!(
                    height = self.height(),
                    hash = %block_hash,
                    pending = self.pool.len(),
                    "block appended"
                );
                Ok(block_hash)
            }
            Err(err) => {
                warn!(error = %err, "rejected block");
                Err(err)
            }
        }
    }

    /// Run every block check and return the block's transaction hashes with
    /// the pool slots they occupy.
    fn check_block(&self, block: &Block) -> Result<(Vec<Digest>, Vec<usize>)> {
        let parent_hash = self.last().hash_with(&self.hasher);
        BlockValidator::validate_full(
            &self.hasher,
            block,
            parent_hash,
            self.config.batch_size,
            self.current_target(),
        )?;

        let tx_hashes: Vec<Digest> = block
            .transactions
            .iter()
            .map(|tx| tx.hash_with(&self.hasher))
            .collect();

        let positions = self
            .pool
            .find_positions(&tx_hashes)
            .map_err(|err| match err {
                PoolError::Duplicate(hash) => LedgerError::DuplicateTransaction(hash),
                PoolError::TransactionNotFound(hash) => LedgerError::UnpooledTransaction(hash),
                other => LedgerError::Pool(other),
            })?;

        Ok((tx_hashes, positions))
    }

    /// Pending transactions, oldest first.
    pub fn pool(&self) -> &[Transaction] {
        self.pool.transactions()
    }

    /// Work target for the next block. Fixed by configuration.
    pub fn current_target(&self) -> u32 {
        self.config.target
    }

    /// All blocks, genesis first.
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn genesis(&self) -> &Block {
        &self.chain[0]
    }

    /// The most recently appended block.
    pub fn last(&self) -> &Block {
        self.chain.last().expect("chain always holds genesis")
    }

    /// Number of blocks after genesis.
    pub fn height(&self) -> u64 {
        (self.chain.len() - 1) as u64
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn concat(&self) -> &C {
        &self.concat
    }

    /// Check if a transaction with this hash is already in a block.
    pub fn is_mined(&self, tx_hash: &Digest) -> bool {
        self.mined.contains(tx_hash)
    }

    pub fn params(&self) -> &Arc<GroupParams> {
        &self.params
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Get ledger statistics.
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            height: self.height(),
            last_hash: self.last().hash_with(&self.hasher),
            target: self.current_target(),
            pool: self.pool.stats(),
        }
    }
}

/// Ledger statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStats {
    /// Number of blocks after genesis.
    pub height: u64,
    /// Hash of the tip.
    pub last_hash: Digest,
    /// Current work target.
    pub target: u32,
    /// Pool statistics.
    pub pool: PoolStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_consensus::BlockProposer;
    use powchain_core::{BlockHeader, HashRng, Keypair};

    const TIMESTAMP: u32 = 1_700_000_000;

    fn test_config() -> ChainConfig {
        ChainConfig {
            batch_size: 3,
            target: 4,
            ..ChainConfig::default()
        }
    }

    fn setup_ledger() -> (Ledger, Keypair, HashRng) {
        let ledger = Ledger::new(test_config()).unwrap();
        let mut rng = HashRng::new("ledger-tests");
        let keypair = Keypair::generate(ledger.params(), &mut rng);
        (ledger, keypair, rng)
    }

    fn signed_tx(ledger: &Ledger, keypair: &Keypair, rng: &mut HashRng, payload: &[u8]) -> Transaction {
        let sig = keypair.sign(ledger.hasher(), ledger.concat(), ledger.params(), payload, rng);
        Transaction::new(payload.to_vec(), sig)
    }

    fn fill_pool(ledger: &mut Ledger, keypair: &Keypair, rng: &mut HashRng, n: usize) {
        for i in 0..n {
            let tx = signed_tx(ledger, keypair, rng, format!("payload-{i}").as_bytes());
            ledger.submit(tx, keypair.public_key()).unwrap();
        }
    }

    fn mine_next(ledger: &Ledger) -> Block {
        let batch = ledger.pool()[..ledger.config().batch_size].to_vec();
        let prev = ledger.last().hash();
        BlockProposer::new(ledger.config().batch_size, 0)
            .propose_block(prev, batch, TIMESTAMP, ledger.current_target())
            .unwrap()
            .0
    }

    #[test]
    fn test_ledger_init() {
        let (ledger, _, _) = setup_ledger();

        assert_eq!(ledger.height(), 0);
        assert_eq!(ledger.chain().len(), 1);
        assert!(ledger.genesis().is_genesis());
        assert_eq!(ledger.last(), ledger.genesis());
        assert!(ledger.pool().is_empty());
        assert_eq!(ledger.current_target(), 4);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ChainConfig {
            batch_size: 0,
            ..ChainConfig::default()
        };
        assert!(matches!(
            Ledger::new(config),
            Err(LedgerError::Config(ConfigError::ZeroBatchSize))
        ));
    }

    #[test]
    fn test_submit_transaction() {
        let (mut ledger, keypair, mut rng) = setup_ledger();
        let tx = signed_tx(&ledger, &keypair, &mut rng, b"hello");
        let expected = tx.hash();

        let tx_hash = ledger.submit(tx.clone(), keypair.public_key()).unwrap();
        assert_eq!(tx_hash, expected);
        assert_eq!(ledger.pool(), &[tx]);
    }

    #[test]
    fn test_submit_rejects_bad_signature() {
        let (mut ledger, keypair, mut rng) = setup_ledger();
        let (_, sig) = signed_tx(&ledger, &keypair, &mut rng, b"hello").into_parts();
        let tx = Transaction::new(b"hellp".to_vec(), sig);

        assert!(matches!(
            ledger.submit(tx, keypair.public_key()),
            Err(LedgerError::Validation(ValidationError::InvalidSignature))
        ));
        assert!(ledger.pool().is_empty());
    }

    #[test]
    fn test_submit_rejects_when_full() {
        let config = ChainConfig {
            batch_size: 1,
            pool_capacity: 1,
            ..test_config()
        };
        let mut ledger = Ledger::new(config).unwrap();
        let mut rng = HashRng::new("full");
        let keypair = Keypair::generate(ledger.params(), &mut rng);

        let first = signed_tx(&ledger, &keypair, &mut rng, b"a");
        let second = signed_tx(&ledger, &keypair, &mut rng, b"b");
        ledger.submit(first, keypair.public_key()).unwrap();

        assert!(matches!(
            ledger.submit(second, keypair.public_key()),
            Err(LedgerError::Pool(PoolError::Full(1)))
        ));
        assert_eq!(ledger.pool().len(), 1);
    }

    #[test]
    fn test_submit_rejects_pending_duplicate() {
        let (mut ledger, keypair, mut rng) = setup_ledger();
        let tx = signed_tx(&ledger, &keypair, &mut rng, b"twice");
        let tx_hash = ledger.submit(tx.clone(), keypair.public_key()).unwrap();

        assert!(matches!(
            ledger.submit(tx, keypair.public_key()),
            Err(LedgerError::Pool(PoolError::Duplicate(hash))) if hash == tx_hash
        ));
        assert_eq!(ledger.pool().len(), 1);
    }

    #[test]
    fn test_submit_rejects_mined_transaction() {
        let (mut ledger, keypair, mut rng) = setup_ledger();
        fill_pool(&mut ledger, &keypair, &mut rng, 3);
        let first = ledger.pool()[0].clone();

        let block = mine_next(&ledger);
        ledger.append_block(block).unwrap();
        assert!(ledger.is_mined(&first.hash()));
        assert!(ledger.pool().is_empty());

        assert!(matches!(
            ledger.submit(first.clone(), keypair.public_key()),
            Err(LedgerError::AlreadyMined(hash)) if hash == first.hash()
        ));
        assert!(ledger.pool().is_empty());
    }

    #[test]
    fn test_append_block_rejects_repeated_transaction() {
        let (mut ledger, keypair, mut rng) = setup_ledger();
        fill_pool(&mut ledger, &keypair, &mut rng, 3);

        let repeated = ledger.pool()[0].clone();
        let batch = vec![repeated.clone(), ledger.pool()[1].clone(), repeated.clone()];
        let (block, _) = BlockProposer::new(3, 0)
            .propose_block(ledger.last().hash(), batch, TIMESTAMP, 4)
            .unwrap();

        assert!(matches!(
            ledger.append_block(block),
            Err(LedgerError::DuplicateTransaction(hash)) if hash == repeated.hash()
        ));
        assert_eq!(ledger.height(), 0);
        assert_eq!(ledger.pool().len(), 3);
        assert!(!ledger.is_mined(&repeated.hash()));
    }

    #[test]
    fn test_append_block_consumes_pool() {
        let (mut ledger, keypair, mut rng) = setup_ledger();
        fill_pool(&mut ledger, &keypair, &mut rng, 4);
        let leftover = ledger.pool()[3].clone();

        let block = mine_next(&ledger);
        let block_hash = ledger.append_block(block.clone()).unwrap();

        assert_eq!(block_hash, block.hash());
        assert_eq!(ledger.height(), 1);
        assert_eq!(ledger.last(), &block);
        assert_eq!(ledger.pool(), &[leftover]);

        let stats = ledger.stats();
        assert_eq!(stats.height, 1);
        assert_eq!(stats.last_hash, block_hash);
        assert_eq!(stats.pool.total_transactions, 1);
    }

    #[test]
    fn test_append_block_rejects_bad_linkage() {
        let (mut ledger, keypair, mut rng) = setup_ledger();
        fill_pool(&mut ledger, &keypair, &mut rng, 3);

        let batch = ledger.pool().to_vec();
        let (block, _) = BlockProposer::new(3, 0)
            .propose_block(Digest([1u8; 32]), batch, TIMESTAMP, 4)
            .unwrap();

        assert!(matches!(
            ledger.append_block(block),
            Err(LedgerError::Validation(ValidationError::InvalidLinkage { .. }))
        ));
        assert_eq!(ledger.height(), 0);
        assert_eq!(ledger.pool().len(), 3);
    }

    #[test]
    fn test_append_block_rejects_unpooled_transaction() {
        let (mut ledger, keypair, mut rng) = setup_ledger();
        fill_pool(&mut ledger, &keypair, &mut rng, 2);

        // Signed but never submitted.
        let stray = signed_tx(&ledger, &keypair, &mut rng, b"stray");
        let mut batch = ledger.pool().to_vec();
        batch.push(stray.clone());

        let (block, _) = BlockProposer::new(3, 0)
            .propose_block(ledger.last().hash(), batch, TIMESTAMP, 4)
            .unwrap();

        assert!(matches!(
            ledger.append_block(block),
            Err(LedgerError::UnpooledTransaction(hash)) if hash == stray.hash()
        ));
        assert_eq!(ledger.height(), 0);
        assert_eq!(ledger.pool().len(), 2);
    }

    #[test]
    fn test_append_block_rejects_wrong_target() {
        let (mut ledger, keypair, mut rng) = setup_ledger();
        fill_pool(&mut ledger, &keypair, &mut rng, 3);

        let batch = ledger.pool().to_vec();
        let (block, _) = BlockProposer::new(3, 0)
            .propose_block(ledger.last().hash(), batch, TIMESTAMP, 2)
            .unwrap();

        assert!(matches!(
            ledger.append_block(block),
            Err(LedgerError::Validation(ValidationError::TargetMismatch {
                expected: 4,
                got: 2
            }))
        ));
    }

    #[test]
    fn test_append_block_rejects_unsolved_header() {
        let (mut ledger, keypair, mut rng) = setup_ledger();
        fill_pool(&mut ledger, &keypair, &mut rng, 3);

        let mut block = mine_next(&ledger);
        while block.hash().leading_zero_bits() >= 4 {
            block.header.nonce = block.header.nonce.wrapping_add(1);
        }

        assert!(matches!(
            ledger.append_block(block),
            Err(LedgerError::Validation(ValidationError::InsufficientWork { .. }))
        ));
        assert_eq!(ledger.pool().len(), 3);
    }

    #[test]
    fn test_genesis_cannot_be_reappended() {
        let (mut ledger, _, _) = setup_ledger();
        let mut genesis = Block::genesis();
        genesis.header = BlockHeader {
            prev: ledger.last().hash(),
            ..BlockHeader::default()
        };

        assert!(ledger.append_block(genesis).is_err());
        assert_eq!(ledger.height(), 0);
    }
}
