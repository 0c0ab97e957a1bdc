//! Wallets: a keypair plus the nonce source used to sign with it.

use crate::ledger::{Ledger, Result};
use powchain_core::{
    Blake3, Concatenator, Digest, GroupParams, HashRng, Hasher, Keypair, PublicKey, Transaction,
    UnifiedConcat,
};
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;
use tracing::debug;

/// Signs payloads and sends them to a ledger.
///
/// The private key is drawn from the wallet's own generator at construction;
/// later draws from the same generator supply the signing nonces. Two wallets
/// built from the same seed produce identical keys and signatures. The
/// hasher and concatenator must match the ledger's for its signature check
/// to pass.
#[derive(Debug, Clone)]
pub struct Wallet<H: Hasher = Blake3, C: Concatenator = UnifiedConcat> {
    keypair: Keypair,
    params: Arc<GroupParams>,
    hasher: H,
    concat: C,
    rng: HashRng<H, C>,
}

impl Wallet {
    /// A deterministic Blake3 wallet.
    pub fn from_seed(params: Arc<GroupParams>, seed: impl AsRef<[u8]>) -> Self {
        Self::with_parts(Blake3, UnifiedConcat, params, seed)
    }

    /// A Blake3 wallet seeded from the operating system.
    pub fn random(params: Arc<GroupParams>) -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self::from_seed(params, seed)
    }
}

impl<H: Hasher + Clone, C: Concatenator + Clone> Wallet<H, C> {
    /// A deterministic wallet with an explicit hasher and concatenator.
    ///
    /// The same pair drives the key and nonce generator and the signature
    /// challenge.
    pub fn with_parts(
        hasher: H,
        concat: C,
        params: Arc<GroupParams>,
        seed: impl AsRef<[u8]>,
    ) -> Self {
        let mut rng = HashRng::with_parts(seed, hasher.clone(), concat.clone());
        let keypair = Keypair::generate(&params, &mut rng);
        Self {
            keypair,
            params,
            hasher,
            concat,
            rng,
        }
    }

    /// A deterministic wallet sharing the ledger's hasher, concatenator and
    /// group.
    pub fn for_ledger(ledger: &Ledger<H, C>, seed: impl AsRef<[u8]>) -> Self {
        Self::with_parts(
            ledger.hasher().clone(),
            ledger.concat().clone(),
            Arc::clone(ledger.params()),
            seed,
        )
    }
}

impl<H: Hasher, C: Concatenator> Wallet<H, C> {
    /// The wallet's public key, which doubles as its address.
    pub fn address(&self) -> &PublicKey {
        self.keypair.public_key()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Sign a payload into a transaction.
    pub fn sign(&mut self, payload: impl Into<Vec<u8>>) -> Transaction {
        let payload = payload.into();
        let signature = self
            .keypair
            .sign(&self.hasher, &self.concat, &self.params, &payload, &mut self.rng);
        Transaction::new(payload, signature)
    }

    /// Sign a payload and submit it to `ledger` as this wallet.
    pub fn send(
        &mut self,
        ledger: &mut Ledger<H, C>,
        payload: impl Into<Vec<u8>>,
    ) -> Result<Digest> {
        let tx = self.sign(payload);
        let tx_hash = ledger.submit(tx, self.keypair.public_key())?;
        debug!(tx = %tx_hash, "wallet sent transaction");
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;
    use crate::ledger::LedgerError;
    use crate::pool::PoolError;
    use powchain_consensus::ValidationError;
    use powchain_core::LengthPrefixedConcat;

    fn params() -> Arc<GroupParams> {
        Arc::new(GroupParams::default())
    }

    #[test]
    fn test_wallet_is_deterministic() {
        let params = params();
        let mut a = Wallet::from_seed(Arc::clone(&params), "alice");
        let mut b = Wallet::from_seed(Arc::clone(&params), "alice");
        let mut c = Wallet::from_seed(params, "carol");

        assert_eq!(a.address(), b.address());
        assert_ne!(a.address(), c.address());
        assert_eq!(a.sign(b"pay".to_vec()), b.sign(b"pay".to_vec()));
        assert_ne!(a.sign(b"pay".to_vec()).signature(), c.sign(b"pay".to_vec()).signature());
    }

    #[test]
    fn test_signatures_verify_under_own_address() {
        let params = params();
        let mut wallet = Wallet::from_seed(Arc::clone(&params), "signer");
        let tx = wallet.sign("message");

        assert_eq!(tx.payload(), b"message");
        assert!(tx.verify(&Blake3, &UnifiedConcat, &params, wallet.address()));
    }

    #[test]
    fn test_fresh_nonce_per_signature() {
        let mut wallet = Wallet::from_seed(params(), "nonces");
        let first = wallet.sign("same");
        let second = wallet.sign("same");
        assert_ne!(first.signature(), second.signature());
    }

    #[test]
    fn test_random_wallets_differ() {
        let params = params();
        let a = Wallet::random(Arc::clone(&params));
        let b = Wallet::random(params);
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn test_send_goes_through_ledger() {
        let mut ledger = Ledger::new(ChainConfig::default()).unwrap();
        let mut wallet = Wallet::for_ledger(&ledger, "sender");

        let tx_hash = wallet.send(&mut ledger, "hello").unwrap();
        assert_eq!(ledger.pool().len(), 1);
        assert_eq!(ledger.pool()[0].hash(), tx_hash);
    }

    #[test]
    fn test_wrong_sender_rejected() {
        let mut ledger = Ledger::new(ChainConfig::default()).unwrap();
        let mut alice = Wallet::for_ledger(&ledger, "alice");
        let bob = Wallet::for_ledger(&ledger, "bob");

        let tx = alice.sign("from alice");
        assert!(matches!(
            ledger.submit(tx, bob.address()),
            Err(LedgerError::Validation(ValidationError::InvalidSignature))
        ));
        assert!(ledger.pool().is_empty());
    }

    #[test]
    fn test_concatenator_mismatch_rejected() {
        let mut ledger = Ledger::new(ChainConfig::default()).unwrap();
        let mut prefixed = Wallet::with_parts(
            Blake3,
            LengthPrefixedConcat,
            Arc::clone(ledger.params()),
            "prefixed",
        );

        let tx = prefixed.sign("layout");
        assert!(matches!(
            ledger.submit(tx, prefixed.address()),
            Err(LedgerError::Validation(ValidationError::InvalidSignature))
        ));
        assert!(ledger.pool().is_empty());
    }

    #[test]
    fn test_resend_same_payload_rejected() {
        let mut ledger = Ledger::new(ChainConfig::default()).unwrap();
        let mut wallet = Wallet::for_ledger(&ledger, "repeat");

        let tx_hash = wallet.send(&mut ledger, "once").unwrap();
        assert!(matches!(
            wallet.send(&mut ledger, "once"),
            Err(LedgerError::Pool(PoolError::Duplicate(hash))) if hash == tx_hash
        ));
        assert_eq!(ledger.pool().len(), 1);
    }
}
