//! Block structure, hashing, and validator signatures.

use crate::crypto::{Keypair, PublicKey, Signature};
use crate::hash::{hash_json, Hash};
use crate::transaction::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A block in the hash-linked chain.
///
/// The stored `hash` is a deterministic function of (index, timestamp,
/// transactions, previous_hash, validator); proposer and verifier both
/// recompute it through [`Block::compute_hash`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block index (0 for genesis).
    pub index: u64,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Ordered transactions included in this block.
    pub transactions: Vec<Transaction>,
    /// Hash of the previous block (`Hash::ZERO` for genesis).
    pub previous_hash: Hash,
    /// Hash of this block's own content.
    pub hash: Hash,
    /// Public key of the proposing validator (None for genesis).
    pub validator: Option<PublicKey>,
    /// Validator signature over the signing bytes (zeroed when unsigned).
    pub signature: Signature,
}

/// Block content covered by the hash.
#[derive(Serialize)]
struct BlockDigest<'a> {
    index: u64,
    timestamp: &'a DateTime<Utc>,
    transactions: &'a [Transaction],
    previous_hash: &'a Hash,
    validator: &'a Option<PublicKey>,
}

impl Block {
    /// Create a new unsigned block with its hash computed.
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        previous_hash: Hash,
        validator: PublicKey,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp: Utc::now(),
            transactions,
            previous_hash,
            hash: Hash::ZERO,
            validator: Some(validator),
            signature: Signature::default(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Create the genesis block: index 0, no transactions, sentinel
    /// previous hash, no validator, unsigned.
    pub fn genesis() -> Self {
        let mut block = Self {
            index: 0,
            timestamp: Utc::now(),
            transactions: Vec::new(),
            previous_hash: Hash::ZERO,
            hash: Hash::ZERO,
            validator: None,
            signature: Signature::default(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Recompute the hash from the block's own fields.
    pub fn compute_hash(&self) -> Hash {
        hash_json(&BlockDigest {
            index: self.index,
            timestamp: &self.timestamp,
            transactions: &self.transactions,
            previous_hash: &self.previous_hash,
            validator: &self.validator,
        })
    }

    /// The preimage signed by the proposing validator: index, stored hash,
    /// round-trippable RFC3339 timestamp, and validator key, pipe-joined.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let validator_hex = self
            .validator
            .as_ref()
            .map(|pk| pk.to_hex())
            .unwrap_or_default();
        format!(
            "{}|{}|{}|{}",
            self.index,
            self.hash.to_hex(),
            self.timestamp.to_rfc3339(),
            validator_hex
        )
        .into_bytes()
    }

    /// Sign the block with the validator's keypair.
    pub fn sign(&mut self, keypair: &Keypair) {
        self.signature = keypair.sign(&self.signing_bytes());
    }

    /// Create a signed block.
    pub fn signed(mut self, keypair: &Keypair) -> Self {
        self.sign(keypair);
        self
    }

    /// Verify the validator signature against the embedded validator key.
    /// A block without a validator key (genesis) never verifies.
    pub fn verify_signature(&self) -> bool {
        match &self.validator {
            Some(pk) => pk.verify(&self.signing_bytes(), &self.signature).is_ok(),
            None => false,
        }
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == Hash::ZERO
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}
