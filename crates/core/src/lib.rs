//! Core ledger primitives for aidledger.
//!
//! This crate provides the fundamental types used throughout the ledger:
//! - SHA-256 hashing over canonical JSON
//! - Ed25519 signing and verification
//! - Secret-based private-key encryption (keystore)
//! - Transactions
//! - Blocks

pub mod block;
pub mod crypto;
pub mod hash;
pub mod keystore;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::Block;
pub use crypto::{CryptoError, Keypair, PublicKey, Signature};
pub use hash::{hash, hash_json, Hash, H256};
pub use keystore::{decrypt_private_key, encrypt_private_key, KeystoreError};
pub use transaction::{Transaction, TransactionError, TransactionType};
