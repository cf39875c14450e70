//! Proof of Authority consensus for aidledger.
//!
//! This crate provides:
//! - The validator directory: authorized signers, priority ordering, and
//!   pluggable proposer selection (round-robin / random)
//! - The PoA engine: block proposal (select, package, hash, sign, record
//!   stats) and pure block validation against a predecessor
//!
//! # Example
//!
//! ```rust,no_run
//! use aidledger_consensus::{PoaEngine, SelectionStrategy, ValidatorDirectory};
//! use aidledger_core::{Block, Keypair, Transaction, TransactionType};
//! use serde_json::json;
//!
//! let mut validators = ValidatorDirectory::new(SelectionStrategy::RoundRobin);
//! let keypair = Keypair::generate();
//! validators.register("validator-0", &keypair, "unlock-secret", 0, "warehouse-a").unwrap();
//!
//! let genesis = Block::genesis();
//! let tx = Transaction::new(
//!     TransactionType::ShipmentCreated,
//!     keypair.public_key.clone(),
//!     json!({ "shipmentId": "SHIP-1", "items": ["rice"] }),
//! ).signed(&keypair);
//!
//! let engine = PoaEngine::new();
//! let block = engine
//!     .propose_block(&genesis, &[tx], &mut validators, "unlock-secret")
//!     .unwrap();
//! assert!(engine.validate_block(&block, &genesis));
//! ```

pub mod poa;
pub mod validator;

// Re-export commonly used types
pub use poa::{ConsensusError, PoaEngine};
pub use validator::{DirectoryError, SelectionStrategy, Validator, ValidatorDirectory};
