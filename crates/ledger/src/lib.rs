//! Ledger orchestration for aidledger.
//!
//! Brings the layers together: the hash-linked chain with its pending
//! pool, synchronous smart-contract dispatch at transaction admission, and
//! the proof-of-authority proposal/commit cycle.
//!
//! # Example
//!
//! ```rust,no_run
//! use aidledger_consensus::{PoaEngine, SelectionStrategy, ValidatorDirectory};
//! use aidledger_contracts::{ContractEngine, ShipmentTrackingContract};
//! use aidledger_core::{Keypair, Transaction, TransactionType};
//! use aidledger_ledger::{Ledger, LedgerConfig};
//! use serde_json::json;
//!
//! let mut contracts = ContractEngine::new();
//! contracts.register(Box::new(ShipmentTrackingContract::new()));
//! let mut ledger = Ledger::new(contracts, LedgerConfig::default());
//!
//! let mut validators = ValidatorDirectory::new(SelectionStrategy::RoundRobin);
//! let keypair = Keypair::generate();
//! validators.register("validator-0", &keypair, "unlock-secret", 0, "depot").unwrap();
//!
//! let tx = Transaction::new(
//!     TransactionType::ShipmentCreated,
//!     keypair.public_key.clone(),
//!     json!({ "shipmentId": "SHIP-1", "items": ["rice"] }),
//! ).signed(&keypair);
//! ledger.submit_transaction(tx).unwrap();
//!
//! let poa = PoaEngine::new();
//! let block = ledger.propose_block(&poa, &mut validators, "unlock-secret").unwrap();
//! assert!(poa.validate_block(&block, ledger.last_block()));
//! ledger.commit_block(block).unwrap();
//! ```

pub mod ledger;

// Re-export commonly used types
pub use ledger::{Ledger, LedgerConfig, LedgerError};
