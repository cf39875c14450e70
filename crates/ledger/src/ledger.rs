//! The append-only ledger: hash-linked chain plus pending pool.
//!
//! Transaction admission triggers synchronous contract dispatch, so
//! contract-tracked projections are observable immediately — before any
//! block exists. Block validation belongs to the consensus engine and is
//! invoked by the caller before commit.

use aidledger_contracts::{ContractEngine, ContractOutcome, ContractState, EngineError, StateValue};
use aidledger_consensus::{ConsensusError, PoaEngine, ValidatorDirectory};
use aidledger_core::{Block, Transaction};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("transaction signature verification failed")]
    InvalidTransactionSignature,

    #[error("block signature verification failed")]
    InvalidBlockSignature,

    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("contract engine error: {0}")]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Signature-enforcement toggles.
///
/// Both default on; switching one off is intended for trusted or test
/// contexts only.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Check transaction signatures at admission.
    pub enforce_transaction_signatures: bool,
    /// Check validator signatures at block commit.
    pub enforce_block_signatures: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            enforce_transaction_signatures: true,
            enforce_block_signatures: true,
        }
    }
}

impl LedgerConfig {
    /// A configuration with both signature checks disabled, for trusted or
    /// test contexts.
    pub fn unenforced() -> Self {
        Self {
            enforce_transaction_signatures: false,
            enforce_block_signatures: false,
        }
    }
}

/// The ledger: chain, pending pool, and the contract engine notified on
/// every admission. Single-writer semantics; callers serialize access.
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    engine: ContractEngine,
    config: LedgerConfig,
}

impl Ledger {
    /// Create a ledger with its genesis block and the given contract
    /// engine. The chain is never empty.
    pub fn new(engine: ContractEngine, config: LedgerConfig) -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending: Vec::new(),
            engine,
            config,
        }
    }

    /// The full chain, ordered from genesis.
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// The latest block.
    pub fn last_block(&self) -> &Block {
        self.chain.last().expect("chain is never empty")
    }

    /// Index of the latest block.
    pub fn height(&self) -> u64 {
        self.last_block().index
    }

    /// The pending-transaction pool, in admission order.
    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Submit a transaction for admission.
    ///
    /// Rejected if signature enforcement is on and the signature does not
    /// verify; otherwise the transaction joins the pending pool and is
    /// dispatched synchronously to every applicable contract. The returned
    /// outcomes are the audit record of that dispatch — a failed contract
    /// execution does not veto admission.
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<Vec<ContractOutcome>> {
        self.submit_transaction_with_context(tx, None)
    }

    /// Submit a transaction along with auxiliary dispatch data (e.g. an
    /// externally scanned QR code for delivery verification).
    pub fn submit_transaction_with_context(
        &mut self,
        tx: Transaction,
        aux: Option<Value>,
    ) -> Result<Vec<ContractOutcome>> {
        if self.config.enforce_transaction_signatures && tx.verify().is_err() {
            tracing::warn!(tx = %tx.id, "transaction rejected: bad signature");
            return Err(LedgerError::InvalidTransactionSignature);
        }

        tracing::info!(tx = %tx.id, tx_type = ?tx.tx_type, "transaction admitted");
        let outcomes = self
            .engine
            .dispatch(&tx, Some(self.chain.as_slice()), aux.as_ref());
        self.pending.push(tx);
        Ok(outcomes)
    }

    /// Ask the consensus engine for a block built from the current pending
    /// snapshot on top of the chain tip. Proposal does not mutate the
    /// ledger; commit it explicitly with [`Ledger::commit_block`].
    pub fn propose_block(
        &self,
        engine: &PoaEngine,
        validators: &mut ValidatorDirectory,
        secret: &str,
    ) -> Result<Block> {
        let block = engine.propose_block(self.last_block(), &self.pending, validators, secret)?;
        Ok(block)
    }

    /// Commit a block to the chain.
    ///
    /// When block-signature enforcement is on, the validator signature is
    /// checked; hash and linkage re-validation is the caller's
    /// responsibility via [`PoaEngine::validate_block`] before commit. The
    /// block's transactions are cleared from the pending pool.
    pub fn commit_block(&mut self, block: Block) -> Result<()> {
        if self.config.enforce_block_signatures && !block.verify_signature() {
            tracing::warn!(index = block.index, "block rejected: bad validator signature");
            return Err(LedgerError::InvalidBlockSignature);
        }

        let committed: Vec<_> = block.transactions.iter().map(|tx| tx.id).collect();
        self.pending.retain(|tx| !committed.contains(&tx.id));
        tracing::info!(
            index = block.index,
            tx_count = block.tx_count(),
            "block committed"
        );
        self.chain.push(block);
        Ok(())
    }

    /// Read a contract's full persistent state.
    pub fn contract_state(&self, contract_id: &str) -> Option<&ContractState> {
        self.engine.state(contract_id)
    }

    /// Administratively seed a contract-state entry.
    pub fn seed_contract_state(
        &mut self,
        contract_id: &str,
        key: impl Into<String>,
        value: impl Into<StateValue>,
    ) -> Result<()> {
        self.engine.seed_state(contract_id, key, value)?;
        Ok(())
    }

    /// The contract engine, read-only.
    pub fn contract_engine(&self) -> &ContractEngine {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aidledger_consensus::SelectionStrategy;
    use aidledger_core::{Keypair, TransactionType};
    use serde_json::json;

    fn shipment_tx(kp: &Keypair) -> Transaction {
        Transaction::new(
            TransactionType::ShipmentCreated,
            kp.public_key.clone(),
            json!({ "shipmentId": "SHIP-1", "items": ["rice"] }),
        )
    }

    fn ledger() -> Ledger {
        Ledger::new(ContractEngine::new(), LedgerConfig::default())
    }

    #[test]
    fn test_ledger_starts_with_genesis() {
        let ledger = ledger();
        assert_eq!(ledger.chain().len(), 1);
        assert_eq!(ledger.height(), 0);
        assert!(ledger.last_block().is_genesis());
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn test_signed_transaction_admitted() {
        let mut ledger = ledger();
        let kp = Keypair::generate();
        let tx = shipment_tx(&kp).signed(&kp);

        assert!(ledger.submit_transaction(tx).is_ok());
        assert_eq!(ledger.pending().len(), 1);
    }

    #[test]
    fn test_unsigned_transaction_rejected_when_enforced() {
        let mut ledger = ledger();
        let kp = Keypair::generate();

        let result = ledger.submit_transaction(shipment_tx(&kp));
        assert!(matches!(
            result,
            Err(LedgerError::InvalidTransactionSignature)
        ));
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn test_unsigned_transaction_admitted_when_unenforced() {
        let mut ledger = Ledger::new(ContractEngine::new(), LedgerConfig::unenforced());
        let kp = Keypair::generate();

        assert!(ledger.submit_transaction(shipment_tx(&kp)).is_ok());
        assert_eq!(ledger.pending().len(), 1);
    }

    #[test]
    fn test_commit_clears_pending() {
        let mut ledger = Ledger::new(ContractEngine::new(), LedgerConfig::unenforced());
        let kp = Keypair::generate();
        ledger.submit_transaction(shipment_tx(&kp)).unwrap();

        let mut validators = ValidatorDirectory::new(SelectionStrategy::RoundRobin);
        validators
            .register("v0", &Keypair::generate(), "secret", 0, "")
            .unwrap();
        let engine = PoaEngine::new();

        let block = ledger
            .propose_block(&engine, &mut validators, "secret")
            .unwrap();
        assert_eq!(ledger.height(), 0); // proposal does not mutate the ledger
        assert_eq!(ledger.pending().len(), 1);

        ledger.commit_block(block).unwrap();
        assert_eq!(ledger.height(), 1);
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn test_commit_rejects_unsigned_block_when_enforced() {
        let mut ledger = ledger();
        let kp = Keypair::generate();
        let block = Block::new(1, vec![], ledger.last_block().hash, kp.public_key.clone());

        assert!(matches!(
            ledger.commit_block(block),
            Err(LedgerError::InvalidBlockSignature)
        ));
        assert_eq!(ledger.height(), 0);
    }

    #[test]
    fn test_commit_only_clears_included_transactions() {
        let mut ledger = Ledger::new(ContractEngine::new(), LedgerConfig::unenforced());
        let kp = Keypair::generate();
        ledger.submit_transaction(shipment_tx(&kp)).unwrap();

        let included = ledger.pending().to_vec();
        ledger.submit_transaction(shipment_tx(&kp)).unwrap();
        assert_eq!(ledger.pending().len(), 2);

        let block = Block::new(1, included, ledger.last_block().hash, kp.public_key.clone());
        ledger.commit_block(block).unwrap();

        assert_eq!(ledger.pending().len(), 1);
    }
}
