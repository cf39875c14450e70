//! Proof of Authority (PoA) consensus engine.
//!
//! Block-proposal rights rotate among the directory's active validators.
//! The engine packages the pending snapshot into a block, hashes it, signs
//! it with the selected validator's decrypted key, and updates that
//! validator's statistics. It never mutates a ledger: proposal and
//! commitment are separate steps owned by the caller.

use crate::validator::{DirectoryError, Validator, ValidatorDirectory};
use aidledger_core::{decrypt_private_key, Block, Keypair, Transaction};
use thiserror::Error;

/// Errors that can occur during consensus operations.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// Argument error: rejected before any state change.
    #[error("unlock secret must not be blank")]
    BlankSecret,

    /// Argument error: rejected before any state change.
    #[error("validator id must not be blank")]
    BlankValidatorId,

    /// Precondition: nothing to package into a block.
    #[error("pending transaction pool is empty")]
    EmptyPendingPool,

    /// Precondition: the rotation has nobody to select.
    #[error("no active validators")]
    NoActiveValidators,

    /// Opaque by design; wrong secret and corrupt key material look alike.
    #[error("failed to decrypt validator's private key")]
    KeyDecryption,

    #[error("validator not found: {0}")]
    ValidatorNotFound(String),
}

pub type Result<T> = std::result::Result<T, ConsensusError>;

/// The proof-of-authority consensus engine.
#[derive(Debug, Default)]
pub struct PoaEngine;

impl PoaEngine {
    pub fn new() -> Self {
        Self
    }

    /// Propose a block extending `parent` from a snapshot of the pending
    /// pool, signed by the next proposer in the directory's rotation.
    ///
    /// The proposal is recorded against the validator's statistics before
    /// returning, so the stats persist even if the caller discards the
    /// block.
    pub fn propose_block(
        &self,
        parent: &Block,
        pending: &[Transaction],
        validators: &mut ValidatorDirectory,
        secret: &str,
    ) -> Result<Block> {
        if secret.trim().is_empty() {
            return Err(ConsensusError::BlankSecret);
        }
        if pending.is_empty() {
            return Err(ConsensusError::EmptyPendingPool);
        }

        let proposer = validators
            .next_proposer()
            .ok_or(ConsensusError::NoActiveValidators)?;

        let private_key = decrypt_private_key(&proposer.encrypted_private_key, secret)
            .map_err(|_| ConsensusError::KeyDecryption)?;
        let keypair = Keypair::from_private_key(&private_key);

        let block = Block::new(
            parent.index + 1,
            pending.to_vec(),
            parent.hash,
            proposer.public_key.clone(),
        )
        .signed(&keypair);

        validators
            .record_block_creation(&proposer.id.to_string())
            .map_err(|e| match e {
                DirectoryError::NotFound(id) => ConsensusError::ValidatorNotFound(id),
                _ => ConsensusError::ValidatorNotFound(proposer.id.to_string()),
            })?;

        tracing::info!(
            index = block.index,
            proposer = %proposer.name,
            tx_count = block.tx_count(),
            "block proposed"
        );
        Ok(block)
    }

    /// Validate a block against its claimed predecessor. Pure and
    /// side-effect free: true only when the index increments, the previous
    /// hash links, the stored hash recomputes, and the validator signature
    /// verifies.
    pub fn validate_block(&self, block: &Block, parent: &Block) -> bool {
        if block.index != parent.index + 1 {
            return false;
        }
        if block.previous_hash != parent.hash {
            return false;
        }
        if block.compute_hash() != block.hash {
            return false;
        }
        block.verify_signature()
    }

    /// Preview which validator the directory would select next, without
    /// advancing the rotation.
    pub fn current_proposer(&self, validators: &ValidatorDirectory) -> Option<Validator> {
        validators.peek_proposer()
    }

    /// Record a block creation out of band against a validator id.
    pub fn record_block_creation(
        &self,
        validators: &mut ValidatorDirectory,
        validator_id: &str,
    ) -> Result<()> {
        validators
            .record_block_creation(validator_id)
            .map_err(|e| match e {
                DirectoryError::BlankValidatorId => ConsensusError::BlankValidatorId,
                DirectoryError::NotFound(id) => ConsensusError::ValidatorNotFound(id),
                _ => ConsensusError::ValidatorNotFound(validator_id.to_string()),
            })
    }
}
