//! Validator records, the validator directory, and proposer selection.

use aidledger_core::{encrypt_private_key, Keypair, KeystoreError, PublicKey};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use thiserror::Error;
use uuid::Uuid;

/// Errors from validator-directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("validator name already taken: {0}")]
    NameTaken(String),

    #[error("validator public key already registered")]
    PublicKeyTaken,

    #[error("validator id must not be blank")]
    BlankValidatorId,

    #[error("validator not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Keystore(#[from] KeystoreError),
}

/// An authorized signer permitted to propose and sign blocks.
///
/// The private key is held only in encrypted form; decryption happens
/// inside the consensus engine at proposal time. Validators are deactivated
/// rather than deleted so their block history stays attributable.
#[derive(Debug, Clone)]
pub struct Validator {
    pub id: Uuid,
    pub name: String,
    pub public_key: PublicKey,
    pub encrypted_private_key: Vec<u8>,
    /// Informational contact/location, not used by consensus.
    pub address: String,
    pub active: bool,
    /// Ascending priority = earlier turn in the rotation.
    pub priority: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_block_at: Option<DateTime<Utc>>,
    pub blocks_created: u64,
    pub description: Option<String>,
}

/// How the directory picks the next proposer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionStrategy {
    /// Deterministic rotation over the active set ordered by priority.
    #[default]
    RoundRobin,
    /// Uniformly random active validator; unsuitable where reproducibility
    /// is required.
    Random,
}

/// The set of authorized signers plus the rotation cursor.
///
/// The cursor is explicit state owned by the directory, constructed once
/// and shared by reference with the consensus engine.
#[derive(Debug, Default)]
pub struct ValidatorDirectory {
    validators: Vec<Validator>,
    strategy: SelectionStrategy,
    cursor: usize,
}

impl ValidatorDirectory {
    pub fn new(strategy: SelectionStrategy) -> Self {
        Self {
            validators: Vec::new(),
            strategy,
            cursor: 0,
        }
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    /// Register a validator from a keypair, encrypting the private key
    /// under the given secret. Name and public key must be unique.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        keypair: &Keypair,
        secret: &str,
        priority: u32,
        address: impl Into<String>,
    ) -> Result<Uuid, DirectoryError> {
        let name = name.into();
        if self.name_taken(&name) {
            return Err(DirectoryError::NameTaken(name));
        }
        if self.public_key_taken(&keypair.public_key) {
            return Err(DirectoryError::PublicKeyTaken);
        }

        let encrypted_private_key = encrypt_private_key(&keypair.private_key(), secret)?;
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.validators.push(Validator {
            id,
            name,
            public_key: keypair.public_key.clone(),
            encrypted_private_key,
            address: address.into(),
            active: true,
            priority,
            created_at: now,
            updated_at: now,
            last_block_at: None,
            blocks_created: 0,
            description: None,
        });
        tracing::info!(validator = %id, "validator registered");
        Ok(id)
    }

    /// Whether a validator name is already in use.
    pub fn name_taken(&self, name: &str) -> bool {
        self.validators.iter().any(|v| v.name == name)
    }

    /// Whether a public key is already registered.
    pub fn public_key_taken(&self, key: &PublicKey) -> bool {
        self.validators.iter().any(|v| &v.public_key == key)
    }

    /// Total number of validators, active or not.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Number of active validators.
    pub fn active_len(&self) -> usize {
        self.validators.iter().filter(|v| v.active).count()
    }

    /// Look up a validator by id.
    pub fn get(&self, id: &Uuid) -> Option<&Validator> {
        self.validators.iter().find(|v| v.id == *id)
    }

    /// Active validators ordered by ascending priority.
    pub fn active_validators(&self) -> Vec<&Validator> {
        let mut active: Vec<&Validator> = self.validators.iter().filter(|v| v.active).collect();
        active.sort_by_key(|v| v.priority);
        active
    }

    /// Take a validator out of the rotation without deleting it.
    pub fn deactivate(&mut self, id: &Uuid) -> Result<(), DirectoryError> {
        let validator = self
            .validators
            .iter_mut()
            .find(|v| v.id == *id)
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))?;
        validator.active = false;
        validator.updated_at = Utc::now();
        tracing::info!(validator = %id, "validator deactivated");
        Ok(())
    }

    /// Return a deactivated validator to the rotation.
    pub fn activate(&mut self, id: &Uuid) -> Result<(), DirectoryError> {
        let validator = self
            .validators
            .iter_mut()
            .find(|v| v.id == *id)
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))?;
        validator.active = true;
        validator.updated_at = Utc::now();
        Ok(())
    }

    /// Select the next proposer under the configured strategy, advancing
    /// the round-robin cursor. Returns None with no active validators.
    ///
    /// The cursor is taken modulo the current active count, so the rotation
    /// adapts when validators are de/activated mid-cycle.
    pub fn next_proposer(&mut self) -> Option<Validator> {
        let active = self.active_validators();
        if active.is_empty() {
            return None;
        }
        match self.strategy {
            SelectionStrategy::RoundRobin => {
                let index = self.cursor % active.len();
                let chosen = active[index].clone();
                self.cursor = index + 1;
                Some(chosen)
            }
            SelectionStrategy::Random => active.choose(&mut rand::thread_rng()).map(|v| (*v).clone()),
        }
    }

    /// Preview the selection without advancing the cursor.
    pub fn peek_proposer(&self) -> Option<Validator> {
        let active = self.active_validators();
        if active.is_empty() {
            return None;
        }
        match self.strategy {
            SelectionStrategy::RoundRobin => Some(active[self.cursor % active.len()].clone()),
            SelectionStrategy::Random => active.choose(&mut rand::thread_rng()).map(|v| (*v).clone()),
        }
    }

    /// Record that a validator created a block: bump the counter and stamp
    /// the timestamps. Idempotent per call; a blank id is an argument error
    /// and an unknown id is not-found.
    pub fn record_block_creation(&mut self, id: &str) -> Result<(), DirectoryError> {
        if id.trim().is_empty() {
            return Err(DirectoryError::BlankValidatorId);
        }
        let parsed = Uuid::parse_str(id).map_err(|_| DirectoryError::NotFound(id.to_string()))?;
        let validator = self
            .validators
            .iter_mut()
            .find(|v| v.id == parsed)
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))?;
        let now = Utc::now();
        validator.blocks_created += 1;
        validator.last_block_at = Some(now);
        validator.updated_at = now;
        Ok(())
    }
}
