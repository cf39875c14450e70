//! Transaction types and signing.

use crate::crypto::{Keypair, PublicKey, Signature};
use crate::hash::{hash_json, Hash};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during transaction operations.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("missing signature")]
    MissingSignature,
}

/// The business meaning of a transaction, switched on by contract predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    ShipmentCreated,
    StatusUpdated,
    DeliveryConfirmed,
    PaymentInitiated,
    SupplierRegistered,
}

/// A transaction on the ledger.
///
/// Built and signed by application services; immutable once signed. The
/// payload is opaque structured data interpreted only by smart contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction id.
    pub id: Uuid,
    /// Tagged transaction type.
    pub tx_type: TransactionType,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Sender's public key.
    pub sender: PublicKey,
    /// Opaque structured payload.
    pub payload: Value,
    /// Sender signature over the canonical unsigned content.
    pub signature: Signature,
}

/// Unsigned transaction content (for hashing and signing).
#[derive(Serialize)]
struct UnsignedTransaction<'a> {
    id: &'a Uuid,
    tx_type: &'a TransactionType,
    timestamp: &'a DateTime<Utc>,
    sender: &'a PublicKey,
    payload: &'a Value,
}

impl Transaction {
    /// Create a new unsigned transaction with a fresh id.
    pub fn new(tx_type: TransactionType, sender: PublicKey, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx_type,
            timestamp: Utc::now(),
            sender,
            payload,
            signature: Signature::default(),
        }
    }

    /// Get the hash of the canonical unsigned content (for signing).
    pub fn signing_hash(&self) -> Hash {
        hash_json(&UnsignedTransaction {
            id: &self.id,
            tx_type: &self.tx_type,
            timestamp: &self.timestamp,
            sender: &self.sender,
            payload: &self.payload,
        })
    }

    /// Sign the transaction with the given keypair.
    pub fn sign(&mut self, keypair: &Keypair) {
        let hash = self.signing_hash();
        self.signature = keypair.sign_hash(&hash);
    }

    /// Create a signed transaction.
    pub fn signed(mut self, keypair: &Keypair) -> Self {
        self.sign(keypair);
        self
    }

    /// Verify the signature under the sender's public key.
    pub fn verify(&self) -> Result<(), TransactionError> {
        if self.signature.is_empty() {
            return Err(TransactionError::MissingSignature);
        }
        let hash = self.signing_hash();
        self.sender
            .verify(hash.as_bytes(), &self.signature)
            .map_err(|_| TransactionError::VerificationFailed)
    }

    /// Check whether the transaction carries a signature.
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }
}
