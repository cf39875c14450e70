//! Smart-contract capability interface and dispatch engine.
//!
//! Contracts are stateless values implementing [`SmartContract`]; their
//! persistent state lives in the engine, one string-keyed map per contract
//! id. State is a running projection maintained from transaction admission
//! onward and is never rolled back when a block is discarded.

use crate::state::{ContractState, StateValue};
use aidledger_core::{Block, Transaction};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Errors returned by administrative engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown contract: {0}")]
    UnknownContract(String),
}

/// Everything a contract sees during one execution.
pub struct ExecutionContext<'a> {
    /// The transaction under evaluation.
    pub transaction: &'a Transaction,
    /// Optional read-only view of the chain at dispatch time.
    pub chain: Option<&'a [Block]>,
    /// Optional caller-supplied auxiliary data (e.g. a scanned QR code).
    pub aux: Option<&'a Value>,
}

impl<'a> ExecutionContext<'a> {
    /// Build a context carrying only the transaction.
    pub fn new(transaction: &'a Transaction) -> Self {
        Self {
            transaction,
            chain: None,
            aux: None,
        }
    }

    /// Look up a string field in the auxiliary data.
    pub fn aux_str(&self, key: &str) -> Option<&str> {
        self.aux.and_then(|v| v.get(key)).and_then(Value::as_str)
    }
}

/// A named event emitted during contract execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractEvent {
    pub name: String,
    pub data: Value,
}

impl ContractEvent {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// The outcome of one contract execution: the audit record the application
/// layer stores or logs.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// Whether the execution succeeded.
    pub success: bool,
    /// Error message, set only on failure.
    pub error: Option<String>,
    /// Free-form output values for the caller.
    pub outputs: HashMap<String, StateValue>,
    /// State deltas to merge into the contract's persistent state.
    pub state_updates: HashMap<String, StateValue>,
    /// Ordered events emitted during execution.
    pub events: Vec<ContractEvent>,
}

impl ExecutionResult {
    /// A successful result with no outputs yet.
    pub fn success() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    /// A failed result carrying an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.outputs.insert(key.into(), value.into());
        self
    }

    pub fn with_state_update(
        mut self,
        key: impl Into<String>,
        value: impl Into<StateValue>,
    ) -> Self {
        self.state_updates.insert(key.into(), value.into());
        self
    }

    pub fn with_event(mut self, name: impl Into<String>, data: Value) -> Self {
        self.events.push(ContractEvent::new(name, data));
        self
    }

    /// Find an emitted event by name.
    pub fn event(&self, name: &str) -> Option<&ContractEvent> {
        self.events.iter().find(|e| e.name == name)
    }
}

/// The capability interface every contract implements.
pub trait SmartContract: Send + Sync {
    /// Unique versioned id, e.g. "shipment-tracking-v1".
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    fn description(&self) -> &str;

    /// Whether this contract reacts to the given transaction.
    fn applies_to(&self, tx: &Transaction) -> bool;

    /// Execute against the transaction; `state` is the contract's current
    /// persistent state, read-only. Mutations go through
    /// [`ExecutionResult::state_updates`].
    fn execute(&self, ctx: &ExecutionContext<'_>, state: &ContractState) -> ExecutionResult;
}

/// One contract's recorded outcome within a dispatch.
#[derive(Debug)]
pub struct ContractOutcome {
    pub contract_id: String,
    pub result: ExecutionResult,
}

/// Registry of contracts plus their persistent state maps.
#[derive(Default)]
pub struct ContractEngine {
    /// Registration order drives dispatch order.
    contracts: Vec<Box<dyn SmartContract>>,
    states: HashMap<String, ContractState>,
}

impl ContractEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract. A second registration under the same id is
    /// ignored.
    pub fn register(&mut self, contract: Box<dyn SmartContract>) {
        let id = contract.id().to_string();
        if self.contracts.iter().any(|c| c.id() == id) {
            tracing::warn!(contract = %id, "contract already registered, ignoring");
            return;
        }
        self.states.entry(id).or_default();
        self.contracts.push(contract);
    }

    /// Dispatch an admitted transaction to every applicable contract, in
    /// registration order. Successful executions have their state deltas
    /// merged; failures leave state untouched but are still returned as
    /// recorded outcomes. Dispatch never errors and never vetoes the
    /// transaction.
    pub fn dispatch(
        &mut self,
        tx: &Transaction,
        chain: Option<&[Block]>,
        aux: Option<&Value>,
    ) -> Vec<ContractOutcome> {
        let ctx = ExecutionContext {
            transaction: tx,
            chain,
            aux,
        };

        let mut outcomes = Vec::new();
        for contract in &self.contracts {
            if !contract.applies_to(tx) {
                continue;
            }
            let state = self.states.entry(contract.id().to_string()).or_default();
            let result = contract.execute(&ctx, state);
            tracing::debug!(
                contract = contract.id(),
                tx = %tx.id,
                success = result.success,
                events = result.events.len(),
                "contract executed"
            );
            if result.success {
                for (key, value) in &result.state_updates {
                    state.insert(key.clone(), value.clone());
                }
            } else {
                tracing::warn!(
                    contract = contract.id(),
                    tx = %tx.id,
                    error = result.error.as_deref().unwrap_or(""),
                    "contract execution failed"
                );
            }
            outcomes.push(ContractOutcome {
                contract_id: contract.id().to_string(),
                result,
            });
        }
        outcomes
    }

    /// Get a registered contract by id.
    pub fn contract(&self, id: &str) -> Option<&dyn SmartContract> {
        self.contracts
            .iter()
            .find(|c| c.id() == id)
            .map(|c| c.as_ref())
    }

    /// Read a contract's full persistent state.
    pub fn state(&self, id: &str) -> Option<&ContractState> {
        self.states.get(id)
    }

    /// Administratively seed a single state entry, e.g. mark a supplier
    /// "Verified" ahead of a payment decision.
    pub fn seed_state(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: impl Into<StateValue>,
    ) -> Result<(), EngineError> {
        let state = self
            .states
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownContract(id.to_string()))?;
        state.insert(key.into(), value.into());
        Ok(())
    }

    /// Number of registered contracts.
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}
