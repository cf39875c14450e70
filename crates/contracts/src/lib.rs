//! Smart-contract engine and business contracts for aidledger.
//!
//! Contracts are deterministic handlers invoked on qualifying transactions —
//! not a bytecode VM. Each implements the small [`SmartContract`] capability
//! interface and is registered in the [`ContractEngine`], which owns one
//! persistent string-keyed state map per contract and dispatches every
//! admitted transaction to the contracts whose predicate matches.

pub mod delivery;
pub mod engine;
pub mod payment;
pub mod shipment;
pub mod state;

// Re-export commonly used types
pub use delivery::DeliveryVerificationContract;
pub use engine::{
    ContractEngine, ContractEvent, ContractOutcome, EngineError, ExecutionContext,
    ExecutionResult, SmartContract,
};
pub use payment::PaymentReleaseContract;
pub use shipment::ShipmentTrackingContract;
pub use state::{ContractState, StateValue};
