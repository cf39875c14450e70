//! Conditional payment release contract.
//!
//! Releases payment for a shipment once its status reaches "Confirmed" and
//! every listed supplier has been verified, and handles direct payment
//! initiation requests. Supplier verification status lives in this
//! contract's own state under `supplier:{id}:verification` and is seeded
//! administratively through the engine.

use crate::engine::{ExecutionContext, ExecutionResult, SmartContract};
use crate::state::ContractState;
use aidledger_core::TransactionType;
use serde_json::json;
use uuid::Uuid;

pub const CONTRACT_ID: &str = "payment-release-v1";

/// Status value a supplier must hold before any payment moves.
pub const SUPPLIER_VERIFIED: &str = "Verified";
/// Shipment status that triggers batch release.
pub const STATUS_CONFIRMED: &str = "Confirmed";

/// Event names.
pub const EVENT_PAYMENT_INITIATED: &str = "payment-initiated";
pub const EVENT_PAYMENT_RELEASED: &str = "payment-released";
pub const EVENT_SUPPLIER_NOT_VERIFIED: &str = "supplier-not-verified";

#[derive(Debug, Default)]
pub struct PaymentReleaseContract;

fn supplier_verification_key(supplier_id: &str) -> String {
    format!("supplier:{supplier_id}:verification")
}

fn is_verified(state: &ContractState, supplier_id: &str) -> bool {
    state
        .get(&supplier_verification_key(supplier_id))
        .and_then(|v| v.as_text())
        .map(|s| s == SUPPLIER_VERIFIED)
        .unwrap_or(false)
}

impl PaymentReleaseContract {
    pub fn new() -> Self {
        Self
    }

    /// Batch release driven by a shipment status change.
    fn on_status_updated(
        &self,
        ctx: &ExecutionContext<'_>,
        state: &ContractState,
    ) -> ExecutionResult {
        let payload = &ctx.transaction.payload;
        let Some(shipment_id) = payload.get("shipmentId").and_then(|v| v.as_str()) else {
            return ExecutionResult::failure("shipment id not found in payload");
        };

        let status = payload.get("status").and_then(|v| v.as_str()).unwrap_or("");
        if status != STATUS_CONFIRMED {
            return ExecutionResult::success()
                .with_output("processed", false)
                .with_output("reason", format!("status is {status}, not Confirmed"));
        }

        let suppliers: Vec<&str> = payload
            .get("suppliers")
            .and_then(|v| v.as_array())
            .map(|list| list.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        if suppliers.is_empty() {
            return ExecutionResult::success()
                .with_output("processed", false)
                .with_output("reason", "no suppliers listed for shipment");
        }

        // One unverified supplier skips the whole batch.
        if let Some(unverified) = suppliers.iter().find(|id| !is_verified(state, id)) {
            return ExecutionResult::success()
                .with_output("processed", false)
                .with_output("reason", format!("supplier {unverified} is not verified"))
                .with_event(
                    EVENT_SUPPLIER_NOT_VERIFIED,
                    json!({ "shipmentId": shipment_id, "supplierId": unverified }),
                );
        }

        ExecutionResult::success()
            .with_output("processed", true)
            .with_output("status", "Released")
            .with_state_update(format!("payment:{shipment_id}:status"), "Released")
            .with_event(
                EVENT_PAYMENT_INITIATED,
                json!({ "shipmentId": shipment_id, "supplierCount": suppliers.len() }),
            )
            .with_event(
                EVENT_PAYMENT_RELEASED,
                json!({ "shipmentId": shipment_id, "supplierCount": suppliers.len() }),
            )
    }

    /// Direct payment initiation for a single supplier.
    fn on_payment_initiated(
        &self,
        ctx: &ExecutionContext<'_>,
        state: &ContractState,
    ) -> ExecutionResult {
        let payload = &ctx.transaction.payload;
        let Some(shipment_id) = payload.get("shipmentId").and_then(|v| v.as_str()) else {
            return ExecutionResult::failure("shipment id not found in payload");
        };
        let Some(supplier_id) = payload.get("supplierId").and_then(|v| v.as_str()) else {
            return ExecutionResult::failure("supplier id not found in payload");
        };

        let amount = payload.get("amount").and_then(|v| v.as_f64()).unwrap_or(0.0);
        if amount <= 0.0 {
            return ExecutionResult::failure("invalid payment amount");
        }

        if !is_verified(state, supplier_id) {
            return ExecutionResult::failure(format!("supplier {supplier_id} is not verified"));
        }

        let payment_id = Uuid::new_v4().to_string();
        ExecutionResult::success()
            .with_output("paymentId", payment_id.as_str())
            .with_output("status", "Initiated")
            .with_state_update(format!("payment:{payment_id}:shipment"), shipment_id)
            .with_state_update(format!("payment:{payment_id}:supplier"), supplier_id)
            .with_state_update(format!("payment:{payment_id}:amount"), amount)
            .with_state_update(format!("payment:{payment_id}:status"), "Initiated")
            .with_event(
                EVENT_PAYMENT_INITIATED,
                json!({
                    "paymentId": payment_id,
                    "shipmentId": shipment_id,
                    "supplierId": supplier_id,
                    "amount": amount,
                }),
            )
    }
}

impl SmartContract for PaymentReleaseContract {
    fn id(&self) -> &str {
        CONTRACT_ID
    }

    fn name(&self) -> &str {
        "Payment Release"
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn description(&self) -> &str {
        "Releases conditional payments once shipments are confirmed and suppliers verified"
    }

    fn applies_to(&self, tx: &aidledger_core::Transaction) -> bool {
        matches!(
            tx.tx_type,
            TransactionType::StatusUpdated | TransactionType::PaymentInitiated
        )
    }

    fn execute(&self, ctx: &ExecutionContext<'_>, state: &ContractState) -> ExecutionResult {
        match ctx.transaction.tx_type {
            TransactionType::StatusUpdated => self.on_status_updated(ctx, state),
            TransactionType::PaymentInitiated => self.on_payment_initiated(ctx, state),
            _ => ExecutionResult::failure("unsupported transaction type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aidledger_core::{Keypair, Transaction};
    use serde_json::{json, Value};

    fn exec_with_state(tx: &Transaction, state: &ContractState) -> ExecutionResult {
        let contract = PaymentReleaseContract::new();
        let ctx = ExecutionContext::new(tx);
        contract.execute(&ctx, state)
    }

    fn verified_state(suppliers: &[&str]) -> ContractState {
        let mut state = ContractState::new();
        for id in suppliers {
            state.insert(supplier_verification_key(id), SUPPLIER_VERIFIED.into());
        }
        state
    }

    fn status_tx(payload: Value) -> Transaction {
        let kp = Keypair::generate();
        Transaction::new(TransactionType::StatusUpdated, kp.public_key.clone(), payload)
    }

    fn payment_tx(payload: Value) -> Transaction {
        let kp = Keypair::generate();
        Transaction::new(TransactionType::PaymentInitiated, kp.public_key.clone(), payload)
    }

    #[test]
    fn test_confirmed_with_verified_suppliers_releases() {
        let tx = status_tx(json!({
            "shipmentId": "SHIP-1",
            "status": "Confirmed",
            "suppliers": ["SUP-1", "SUP-2"],
        }));
        let state = verified_state(&["SUP-1", "SUP-2"]);

        let result = exec_with_state(&tx, &state);
        assert!(result.success);
        assert_eq!(result.outputs.get("processed").and_then(|v| v.as_flag()), Some(true));

        let released = result.event(EVENT_PAYMENT_RELEASED).unwrap();
        assert_eq!(released.data.get("supplierCount").and_then(|v| v.as_u64()), Some(2));
        // Initiated precedes released.
        assert_eq!(result.events[0].name, EVENT_PAYMENT_INITIATED);
        assert_eq!(result.events[1].name, EVENT_PAYMENT_RELEASED);
    }

    #[test]
    fn test_unverified_supplier_skips_batch() {
        let tx = status_tx(json!({
            "shipmentId": "SHIP-1",
            "status": "Confirmed",
            "suppliers": ["SUP-1", "SUP-2"],
        }));
        let state = verified_state(&["SUP-1"]); // SUP-2 unverified

        let result = exec_with_state(&tx, &state);
        assert!(result.success);
        assert_eq!(result.outputs.get("processed").and_then(|v| v.as_flag()), Some(false));
        assert!(result.event(EVENT_SUPPLIER_NOT_VERIFIED).is_some());
        assert!(result.event(EVENT_PAYMENT_RELEASED).is_none());
        assert!(result.event(EVENT_PAYMENT_INITIATED).is_none());
    }

    #[test]
    fn test_non_confirmed_status_is_noop() {
        let tx = status_tx(json!({
            "shipmentId": "SHIP-1",
            "status": "InTransit",
            "suppliers": ["SUP-1"],
        }));

        let result = exec_with_state(&tx, &ContractState::new());
        assert!(result.success);
        assert_eq!(result.outputs.get("processed").and_then(|v| v.as_flag()), Some(false));
        assert!(result.outputs.get("reason").is_some());
        assert!(result.events.is_empty());
    }

    #[test]
    fn test_confirmed_without_suppliers_is_noop() {
        let tx = status_tx(json!({
            "shipmentId": "SHIP-1",
            "status": "Confirmed",
            "suppliers": [],
        }));

        let result = exec_with_state(&tx, &ContractState::new());
        assert!(result.success);
        assert_eq!(result.outputs.get("processed").and_then(|v| v.as_flag()), Some(false));
        assert!(result.events.is_empty());
    }

    #[test]
    fn test_status_update_without_shipment_id_fails() {
        let tx = status_tx(json!({ "status": "Confirmed" }));

        let result = exec_with_state(&tx, &ContractState::new());
        assert!(!result.success);
    }

    #[test]
    fn test_direct_payment_succeeds_for_verified_supplier() {
        let tx = payment_tx(json!({
            "shipmentId": "SHIP-1",
            "supplierId": "SUP-1",
            "amount": 2500.0,
        }));
        let state = verified_state(&["SUP-1"]);

        let result = exec_with_state(&tx, &state);
        assert!(result.success);
        assert_eq!(
            result.outputs.get("status").and_then(|v| v.as_text()),
            Some("Initiated")
        );
        assert!(result.outputs.get("paymentId").is_some());
        assert!(result.event(EVENT_PAYMENT_INITIATED).is_some());
    }

    #[test]
    fn test_direct_payment_requires_positive_amount() {
        let tx = payment_tx(json!({
            "shipmentId": "SHIP-1",
            "supplierId": "SUP-1",
            "amount": 0,
        }));
        let state = verified_state(&["SUP-1"]);

        let result = exec_with_state(&tx, &state);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("invalid payment amount"));
    }

    #[test]
    fn test_direct_payment_requires_verified_supplier() {
        let tx = payment_tx(json!({
            "shipmentId": "SHIP-1",
            "supplierId": "SUP-9",
            "amount": 100.0,
        }));

        let result = exec_with_state(&tx, &ContractState::new());
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("not verified"));
    }

    #[test]
    fn test_direct_payment_requires_ids() {
        let missing_shipment = payment_tx(json!({ "supplierId": "SUP-1", "amount": 10.0 }));
        assert!(!exec_with_state(&missing_shipment, &ContractState::new()).success);

        let missing_supplier = payment_tx(json!({ "shipmentId": "SHIP-1", "amount": 10.0 }));
        assert!(!exec_with_state(&missing_supplier, &ContractState::new()).success);
    }
}
