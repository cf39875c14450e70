//! Shipment tracking contract.
//!
//! Maintains a per-shipment status projection keyed
//! `shipment:{id}:...`. A newly created shipment that carries at least one
//! item passes the automatic integrity check and advances straight to
//! "Validated"; empty shipments stay at "Created".

use crate::engine::{ExecutionContext, ExecutionResult, SmartContract};
use crate::state::ContractState;
use aidledger_core::TransactionType;
use chrono::Utc;
use serde_json::json;

pub const CONTRACT_ID: &str = "shipment-tracking-v1";

/// Shipment status values tracked by this contract.
pub const STATUS_CREATED: &str = "Created";
pub const STATUS_VALIDATED: &str = "Validated";

/// Event names.
pub const EVENT_SHIPMENT_REGISTERED: &str = "shipment-registered";
pub const EVENT_STATUS_UPDATED: &str = "status-updated";

#[derive(Debug, Default)]
pub struct ShipmentTrackingContract;

impl ShipmentTrackingContract {
    pub fn new() -> Self {
        Self
    }

    fn on_created(&self, ctx: &ExecutionContext<'_>) -> ExecutionResult {
        let payload = &ctx.transaction.payload;
        let Some(shipment_id) = payload.get("shipmentId").and_then(|v| v.as_str()) else {
            return ExecutionResult::failure("shipment id not found in payload");
        };

        let has_items = payload
            .get("items")
            .and_then(|v| v.as_array())
            .map(|items| !items.is_empty())
            .unwrap_or(false);
        let status = if has_items {
            STATUS_VALIDATED
        } else {
            STATUS_CREATED
        };

        let now = Utc::now();
        ExecutionResult::success()
            .with_output("shipmentId", shipment_id)
            .with_output("status", status)
            .with_state_update(format!("shipment:{shipment_id}:status"), status)
            .with_state_update(
                format!("shipment:{shipment_id}:created_by"),
                ctx.transaction.sender.to_hex(),
            )
            .with_state_update(format!("shipment:{shipment_id}:created_at"), now)
            .with_event(
                EVENT_SHIPMENT_REGISTERED,
                json!({
                    "shipmentId": shipment_id,
                    "status": status,
                    "createdBy": ctx.transaction.sender.to_hex(),
                }),
            )
    }

    fn on_status_updated(&self, ctx: &ExecutionContext<'_>) -> ExecutionResult {
        let payload = &ctx.transaction.payload;
        let Some(shipment_id) = payload.get("shipmentId").and_then(|v| v.as_str()) else {
            return ExecutionResult::failure("shipment id not found in payload");
        };
        let Some(status) = payload.get("status").and_then(|v| v.as_str()) else {
            return ExecutionResult::failure("status not found in payload");
        };

        let now = Utc::now();
        ExecutionResult::success()
            .with_output("shipmentId", shipment_id)
            .with_output("status", status)
            .with_state_update(format!("shipment:{shipment_id}:status"), status)
            .with_state_update(format!("shipment:{shipment_id}:updated_at"), now)
            .with_state_update(
                format!("shipment:{shipment_id}:updated_by"),
                ctx.transaction.sender.to_hex(),
            )
            .with_event(
                EVENT_STATUS_UPDATED,
                json!({ "shipmentId": shipment_id, "status": status }),
            )
    }
}

impl SmartContract for ShipmentTrackingContract {
    fn id(&self) -> &str {
        CONTRACT_ID
    }

    fn name(&self) -> &str {
        "Shipment Tracking"
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn description(&self) -> &str {
        "Tracks shipment lifecycle status from creation through delivery"
    }

    fn applies_to(&self, tx: &aidledger_core::Transaction) -> bool {
        matches!(
            tx.tx_type,
            TransactionType::ShipmentCreated | TransactionType::StatusUpdated
        )
    }

    fn execute(&self, ctx: &ExecutionContext<'_>, _state: &ContractState) -> ExecutionResult {
        match ctx.transaction.tx_type {
            TransactionType::ShipmentCreated => self.on_created(ctx),
            TransactionType::StatusUpdated => self.on_status_updated(ctx),
            _ => ExecutionResult::failure("unsupported transaction type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aidledger_core::{Keypair, Transaction};
    use serde_json::json;

    fn exec(tx: &Transaction) -> ExecutionResult {
        let contract = ShipmentTrackingContract::new();
        let ctx = ExecutionContext::new(tx);
        contract.execute(&ctx, &ContractState::new())
    }

    #[test]
    fn test_populated_shipment_validated_on_creation() {
        let kp = Keypair::generate();
        let tx = Transaction::new(
            TransactionType::ShipmentCreated,
            kp.public_key.clone(),
            json!({ "shipmentId": "SHIP-1", "items": [{ "name": "rice", "qty": 40 }] }),
        );

        let result = exec(&tx);
        assert!(result.success);
        assert_eq!(
            result
                .state_updates
                .get("shipment:SHIP-1:status")
                .and_then(|v| v.as_text()),
            Some(STATUS_VALIDATED)
        );
        assert!(result
            .state_updates
            .contains_key("shipment:SHIP-1:created_at"));
        assert!(result.event(EVENT_SHIPMENT_REGISTERED).is_some());
    }

    #[test]
    fn test_empty_shipment_stays_created() {
        let kp = Keypair::generate();
        let tx = Transaction::new(
            TransactionType::ShipmentCreated,
            kp.public_key.clone(),
            json!({ "shipmentId": "SHIP-2", "items": [] }),
        );

        let result = exec(&tx);
        assert!(result.success);
        assert_eq!(
            result
                .state_updates
                .get("shipment:SHIP-2:status")
                .and_then(|v| v.as_text()),
            Some(STATUS_CREATED)
        );
    }

    #[test]
    fn test_missing_shipment_id_fails() {
        let kp = Keypair::generate();
        let tx = Transaction::new(
            TransactionType::ShipmentCreated,
            kp.public_key.clone(),
            json!({ "items": ["rice"] }),
        );

        let result = exec(&tx);
        assert!(!result.success);
        assert!(result.state_updates.is_empty());
    }

    #[test]
    fn test_status_update_sets_new_status() {
        let kp = Keypair::generate();
        let tx = Transaction::new(
            TransactionType::StatusUpdated,
            kp.public_key.clone(),
            json!({ "shipmentId": "SHIP-1", "status": "InTransit" }),
        );

        let result = exec(&tx);
        assert!(result.success);
        assert_eq!(
            result
                .state_updates
                .get("shipment:SHIP-1:status")
                .and_then(|v| v.as_text()),
            Some("InTransit")
        );
        assert!(result
            .state_updates
            .contains_key("shipment:SHIP-1:updated_at"));
        assert!(result.event(EVENT_STATUS_UPDATED).is_some());
    }

    #[test]
    fn test_applies_only_to_tracking_types() {
        let contract = ShipmentTrackingContract::new();
        let kp = Keypair::generate();

        let created = Transaction::new(
            TransactionType::ShipmentCreated,
            kp.public_key.clone(),
            json!({}),
        );
        let delivery = Transaction::new(
            TransactionType::DeliveryConfirmed,
            kp.public_key.clone(),
            json!({}),
        );

        assert!(contract.applies_to(&created));
        assert!(!contract.applies_to(&delivery));
    }
}
