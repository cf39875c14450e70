//! Delivery verification contract.
//!
//! Confirms that a delivery was acknowledged by the assigned recipient,
//! optionally cross-checks a scanned QR code against the payload, and
//! records whether the delivery landed inside its agreed timeframe.

use crate::engine::{ExecutionContext, ExecutionResult, SmartContract};
use crate::state::ContractState;
use aidledger_core::TransactionType;
use chrono::{DateTime, Utc};
use serde_json::json;

pub const CONTRACT_ID: &str = "delivery-verification-v1";

/// Event names.
pub const EVENT_DELIVERY_VERIFIED: &str = "delivery-verified";
pub const EVENT_DELIVERY_DELAYED: &str = "delivery-delayed";
pub const EVENT_VERIFICATION_FAILED: &str = "delivery-verification-failed";
pub const EVENT_QR_MISMATCH: &str = "qr-code-mismatch";

/// Auxiliary-data key carrying the externally observed QR code.
pub const AUX_SCANNED_QR: &str = "scannedQrCode";

#[derive(Debug, Default)]
pub struct DeliveryVerificationContract;

/// Parsed delivery timeframe, "start to end" with RFC3339 bounds.
fn parse_window(window: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (start, end) = window.split_once(" to ")?;
    let start: DateTime<Utc> = start.trim().parse().ok()?;
    let end: DateTime<Utc> = end.trim().parse().ok()?;
    Some((start, end))
}

impl DeliveryVerificationContract {
    pub fn new() -> Self {
        Self
    }
}

impl SmartContract for DeliveryVerificationContract {
    fn id(&self) -> &str {
        CONTRACT_ID
    }

    fn name(&self) -> &str {
        "Delivery Verification"
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn description(&self) -> &str {
        "Verifies delivery confirmations against recipient, QR code, and timeframe"
    }

    fn applies_to(&self, tx: &aidledger_core::Transaction) -> bool {
        tx.tx_type == TransactionType::DeliveryConfirmed
    }

    fn execute(&self, ctx: &ExecutionContext<'_>, _state: &ContractState) -> ExecutionResult {
        let Some(payload) = ctx.transaction.payload.as_object() else {
            return ExecutionResult::failure("failed to parse delivery payload");
        };

        let Some(shipment_id) = payload.get("shipmentId").and_then(|v| v.as_str()) else {
            return ExecutionResult::failure("shipment id not found");
        };

        let recipient = payload
            .get("recipient")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let sender_hex = ctx.transaction.sender.to_hex();
        if sender_hex != recipient {
            return ExecutionResult::failure(format!(
                "transaction sender is not the assigned recipient {recipient}"
            ))
            .with_event(
                EVENT_VERIFICATION_FAILED,
                json!({
                    "shipmentId": shipment_id,
                    "expectedRecipient": recipient,
                    "sender": sender_hex,
                }),
            );
        }

        let payload_qr = payload.get("qrCode").and_then(|v| v.as_str());
        if let Some(scanned) = ctx.aux_str(AUX_SCANNED_QR) {
            if payload_qr != Some(scanned) {
                return ExecutionResult::failure("QR code verification failed").with_event(
                    EVENT_QR_MISMATCH,
                    json!({
                        "shipmentId": shipment_id,
                        "scanned": scanned,
                    }),
                );
            }
        }

        let now = Utc::now();
        let mut on_time = true;
        if let Some(window) = payload.get("deliveryWindow").and_then(|v| v.as_str()) {
            let Some((_, end)) = parse_window(window) else {
                return ExecutionResult::failure("failed to parse delivery payload");
            };
            on_time = now <= end;
        }

        let mut result = ExecutionResult::success()
            .with_output("shipmentId", shipment_id)
            .with_output("onTime", on_time)
            .with_state_update(format!("shipment:{shipment_id}:verified"), true)
            .with_state_update(format!("shipment:{shipment_id}:verified_at"), now)
            .with_state_update(format!("shipment:{shipment_id}:on_time"), on_time);

        if !on_time {
            result = result.with_event(
                EVENT_DELIVERY_DELAYED,
                json!({ "shipmentId": shipment_id, "verifiedAt": now.to_rfc3339() }),
            );
        }
        result.with_event(
            EVENT_DELIVERY_VERIFIED,
            json!({
                "shipmentId": shipment_id,
                "recipient": recipient,
                "verifiedAt": now.to_rfc3339(),
            }),
        )
    }
}
