use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::db_types::{GatewayRef, OrderRef};

/// Generates a fresh gateway reference for a payment attempt on the given order.
///
/// The format is `{order_ref}-{unix millis}{4 random digits}`, so references sort by creation time and two attempts
/// started in the same millisecond still differ. Uniqueness is ultimately enforced by the ledger.
pub fn new_gateway_ref(order_ref: &OrderRef) -> GatewayRef {
    let millis = Utc::now().timestamp_millis();
    let salt = rand::thread_rng().gen_range(0..10_000);
    GatewayRef(format!("{order_ref}-{millis}{salt:04}"))
}

/// A short SHA-256 digest of an inbound payload, for correlating log entries without logging the payload itself.
pub fn payload_digest(raw: &str) -> String {
    let hash = Sha256::digest(raw.as_bytes());
    hex::encode(&hash[..8])
}
