use serde::{Deserialize, Serialize};

use crate::db_types::{FulfillmentStatus, PaymentStatus, Transaction};

/// The result of asking the ledger to finalize a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeResult {
    /// The transaction record after the call.
    pub transaction: Transaction,
    /// True only for the single caller whose write moved the transaction out of `Pending`.
    pub applied: bool,
}

impl FinalizeResult {
    pub fn applied(transaction: Transaction) -> Self {
        Self { transaction, applied: true }
    }

    pub fn unchanged(transaction: Transaction) -> Self {
        Self { transaction, applied: false }
    }
}

/// The order state to write when a transaction outcome is projected onto its order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncMarker {
    pub transaction_id: i64,
    pub payment_status: PaymentStatus,
    /// Only applied to orders that have not yet progressed beyond `Pending` fulfillment.
    pub fulfillment_status: Option<FulfillmentStatus>,
}
