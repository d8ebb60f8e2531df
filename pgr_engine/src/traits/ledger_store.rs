use chrono::Duration;
use thiserror::Error;

use crate::db_types::{FinalStatus, GatewayRef, Metadata, NewTransaction, OrderRef, Transaction};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("A transaction with gateway reference {0} already exists")]
    DuplicateGatewayRef(GatewayRef),
    #[error("No transaction exists for gateway reference {0}")]
    UnknownTransaction(GatewayRef),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// Persistence for payment attempts.
///
/// Implementations must make [`LedgerStore::finalize_if_pending`] a single atomic compare-and-set on the `Pending`
/// status, so that concurrent callers for the same gateway reference cannot both observe success.
#[allow(async_fn_in_trait)]
pub trait LedgerStore: Clone {
    /// Records a new `Pending` transaction. Any other pending attempts for the same order are marked as superseded
    /// in the same atomic operation.
    ///
    /// Fails with [`LedgerError::DuplicateGatewayRef`] if the gateway reference has been used before.
    async fn insert_pending(&self, txn: NewTransaction) -> Result<Transaction, LedgerError>;

    /// Moves the transaction from `Pending` to `status`, merging `metadata` into the existing metadata (new keys win).
    ///
    /// Returns `None` if no pending transaction with this gateway reference exists, in which case nothing was written.
    async fn finalize_if_pending(
        &self,
        gateway_ref: &GatewayRef,
        status: FinalStatus,
        metadata: &Metadata,
    ) -> Result<Option<Transaction>, LedgerError>;

    /// Merges `metadata` into the transaction's metadata without overwriting any existing keys. The status is never
    /// touched.
    async fn merge_metadata(
        &self,
        gateway_ref: &GatewayRef,
        metadata: &Metadata,
    ) -> Result<Option<Transaction>, LedgerError>;

    async fn fetch_transaction(&self, gateway_ref: &GatewayRef) -> Result<Option<Transaction>, LedgerError>;

    /// The most recently created transaction for the order, superseded or not.
    async fn latest_for_order(&self, order_ref: &OrderRef) -> Result<Option<Transaction>, LedgerError>;

    async fn transactions_for_order(&self, order_ref: &OrderRef) -> Result<Vec<Transaction>, LedgerError>;

    /// Removes a transaction that never reached the gateway. Only `Pending` records are eligible.
    /// Returns true if a record was removed.
    async fn remove_pending(&self, gateway_ref: &GatewayRef) -> Result<bool, LedgerError>;

    /// Active (not superseded) pending transactions created more than `age` ago.
    async fn stale_pending(&self, age: Duration) -> Result<Vec<Transaction>, LedgerError>;
}
