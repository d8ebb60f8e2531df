use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{FinalStatus, GatewayRef, Metadata, NewTransaction, OrderRef, Transaction},
    traits::{FinalizeResult, LedgerError, LedgerStore},
};

/// The transaction ledger. Owns the `Pending -> Success | Failed` state machine for payment attempts.
///
/// Every inbound channel funnels through [`TransactionLedger::finalize`], which is keyed on the gateway reference and
/// is safe to call any number of times, concurrently, from any channel.
#[derive(Clone)]
pub struct TransactionLedger<B> {
    db: B,
}

impl<B> Debug for TransactionLedger<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TransactionLedger")
    }
}

impl<B> TransactionLedger<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> TransactionLedger<B>
where B: LedgerStore
{
    /// Records a new pending payment attempt for the order. Earlier pending attempts are superseded, but kept.
    pub async fn create_pending(&self, txn: NewTransaction) -> Result<Transaction, LedgerError> {
        let txn = self.db.insert_pending(txn).await?;
        info!("📒️ Payment attempt {} for order {} is pending ({})", txn.gateway_ref, txn.order_ref, txn.amount);
        Ok(txn)
    }

    /// Finalizes the transaction with the given outcome.
    ///
    /// * Unknown gateway reference: [`LedgerError::UnknownTransaction`].
    /// * Still pending: the status is written and `applied` is true. Exactly one caller ever sees this.
    /// * Already terminal: the status is left alone, new metadata keys are merged in, and `applied` is false.
    pub async fn finalize(
        &self,
        gateway_ref: &GatewayRef,
        outcome: FinalStatus,
        metadata: Metadata,
    ) -> Result<FinalizeResult, LedgerError> {
        if let Some(txn) = self.db.finalize_if_pending(gateway_ref, outcome, &metadata).await? {
            info!("📒️ Transaction {gateway_ref} finalized as {}", txn.status);
            return Ok(FinalizeResult::applied(txn));
        }
        let txn = self
            .db
            .merge_metadata(gateway_ref, &metadata)
            .await?
            .ok_or_else(|| LedgerError::UnknownTransaction(gateway_ref.clone()))?;
        if txn.status.is_terminal() {
            debug!(
                "📒️ Transaction {gateway_ref} is already {}. The {outcome} outcome has no further effect.",
                txn.status
            );
            return Ok(FinalizeResult::unchanged(txn));
        }
        // Only reachable if the record was created between the two statements above
        match self.db.finalize_if_pending(gateway_ref, outcome, &metadata).await? {
            Some(txn) => Ok(FinalizeResult::applied(txn)),
            None => {
                let txn = self
                    .db
                    .fetch_transaction(gateway_ref)
                    .await?
                    .ok_or_else(|| LedgerError::UnknownTransaction(gateway_ref.clone()))?;
                Ok(FinalizeResult::unchanged(txn))
            },
        }
    }

    /// Records the gateway's interim report on a transaction without changing its status.
    pub async fn note_pending(&self, gateway_ref: &GatewayRef, metadata: Metadata) -> Result<Transaction, LedgerError> {
        let txn = self
            .db
            .merge_metadata(gateway_ref, &metadata)
            .await?
            .ok_or_else(|| LedgerError::UnknownTransaction(gateway_ref.clone()))?;
        debug!("📒️ Gateway reports transaction {gateway_ref} as still pending. Current status: {}", txn.status);
        Ok(txn)
    }

    pub async fn latest_for(&self, order_ref: &OrderRef) -> Result<Option<Transaction>, LedgerError> {
        self.db.latest_for_order(order_ref).await
    }

    pub async fn fetch(&self, gateway_ref: &GatewayRef) -> Result<Option<Transaction>, LedgerError> {
        self.db.fetch_transaction(gateway_ref).await
    }

    /// Undoes [`Self::create_pending`] for an attempt that never reached the gateway.
    pub async fn rollback_pending(&self, gateway_ref: &GatewayRef) -> Result<bool, LedgerError> {
        let removed = self.db.remove_pending(gateway_ref).await?;
        if removed {
            info!("📒️ Pending transaction {gateway_ref} rolled back");
        } else {
            warn!("📒️ Could not roll back {gateway_ref}. It is no longer pending.");
        }
        Ok(removed)
    }

    /// Active pending attempts older than `age`.
    pub async fn stale_pending(&self, age: Duration) -> Result<Vec<Transaction>, LedgerError> {
        self.db.stale_pending(age).await
    }
}
