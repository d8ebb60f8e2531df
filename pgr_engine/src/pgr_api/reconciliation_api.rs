use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{FinalStatus, Transaction},
    events::EventProducers,
    gateway_config::GatewayConfig,
    helpers::payload_digest,
    pgr_api::{
        errors::ReconciliationError,
        ledger_api::TransactionLedger,
        order_sync_api::{OrderSynchronizer, SyncOutcome},
        payment_objects::{Channel, GatewayOutcome, GatewayResponse, ReconciliationOutcome},
    },
    signer::{Signer, RESPONSE_FIELD_COUNT},
    traits::{CartStore, InventoryStore, LedgerStore, OrderStore},
};

/// The reconciliation dispatcher.
///
/// Both inbound channels, the gateway webhook and the browser return, land here and are handled identically:
///
/// 1. Split the payload into fields.
/// 2. Verify the signature.
/// 3. Check that the response is for our merchant id.
/// 4. Map the gateway status code (unrecognised codes count as failures).
/// 5. Finalize the transaction in the ledger.
/// 6. If, and only if, this call finalized the transaction, synchronize the order.
///
/// Whichever channel arrives first does the work. The other one finds a terminal transaction and simply reports it.
pub struct ReconciliationApi<B> {
    config: GatewayConfig,
    signer: Signer,
    ledger: TransactionLedger<B>,
    synchronizer: OrderSynchronizer<B>,
    db: B,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi ({})", self.config.merchant_id)
    }
}

impl<B: Clone> ReconciliationApi<B> {
    pub fn new(db: B, config: GatewayConfig, producers: EventProducers) -> Self {
        let signer = config.signer();
        let ledger = TransactionLedger::new(db.clone());
        let synchronizer = OrderSynchronizer::new(db.clone(), producers);
        Self { config, signer, ledger, synchronizer, db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ReconciliationApi<B>
where B: LedgerStore + OrderStore + InventoryStore + CartStore
{
    /// Handles the gateway's server-to-server notification.
    pub async fn handle_webhook(&self, raw: &str) -> Result<ReconciliationOutcome, ReconciliationError> {
        self.reconcile(Channel::Webhook, raw).await
    }

    /// Handles the response carried by the customer's browser on its way back from the gateway.
    pub async fn handle_browser_return(&self, raw: &str) -> Result<ReconciliationOutcome, ReconciliationError> {
        self.reconcile(Channel::BrowserReturn, raw).await
    }

    pub async fn reconcile(&self, channel: Channel, raw: &str) -> Result<ReconciliationOutcome, ReconciliationError> {
        let digest = payload_digest(raw);
        let payload = self.signer.verify_signature(raw, RESPONSE_FIELD_COUNT).map_err(|e| {
            warn!("🔄️ Malformed {channel} payload ({digest}): {e}");
            ReconciliationError::from(e)
        })?;
        let response = GatewayResponse::from_fields(&payload.fields);
        let gateway_ref = response.gateway_ref.clone();
        if !payload.verified {
            error!("🔄️ SIGNATURE MISMATCH on {channel} payload claiming to be for {gateway_ref}. Payload digest: {digest}");
            return Err(ReconciliationError::SignatureMismatch { digest });
        }
        if response.merchant_id != self.config.merchant_id {
            error!(
                "🔄️ {channel} payload for {gateway_ref} is addressed to merchant '{}'. Payload digest: {digest}",
                response.merchant_id
            );
            return Err(ReconciliationError::ForeignMerchant { merchant_id: response.merchant_id, digest });
        }
        let Some(txn) = self.ledger.fetch(&gateway_ref).await? else {
            warn!("🔄️ {channel} payload refers to unknown transaction {gateway_ref}. Payload digest: {digest}");
            return Err(ReconciliationError::UnknownTransaction(gateway_ref));
        };
        let mut metadata = response.metadata(channel);
        let status = match response.outcome() {
            GatewayOutcome::PendingStill => {
                let txn = self.ledger.note_pending(&gateway_ref, metadata).await?;
                return Ok(ReconciliationOutcome::new(&txn, channel, false));
            },
            GatewayOutcome::Failed => {
                if !response.is_recognised_status() {
                    warn!(
                        "🔄️ Unrecognised status code '{}' for {gateway_ref}. Treating it as a failure.",
                        response.status_code
                    );
                    metadata.insert("unrecognised_status".into(), response.status_code.clone());
                }
                FinalStatus::Failed
            },
            GatewayOutcome::Success => match response.amount() {
                Ok(amount) if amount == txn.amount => FinalStatus::Success,
                Ok(amount) => {
                    warn!(
                        "🔄️ Gateway reports {amount} paid for {gateway_ref}, but {} was requested. Treating the payment \
                         as failed. Payload digest: {digest}",
                        txn.amount
                    );
                    metadata.insert("amount_mismatch".into(), format!("expected {}, reported {amount}", txn.amount));
                    FinalStatus::Failed
                },
                Err(e) => {
                    warn!("🔄️ Unreadable amount for {gateway_ref}: {e}. Treating the payment as failed.");
                    metadata.insert("amount_mismatch".into(), format!("unreadable amount '{}'", response.amount));
                    FinalStatus::Failed
                },
            },
        };
        let result = self.ledger.finalize(&gateway_ref, status, metadata).await?;
        if result.applied {
            self.synchronize(&result.transaction).await;
        } else {
            debug!(
                "🔄️ {channel} response for {gateway_ref} arrived after the transaction was finalized as {}",
                result.transaction.status
            );
        }
        Ok(ReconciliationOutcome::new(&result.transaction, channel, result.applied))
    }

    /// Runs the order synchronizer for a transaction that was just finalized. Failures here cannot be retried by the
    /// gateway (the transaction is already terminal), so they are logged for an operator.
    async fn synchronize(&self, txn: &Transaction) {
        let order = match self.db.fetch_order_for_gateway_ref(&txn.gateway_ref).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                error!("🔄️ Transaction {} is for order {}, which does not exist", txn.gateway_ref, txn.order_ref);
                return;
            },
            Err(e) => {
                error!(
                    "🔄️ Could not load order {} to apply transaction {}: {e}. The order needs to be synchronized \
                     manually.",
                    txn.order_ref, txn.gateway_ref
                );
                return;
            },
        };
        match self.synchronizer.apply(&order, txn).await {
            Ok(SyncOutcome::Applied(_)) => debug!("🔄️ Order {} synchronized with {}", txn.order_ref, txn.gateway_ref),
            Ok(SyncOutcome::Skipped) => {},
            Ok(SyncOutcome::DuplicatePayment(_)) => {
                warn!("🔄️ Order {} was already paid. {} was captured but not applied.", txn.order_ref, txn.gateway_ref)
            },
            Err(e) => error!(
                "🔄️ Could not synchronize order {} with transaction {}: {e}. The order needs to be synchronized \
                 manually.",
                txn.order_ref, txn.gateway_ref
            ),
        }
    }
}
