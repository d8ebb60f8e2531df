use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{FulfillmentStatus, Order, PaymentStatus, Transaction, TransactionStatus},
    events::{DuplicatePaymentEvent, EventProducers, PaymentFailedEvent, PaymentSucceededEvent},
    pgr_api::errors::SyncError,
    traits::{CartStore, InventoryStore, OrderStore, SyncMarker},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The order was updated and side effects were run.
    Applied(Order),
    /// The order had already been synchronized with this transaction, or its payment status is settled.
    Skipped,
    /// A successful transaction arrived for an order that another transaction had already paid. The order is left
    /// alone and the captured amount has to be refunded.
    DuplicatePayment(Order),
}

/// Projects a finalized transaction onto its order.
///
/// Success marks the order paid, moves fulfillment on to processing, takes the items out of stock and empties the
/// customer's cart. Failure marks the order's payment as failed and nothing else.
///
/// Each transaction is applied at most once per order. The guard is the order's synchronized-transaction marker,
/// which is checked and set in a single statement by [`OrderStore::try_mark_synchronized`].
pub struct OrderSynchronizer<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderSynchronizer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderSynchronizer")
    }
}

impl<B> OrderSynchronizer<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderSynchronizer<B>
where B: OrderStore + InventoryStore + CartStore
{
    pub async fn apply(&self, order: &Order, txn: &Transaction) -> Result<SyncOutcome, SyncError> {
        if !txn.status.is_terminal() {
            return Err(SyncError::Precondition(format!("Transaction {} is still pending", txn.gateway_ref)));
        }
        if txn.order_ref != order.order_ref {
            return Err(SyncError::Precondition(format!(
                "Transaction {} belongs to order {}, not {}",
                txn.gateway_ref, txn.order_ref, order.order_ref
            )));
        }
        let marker = match txn.status {
            TransactionStatus::Success => SyncMarker {
                transaction_id: txn.id,
                payment_status: PaymentStatus::Paid,
                fulfillment_status: Some(FulfillmentStatus::Processing),
            },
            _ => SyncMarker { transaction_id: txn.id, payment_status: PaymentStatus::Failed, fulfillment_status: None },
        };
        let Some(updated) = self.db.try_mark_synchronized(&order.order_ref, marker).await? else {
            return self.on_skipped(order, txn).await;
        };
        info!("📦️ Order {} is now {} ({})", updated.order_ref, updated.payment_status, updated.fulfillment_status);
        match txn.status {
            TransactionStatus::Success => self.on_success(order, &updated, txn).await,
            _ => self.on_failure(&updated, txn),
        }
        Ok(SyncOutcome::Applied(updated))
    }

    async fn on_success(&self, original: &Order, updated: &Order, txn: &Transaction) {
        if updated.is_cancelled() {
            warn!(
                "📦️ Order {} was paid after it had been cancelled. Stock has not been adjusted. The payment {} \
                 needs to be refunded manually.",
                updated.order_ref, txn.gateway_ref
            );
        } else {
            let items = if updated.items.is_empty() { &original.items } else { &updated.items };
            for item in items {
                match self.db.decrement_stock(&item.product_ref, item.quantity).await {
                    Ok(true) => trace!("📦️ {} x {} taken out of stock", item.quantity, item.product_ref),
                    Ok(false) => {},
                    Err(e) => error!(
                        "📦️ Could not take {} x {} out of stock for order {}: {e}. Stock needs to be adjusted \
                         manually.",
                        item.quantity, item.product_ref, updated.order_ref
                    ),
                }
            }
        }
        match self.db.clear_cart(&updated.customer_ref).await {
            Ok(n) => debug!("📦️ Cleared {n} cart item(s) for customer {}", updated.customer_ref),
            Err(e) => error!("📦️ Could not clear the cart for customer {}: {e}", updated.customer_ref),
        }
        for producer in &self.producers.payment_succeeded_producer {
            producer.publish_event(PaymentSucceededEvent::new(updated.clone(), txn.clone()));
        }
    }

    async fn on_skipped(&self, order: &Order, txn: &Transaction) -> Result<SyncOutcome, SyncError> {
        let current = match txn.status {
            TransactionStatus::Success => self.db.fetch_order(&order.order_ref).await?,
            _ => None,
        };
        match current {
            Some(current)
                if current.payment_status.is_settled() && current.synced_transaction_id != Some(txn.id) =>
            {
                error!(
                    "📦️ Order {} was already paid by transaction #{} when payment {} for {} also succeeded. The \
                     second payment was not applied and needs to be refunded manually.",
                    current.order_ref,
                    current.synced_transaction_id.map(|id| id.to_string()).unwrap_or_else(|| "?".into()),
                    txn.gateway_ref,
                    txn.amount
                );
                for producer in &self.producers.duplicate_payment_producer {
                    producer.publish_event(DuplicatePaymentEvent::new(current.clone(), txn.clone()));
                }
                Ok(SyncOutcome::DuplicatePayment(current))
            },
            _ => {
                debug!(
                    "📦️ Order {} already reflects transaction {} (or its payment is settled). Nothing to do.",
                    order.order_ref, txn.gateway_ref
                );
                Ok(SyncOutcome::Skipped)
            },
        }
    }

    fn on_failure(&self, updated: &Order, txn: &Transaction) {
        for producer in &self.producers.payment_failed_producer {
            producer.publish_event(PaymentFailedEvent::new(updated.clone(), txn.clone()));
        }
    }
}
