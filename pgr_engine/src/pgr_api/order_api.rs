use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{FulfillmentStatus, NewOrder, Order, OrderRef, PaymentStatus},
    events::{EventProducers, OrderCancelledEvent},
    pgr_api::{errors::OrderApiError, payment_objects::PaymentStatusReport},
    traits::{InventoryStore, LedgerStore, OrderStore},
};

/// Order creation, queries and cancellation.
pub struct OrderApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi")
    }
}

impl<B> OrderApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderApi<B>
where B: OrderStore + LedgerStore + InventoryStore
{
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderApiError> {
        if order.items.is_empty() {
            return Err(OrderApiError::InvalidOrder("An order needs at least one line item".into()));
        }
        if let Some(item) = order.items.iter().find(|i| i.quantity <= 0 || i.unit_price.value() < 0) {
            return Err(OrderApiError::InvalidOrder(format!("Invalid line item for {}", item.product_ref)));
        }
        if !order.total().is_positive() {
            return Err(OrderApiError::InvalidOrder("The order total must be positive".into()));
        }
        let order = self.db.insert_order(order).await?;
        info!("🛍️️ Order {} created for {} ({})", order.order_ref, order.customer_ref, order.total);
        Ok(order)
    }

    pub async fn fetch_order(&self, order_ref: &OrderRef) -> Result<Option<Order>, OrderApiError> {
        let order = self.db.fetch_order(order_ref).await?;
        Ok(order)
    }

    /// The order together with its most recent payment attempt.
    pub async fn payment_status(&self, order_ref: &OrderRef) -> Result<PaymentStatusReport, OrderApiError> {
        let order =
            self.db.fetch_order(order_ref).await?.ok_or_else(|| OrderApiError::OrderNotFound(order_ref.clone()))?;
        let latest_transaction = self.db.latest_for_order(order_ref).await?;
        Ok(PaymentStatusReport { order, latest_transaction })
    }

    /// Cancels the order.
    ///
    /// Orders that are already cancelled, shipped or delivered cannot be cancelled. If the order was paid, its payment
    /// status becomes `Refunded` and its items are returned to stock. Refunding the money itself happens outside the
    /// engine.
    pub async fn cancel_order(&self, order_ref: &OrderRef, reason: Option<String>) -> Result<Order, OrderApiError> {
        let mut order =
            self.db.fetch_order(order_ref).await?.ok_or_else(|| OrderApiError::OrderNotFound(order_ref.clone()))?;
        match order.fulfillment_status {
            FulfillmentStatus::Cancelled => {
                return Err(OrderApiError::CancellationForbidden(format!("Order {order_ref} is already cancelled")))
            },
            FulfillmentStatus::Shipped | FulfillmentStatus::Delivered => {
                return Err(OrderApiError::CancellationForbidden(format!(
                    "Order {order_ref} is {} and can no longer be cancelled",
                    order.fulfillment_status
                )))
            },
            FulfillmentStatus::Pending | FulfillmentStatus::Processing => {},
        }
        let expected = order.payment_status;
        let refund_due = expected == PaymentStatus::Paid;
        order.fulfillment_status = FulfillmentStatus::Cancelled;
        order.cancel_reason = reason;
        if refund_due {
            order.payment_status = PaymentStatus::Refunded;
        }
        let order = self
            .db
            .save_order(&order, expected)
            .await?
            .ok_or_else(|| OrderApiError::ConcurrentUpdate(order_ref.clone()))?;
        info!("🛍️️ Order {order_ref} cancelled. Refund due: {refund_due}");
        if refund_due {
            for item in &order.items {
                if let Err(e) = self.db.increment_stock(&item.product_ref, item.quantity).await {
                    error!(
                        "🛍️️ Could not return {} x {} to stock for cancelled order {order_ref}: {e}",
                        item.quantity, item.product_ref
                    );
                }
            }
        }
        for producer in &self.producers.order_cancelled_producer {
            producer.publish_event(OrderCancelledEvent::new(order.clone(), refund_due));
        }
        Ok(order)
    }
}
