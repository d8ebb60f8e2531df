use thiserror::Error;

use crate::{
    db_types::{GatewayRef, LineItem, NewOrder, Order, OrderRef, PaymentStatus},
    traits::SyncMarker,
};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists: {0}")]
    OrderAlreadyExists(OrderRef),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderRef),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// Stores the order and its line items in a single atomic operation.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    /// Fetches the order, including its line items.
    async fn fetch_order(&self, order_ref: &OrderRef) -> Result<Option<Order>, OrderStoreError>;

    /// Fetches the order that the transaction with the given gateway reference belongs to.
    async fn fetch_order_for_gateway_ref(&self, gateway_ref: &GatewayRef) -> Result<Option<Order>, OrderStoreError>;

    async fn fetch_line_items(&self, order_ref: &OrderRef) -> Result<Vec<LineItem>, OrderStoreError>;

    /// Writes the order's payment status, fulfillment status and cancellation reason, provided the stored payment
    /// status is still `expected`. Returns `None` if the payment status changed in the meantime.
    async fn save_order(&self, order: &Order, expected: PaymentStatus) -> Result<Option<Order>, OrderStoreError>;

    /// Atomically projects a transaction outcome onto the order.
    ///
    /// The write only happens if the order has not already been synchronized with this transaction, and its payment
    /// status is not settled (`Paid` or `Refunded`). Returns the updated order if this call won, or `None` if the
    /// write was skipped.
    async fn try_mark_synchronized(
        &self,
        order_ref: &OrderRef,
        marker: SyncMarker,
    ) -> Result<Option<Order>, OrderStoreError>;
}
