use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Transaction};

/// A verified successful payment has been applied to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSucceededEvent {
    pub order: Order,
    pub transaction: Transaction,
}

impl PaymentSucceededEvent {
    pub fn new(order: Order, transaction: Transaction) -> Self {
        Self { order, transaction }
    }
}

/// A payment attempt for the order failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailedEvent {
    pub order: Order,
    pub transaction: Transaction,
}

impl PaymentFailedEvent {
    pub fn new(order: Order, transaction: Transaction) -> Self {
        Self { order, transaction }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order: Order,
    /// True if the order had been paid, and the payment is now owed back to the customer.
    pub refund_due: bool,
}

impl OrderCancelledEvent {
    pub fn new(order: Order, refund_due: bool) -> Self {
        Self { order, refund_due }
    }
}

/// A second successful payment arrived for an order that had already been paid by another transaction. The money
/// has been captured by the gateway and is owed back to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePaymentEvent {
    pub order: Order,
    /// The transaction that was captured but not applied to the order.
    pub transaction: Transaction,
}

impl DuplicatePaymentEvent {
    pub fn new(order: Order, transaction: Transaction) -> Self {
        Self { order, transaction }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    PaymentSucceeded(PaymentSucceededEvent),
    PaymentFailed(PaymentFailedEvent),
    OrderCancelled(OrderCancelledEvent),
    DuplicatePayment(DuplicatePaymentEvent),
}
