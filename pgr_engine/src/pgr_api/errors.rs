use thiserror::Error;

use crate::{
    db_types::{GatewayRef, OrderRef},
    signer::SignerError,
    traits::{InventoryError, LedgerError, OrderStoreError},
};

/// Errors from handling an inbound gateway response. Every variant is terminal for the response it describes.
#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("The gateway payload could not be parsed. {0}")]
    MalformedPayload(String),
    #[error("The gateway payload signature does not match. Payload digest: {digest}")]
    SignatureMismatch { digest: String },
    #[error("The gateway payload is for merchant {merchant_id}, not us. Payload digest: {digest}")]
    ForeignMerchant { merchant_id: String, digest: String },
    #[error("No transaction exists for gateway reference {0}")]
    UnknownTransaction(GatewayRef),
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
}

impl ReconciliationError {
    /// Transient errors are worth a retry from the gateway. Everything else will fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(self, ReconciliationError::DatabaseError(_))
    }

    /// Errors that suggest tampering or misconfiguration, rather than ordinary bad luck.
    pub fn is_security_event(&self) -> bool {
        matches!(self, ReconciliationError::SignatureMismatch { .. } | ReconciliationError::ForeignMerchant { .. })
    }
}

impl From<LedgerError> for ReconciliationError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::UnknownTransaction(g) => ReconciliationError::UnknownTransaction(g),
            e => ReconciliationError::DatabaseError(e.to_string()),
        }
    }
}

impl From<SignerError> for ReconciliationError {
    fn from(e: SignerError) -> Self {
        ReconciliationError::MalformedPayload(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("Cannot synchronize order. {0}")]
    Precondition(String),
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
}

impl From<OrderStoreError> for SyncError {
    fn from(e: OrderStoreError) -> Self {
        SyncError::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderRef),
    #[error("Cannot insert order, since it already exists: {0}")]
    OrderAlreadyExists(OrderRef),
    #[error("Order {0} has already been paid")]
    AlreadyPaid(OrderRef),
    #[error("Order {0} has been cancelled")]
    OrderCancelled(OrderRef),
    #[error("The order is not valid. {0}")]
    InvalidOrder(String),
    #[error("The order cannot be cancelled. {0}")]
    CancellationForbidden(String),
    #[error("Order {0} was modified by another request. Try again.")]
    ConcurrentUpdate(OrderRef),
    #[error("Could not build the payment request. {0}")]
    SigningError(#[from] SignerError),
    #[error("A transaction with gateway reference {0} already exists")]
    DuplicateGatewayRef(GatewayRef),
    #[error("The payment gateway could not be reached. {0}")]
    GatewayUnavailable(String),
}

impl From<OrderStoreError> for OrderApiError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::OrderAlreadyExists(o) => OrderApiError::OrderAlreadyExists(o),
            OrderStoreError::OrderNotFound(o) => OrderApiError::OrderNotFound(o),
            OrderStoreError::DatabaseError(s) => OrderApiError::DatabaseError(s),
        }
    }
}

impl From<LedgerError> for OrderApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DuplicateGatewayRef(g) => OrderApiError::DuplicateGatewayRef(g),
            e => OrderApiError::DatabaseError(e.to_string()),
        }
    }
}

impl From<InventoryError> for OrderApiError {
    fn from(e: InventoryError) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}
