//! Payment Gateway Reconciliation Engine
//!
//! The engine takes care of the money side of an online checkout that uses an external, redirect-based payment
//! gateway. It signs payment requests, records every payment attempt, and turns the gateway's responses into
//! exactly-once updates to the order.
//!
//! Gateway responses arrive through two independent channels: the gateway's server-to-server webhook, and the
//! customer's browser being redirected back to the shop. Either may arrive first, more than once, or not at all, and
//! either may be forged. The engine verifies both the same way and lets whichever arrives first finalize the payment.
//!
//! The library is divided into the following sections:
//! 1. The [`signer`], which builds and verifies HMAC-signed gateway messages. It does no I/O.
//! 2. Backend contracts ([`traits`]) and the SQLite implementation ([`SqliteDatabase`]). You should never need to
//!    access the database directly. Instead, use the public API.
//! 3. The public API ([`mod@pgr_api`]): checkout, the reconciliation dispatcher, the transaction ledger, the order
//!    synchronizer, and order management.
//!
//! The engine also emits events (payment succeeded, payment failed, order cancelled) that can be subscribed to via
//! [`events::EventHooks`]. Handlers run on their own tasks and can never hold up a payment.
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
pub mod events;
pub mod gateway_config;
pub mod helpers;
pub mod pgr_api;
pub mod signer;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use gateway_config::GatewayConfig;
pub use pgr_api::{
    checkout_api::{CheckoutApi, ConnectorError, GatewayConnector},
    errors::{OrderApiError, ReconciliationError, SyncError},
    ledger_api::TransactionLedger,
    order_api::OrderApi,
    order_sync_api::{OrderSynchronizer, SyncOutcome},
    payment_objects,
    reconciliation_api::ReconciliationApi,
};
pub use signer::{CustomerDetails, Signer, SignerError};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CartError,
    CartStore,
    FinalizeResult,
    InventoryError,
    InventoryStore,
    LedgerError,
    LedgerStore,
    OrderStore,
    OrderStoreError,
};
