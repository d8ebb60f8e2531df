//! # Reconciliation engine public API
//!
//! The `pgr_api` module exposes the programmatic API of the engine. Like the backend traits, it is modular:
//!
//! * [`checkout_api`] starts a payment attempt: it signs the request for the gateway and records the pending
//!   transaction.
//! * [`reconciliation_api`] is the single entry point for both inbound channels (the gateway's server-to-server
//!   webhook and the customer's browser returning from the gateway).
//! * [`ledger_api`] wraps the transaction ledger and its exactly-once `finalize`.
//! * [`order_sync_api`] projects finalized outcomes onto orders, inventory and carts.
//! * [`order_api`] creates, queries and cancels orders.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits the API needs.
//!
//! ```rust,ignore
//! use pgr_engine::{ReconciliationApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = ReconciliationApi::new(db, gateway_config, producers);
//! let outcome = api.handle_webhook(&msg).await?;
//! ```
pub mod checkout_api;
pub mod errors;
pub mod ledger_api;
pub mod order_api;
pub mod order_sync_api;
pub mod payment_objects;
pub mod reconciliation_api;

pub use payment_objects::{STATUS_FAILED, STATUS_PENDING, STATUS_SUCCESS};
