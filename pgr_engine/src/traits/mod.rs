//! # Backend contracts
//!
//! This module defines the behaviour that a storage backend must expose in order to be used by the reconciliation
//! engine. The engine APIs are generic over these traits, and [`crate::SqliteDatabase`] implements all of them.
//!
//! * [`LedgerStore`] persists payment attempts ([`crate::db_types::Transaction`]) and enforces the pending to terminal
//!   state machine with a single conditional write.
//! * [`OrderStore`] reads and writes orders, and owns the atomic "synchronized transaction" marker that keeps order
//!   side effects exactly-once.
//! * [`InventoryStore`] adjusts product stock levels.
//! * [`CartStore`] manages customers' shopping carts.
mod cart_store;
mod data_objects;
mod inventory_store;
mod ledger_store;
mod order_store;

pub use cart_store::{CartError, CartStore};
pub use data_objects::{FinalizeResult, SyncMarker};
pub use inventory_store::{InventoryError, InventoryStore};
pub use ledger_store::{LedgerError, LedgerStore};
pub use order_store::{OrderStore, OrderStoreError};
