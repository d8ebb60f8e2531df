//! `SqliteDatabase` is a concrete implementation of a reconciliation engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{carts, db_url, inventory, new_pool, orders, transactions};
use crate::{
    db_types::{
        CartItem,
        FinalStatus,
        GatewayRef,
        LineItem,
        Metadata,
        NewOrder,
        NewTransaction,
        Order,
        OrderRef,
        PaymentStatus,
        Transaction,
    },
    traits::{
        CartError,
        CartStore,
        InventoryError,
        InventoryStore,
        LedgerError,
        LedgerStore,
        OrderStore,
        OrderStoreError,
        SyncMarker,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl LedgerStore for SqliteDatabase {
    async fn insert_pending(&self, txn: NewTransaction) -> Result<Transaction, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let superseded = transactions::supersede_pending(&txn.order_ref, &mut tx).await?;
        if superseded > 0 {
            debug!("🗃️ {superseded} earlier pending attempt(s) for order {} superseded", txn.order_ref);
        }
        let txn = transactions::insert_transaction(txn, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Pending transaction {} (#{}) recorded for order {}", txn.gateway_ref, txn.id, txn.order_ref);
        Ok(txn)
    }

    async fn finalize_if_pending(
        &self,
        gateway_ref: &GatewayRef,
        status: FinalStatus,
        metadata: &Metadata,
    ) -> Result<Option<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let txn = transactions::finalize_if_pending(gateway_ref, status, metadata, &mut conn).await?;
        Ok(txn)
    }

    async fn merge_metadata(
        &self,
        gateway_ref: &GatewayRef,
        metadata: &Metadata,
    ) -> Result<Option<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let txn = transactions::merge_metadata(gateway_ref, metadata, &mut conn).await?;
        Ok(txn)
    }

    async fn fetch_transaction(&self, gateway_ref: &GatewayRef) -> Result<Option<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let txn = transactions::fetch_transaction(gateway_ref, &mut conn).await?;
        Ok(txn)
    }

    async fn latest_for_order(&self, order_ref: &OrderRef) -> Result<Option<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let txn = transactions::latest_for_order(order_ref, &mut conn).await?;
        Ok(txn)
    }

    async fn transactions_for_order(&self, order_ref: &OrderRef) -> Result<Vec<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let txns = transactions::transactions_for_order(order_ref, &mut conn).await?;
        Ok(txns)
    }

    async fn remove_pending(&self, gateway_ref: &GatewayRef) -> Result<bool, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let removed = transactions::remove_pending(gateway_ref, &mut conn).await?;
        Ok(removed)
    }

    async fn stale_pending(&self, age: Duration) -> Result<Vec<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let txns = transactions::stale_pending(age, &mut conn).await?;
        Ok(txns)
    }
}

impl OrderStore for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, order_ref: &OrderRef) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::fetch_order(order_ref, &mut conn).await? else {
            return Ok(None);
        };
        let items = orders::fetch_line_items(order_ref, &mut conn).await?;
        Ok(Some(order.with_items(items)))
    }

    async fn fetch_order_for_gateway_ref(&self, gateway_ref: &GatewayRef) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::fetch_order_for_gateway_ref(gateway_ref, &mut conn).await? else {
            return Ok(None);
        };
        let items = orders::fetch_line_items(&order.order_ref, &mut conn).await?;
        Ok(Some(order.with_items(items)))
    }

    async fn fetch_line_items(&self, order_ref: &OrderRef) -> Result<Vec<LineItem>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_line_items(order_ref, &mut conn).await?;
        Ok(items)
    }

    async fn save_order(&self, order: &Order, expected: PaymentStatus) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let Some(saved) = orders::save_order(order, expected, &mut conn).await? else {
            debug!("🗃️ Order {} was not saved. Its payment status is no longer {expected}", order.order_ref);
            return Ok(None);
        };
        trace!("🗃️ Order {} saved: {} / {}", saved.order_ref, saved.payment_status, saved.fulfillment_status);
        Ok(Some(saved.with_items(order.items.clone())))
    }

    async fn try_mark_synchronized(
        &self,
        order_ref: &OrderRef,
        marker: SyncMarker,
    ) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::try_mark_synchronized(order_ref, marker, &mut conn).await? else {
            return Ok(None);
        };
        let items = orders::fetch_line_items(order_ref, &mut conn).await?;
        Ok(Some(order.with_items(items)))
    }
}

impl InventoryStore for SqliteDatabase {
    async fn decrement_stock(&self, product_ref: &str, quantity: i64) -> Result<bool, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        inventory::decrement_stock(product_ref, quantity, &mut conn).await
    }

    async fn increment_stock(&self, product_ref: &str, quantity: i64) -> Result<bool, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        inventory::increment_stock(product_ref, quantity, &mut conn).await
    }

    async fn stock_level(&self, product_ref: &str) -> Result<Option<i64>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        let stock = inventory::stock_level(product_ref, &mut conn).await?;
        Ok(stock)
    }

    async fn set_stock_level(&self, product_ref: &str, stock: i64) -> Result<(), InventoryError> {
        let mut conn = self.pool.acquire().await?;
        inventory::set_stock_level(product_ref, stock, &mut conn).await?;
        Ok(())
    }
}

impl CartStore for SqliteDatabase {
    async fn add_to_cart(&self, customer_ref: &str, product_ref: &str, quantity: i64) -> Result<(), CartError> {
        let mut conn = self.pool.acquire().await?;
        carts::add_to_cart(customer_ref, product_ref, quantity, &mut conn).await?;
        Ok(())
    }

    async fn cart_items(&self, customer_ref: &str) -> Result<Vec<CartItem>, CartError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::cart_items(customer_ref, &mut conn).await?;
        Ok(items)
    }

    async fn clear_cart(&self, customer_ref: &str) -> Result<u64, CartError> {
        let mut conn = self.pool.acquire().await?;
        let removed = carts::clear_cart(customer_ref, &mut conn).await?;
        Ok(removed)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}
