use chrono::Duration;
use mockall::mock;
use pgr_engine::{
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
    traits::SyncMarker,
    CartError,
    CartStore,
    InventoryError,
    InventoryStore,
    LedgerError,
    LedgerStore,
    OrderStore,
    OrderStoreError,
};

mock! {
    pub Backend {}
    impl Clone for Backend {
        fn clone(&self) -> Self;
    }
    impl LedgerStore for Backend {
        async fn insert_pending(&self, txn: NewTransaction) -> Result<Transaction, LedgerError>;
        async fn finalize_if_pending(&self, gateway_ref: &GatewayRef, status: FinalStatus, metadata: &Metadata) -> Result<Option<Transaction>, LedgerError>;
        async fn merge_metadata(&self, gateway_ref: &GatewayRef, metadata: &Metadata) -> Result<Option<Transaction>, LedgerError>;
        async fn fetch_transaction(&self, gateway_ref: &GatewayRef) -> Result<Option<Transaction>, LedgerError>;
        async fn latest_for_order(&self, order_ref: &OrderRef) -> Result<Option<Transaction>, LedgerError>;
        async fn transactions_for_order(&self, order_ref: &OrderRef) -> Result<Vec<Transaction>, LedgerError>;
        async fn remove_pending(&self, gateway_ref: &GatewayRef) -> Result<bool, LedgerError>;
        async fn stale_pending(&self, age: Duration) -> Result<Vec<Transaction>, LedgerError>;
    }
    impl OrderStore for Backend {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;
        async fn fetch_order(&self, order_ref: &OrderRef) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_for_gateway_ref(&self, gateway_ref: &GatewayRef) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_line_items(&self, order_ref: &OrderRef) -> Result<Vec<LineItem>, OrderStoreError>;
        async fn save_order(&self, order: &Order, expected: PaymentStatus) -> Result<Option<Order>, OrderStoreError>;
        async fn try_mark_synchronized(&self, order_ref: &OrderRef, marker: SyncMarker) -> Result<Option<Order>, OrderStoreError>;
    }
    impl InventoryStore for Backend {
        async fn decrement_stock(&self, product_ref: &str, quantity: i64) -> Result<bool, InventoryError>;
        async fn increment_stock(&self, product_ref: &str, quantity: i64) -> Result<bool, InventoryError>;
        async fn stock_level(&self, product_ref: &str) -> Result<Option<i64>, InventoryError>;
        async fn set_stock_level(&self, product_ref: &str, stock: i64) -> Result<(), InventoryError>;
    }
    impl CartStore for Backend {
        async fn add_to_cart(&self, customer_ref: &str, product_ref: &str, quantity: i64) -> Result<(), CartError>;
        async fn cart_items(&self, customer_ref: &str) -> Result<Vec<CartItem>, CartError>;
        async fn clear_cart(&self, customer_ref: &str) -> Result<u64, CartError>;
    }
}

/// A backend whose clones accept no calls at all. Any database access fails the test.
pub fn untouched_backend() -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_clone().returning(MockBackend::new);
    backend
}
