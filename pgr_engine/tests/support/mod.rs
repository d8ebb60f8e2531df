#![allow(dead_code)]
use log::*;
use pgr_engine::{
    db_types::{MinorUnits, NewOrder, Order, OrderRef},
    events::EventProducers,
    test_utils::{
        gateway_sim::test_gateway_config,
        prepare_env::{prepare_test_env, random_db_path},
    },
    CartStore,
    CheckoutApi,
    CustomerDetails,
    GatewayConfig,
    InventoryStore,
    OrderApi,
    ReconciliationApi,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const ORDER_TOTAL: i64 = 10_000;
pub const TEA_STOCK: i64 = 10;
pub const MUG_STOCK: i64 = 5;

#[derive(Debug)]
pub struct TestSystem {
    pub db: SqliteDatabase,
    pub config: GatewayConfig,
    pub reconciliation: ReconciliationApi<SqliteDatabase>,
    pub checkout: CheckoutApi<SqliteDatabase>,
    pub orders: OrderApi<SqliteDatabase>,
}

pub async fn setup() -> TestSystem {
    setup_with(EventProducers::default()).await
}

pub async fn setup_with(producers: EventProducers) -> TestSystem {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let config = test_gateway_config();
    let reconciliation = ReconciliationApi::new(db.clone(), config.clone(), producers.clone());
    let checkout = CheckoutApi::new(db.clone(), config.clone());
    let orders = OrderApi::new(db.clone(), producers);
    db.set_stock_level("tea", TEA_STOCK).await.expect("Error setting stock");
    db.set_stock_level("mug", MUG_STOCK).await.expect("Error setting stock");
    TestSystem { db, config, reconciliation, checkout, orders }
}

pub async fn tear_down(mut sys: TestSystem) {
    let url = sys.db.url().to_string();
    if let Err(e) = sys.db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Failed to drop database {url}: {e}");
    }
}

pub fn customer() -> CustomerDetails {
    CustomerDetails::new("Alice", "alice@example.com", "9999999999")
}

/// Two teas at 25.00 and a mug at 50.00, for 100.00 in total. The customer's cart holds the same items.
pub async fn seed_order(sys: &TestSystem, order_ref: &str, customer_ref: &str) -> Order {
    let order = NewOrder::new(OrderRef::from(order_ref), customer_ref)
        .with_item("tea", 2, MinorUnits::from(2500))
        .with_item("mug", 1, MinorUnits::from(5000));
    let order = sys.orders.create_order(order).await.expect("Error creating order");
    sys.db.add_to_cart(customer_ref, "tea", 2).await.expect("Error filling cart");
    sys.db.add_to_cart(customer_ref, "mug", 1).await.expect("Error filling cart");
    order
}

pub async fn stock(sys: &TestSystem, product: &str) -> i64 {
    sys.db.stock_level(product).await.expect("Error fetching stock").unwrap_or_default()
}
