use log::{debug, trace};
use sqlx::SqliteConnection;

use super::first_row;
use crate::{
    db_types::{GatewayRef, LineItem, NewOrder, Order, OrderRef, PaymentStatus},
    traits::{OrderStoreError, SyncMarker},
};

/// Inserts a new order and its line items using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let order_ref = order.order_ref.clone();
    let total = order.total();
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (order_ref, customer_ref, total, currency)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order.order_ref.as_str())
    .bind(order.customer_ref)
    .bind(total)
    .bind(order.currency)
    .fetch_all(&mut *conn)
    .await
    .and_then(first_row);
    let saved: Order = match result {
        Ok(o) => o,
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Err(OrderStoreError::OrderAlreadyExists(order_ref))
        },
        Err(e) => return Err(e.into()),
    };
    for item in &order.items {
        insert_line_item(&order_ref, item, conn).await?;
    }
    debug!("📝️ Order [{order_ref}] inserted with id {} and {} line items", saved.id, order.items.len());
    Ok(saved.with_items(order.items))
}

async fn insert_line_item(
    order_ref: &OrderRef,
    item: &LineItem,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO order_items (order_ref, product_ref, quantity, unit_price) VALUES ($1, $2, $3, $4)")
        .bind(order_ref.as_str())
        .bind(item.product_ref.as_str())
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(conn)
        .await?;
    Ok(())
}

/// Returns the order row for the given reference, without line items.
pub async fn fetch_order(order_ref: &OrderRef, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_ref = $1")
        .bind(order_ref.as_str())
        .fetch_all(conn)
        .await?
        .into_iter()
        .next();
    Ok(order)
}

pub async fn fetch_order_for_gateway_ref(
    gateway_ref: &GatewayRef,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            SELECT orders.* FROM orders
            JOIN transactions ON transactions.order_ref = orders.order_ref
            WHERE transactions.gateway_ref = $1
        "#,
    )
    .bind(gateway_ref.as_str())
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(order)
}

pub async fn fetch_line_items(order_ref: &OrderRef, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, sqlx::Error> {
    let items = sqlx::query_as(
        "SELECT product_ref, quantity, unit_price FROM order_items WHERE order_ref = $1 ORDER BY id ASC",
    )
    .bind(order_ref.as_str())
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Writes the mutable order fields, as long as the payment status has not moved away from `expected`.
pub async fn save_order(
    order: &Order,
    expected: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let result = sqlx::query_as(
        r#"
            UPDATE orders
            SET payment_status = $1, fulfillment_status = $2, cancel_reason = $3, updated_at = CURRENT_TIMESTAMP
            WHERE order_ref = $4 AND payment_status = $5
            RETURNING *;
        "#,
    )
    .bind(order.payment_status)
    .bind(order.fulfillment_status)
    .bind(order.cancel_reason.as_deref())
    .bind(order.order_ref.as_str())
    .bind(expected)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(result)
}

/// The order-side compare-and-set. See [`crate::traits::OrderStore::try_mark_synchronized`].
pub async fn try_mark_synchronized(
    order_ref: &OrderRef,
    marker: SyncMarker,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET payment_status = $1,
                fulfillment_status = CASE
                    WHEN fulfillment_status = 'Pending' THEN COALESCE($2, fulfillment_status)
                    ELSE fulfillment_status
                END,
                synced_transaction_id = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_ref = $4
              AND (synced_transaction_id IS NULL OR synced_transaction_id <> $3)
              AND payment_status NOT IN ('Paid', 'Refunded')
            RETURNING *;
        "#,
    )
    .bind(marker.payment_status)
    .bind(marker.fulfillment_status)
    .bind(marker.transaction_id)
    .bind(order_ref.as_str())
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    trace!(
        "📝️ Synchronization marker for order {order_ref} with transaction #{}: {}",
        marker.transaction_id,
        if order.is_some() { "set" } else { "skipped" }
    );
    Ok(order)
}
