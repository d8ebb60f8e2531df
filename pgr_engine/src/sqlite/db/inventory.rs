use log::warn;
use sqlx::SqliteConnection;

use crate::traits::InventoryError;

/// Removes stock, refusing to go below zero. Returns `Ok(false)` if the product is unknown.
pub async fn decrement_stock(
    product_ref: &str,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, InventoryError> {
    let result = sqlx::query(
        r#"
            UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP
            WHERE product_ref = $2 AND stock >= $1
        "#,
    )
    .bind(quantity)
    .bind(product_ref)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() > 0 {
        return Ok(true);
    }
    match stock_level(product_ref, conn).await? {
        Some(_) => Err(InventoryError::InsufficientStock { product_ref: product_ref.to_string(), requested: quantity }),
        None => {
            warn!("🗃️ Product {product_ref} does not exist. Stock was not adjusted.");
            Ok(false)
        },
    }
}

pub async fn increment_stock(
    product_ref: &str,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, InventoryError> {
    let result =
        sqlx::query("UPDATE products SET stock = stock + $1, updated_at = CURRENT_TIMESTAMP WHERE product_ref = $2")
            .bind(quantity)
            .bind(product_ref)
            .execute(conn)
            .await?;
    if result.rows_affected() == 0 {
        warn!("🗃️ Product {product_ref} does not exist. Stock was not adjusted.");
    }
    Ok(result.rows_affected() > 0)
}

pub async fn stock_level(product_ref: &str, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let stock = sqlx::query_scalar("SELECT stock FROM products WHERE product_ref = $1")
        .bind(product_ref)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next();
    Ok(stock)
}

pub async fn set_stock_level(product_ref: &str, stock: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO products (product_ref, stock) VALUES ($1, $2)
            ON CONFLICT (product_ref) DO UPDATE SET stock = excluded.stock, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(product_ref)
    .bind(stock)
    .execute(conn)
    .await?;
    Ok(())
}
