use sqlx::SqliteConnection;

use crate::db_types::CartItem;

pub async fn add_to_cart(
    customer_ref: &str,
    product_ref: &str,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO cart_items (customer_ref, product_ref, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (customer_ref, product_ref) DO UPDATE SET quantity = quantity + excluded.quantity
        "#,
    )
    .bind(customer_ref)
    .bind(product_ref)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn cart_items(customer_ref: &str, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    let items = sqlx::query_as(
        "SELECT customer_ref, product_ref, quantity FROM cart_items WHERE customer_ref = $1 ORDER BY product_ref",
    )
    .bind(customer_ref)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

pub async fn clear_cart(customer_ref: &str, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE customer_ref = $1").bind(customer_ref).execute(conn).await?;
    Ok(result.rows_affected())
}
