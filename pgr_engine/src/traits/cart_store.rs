use thiserror::Error;

use crate::db_types::CartItem;

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait CartStore: Clone {
    async fn add_to_cart(&self, customer_ref: &str, product_ref: &str, quantity: i64) -> Result<(), CartError>;

    async fn cart_items(&self, customer_ref: &str) -> Result<Vec<CartItem>, CartError>;

    /// Empties the customer's cart, returning the number of lines removed.
    async fn clear_cart(&self, customer_ref: &str) -> Result<u64, CartError>;
}
