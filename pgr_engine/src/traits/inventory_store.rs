use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Not enough stock of {product_ref} to remove {requested} units")]
    InsufficientStock { product_ref: String, requested: i64 },
}

impl From<sqlx::Error> for InventoryError {
    fn from(e: sqlx::Error) -> Self {
        InventoryError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait InventoryStore: Clone {
    /// Removes `quantity` units of the product from stock.
    ///
    /// A product that does not exist is not an error: it is logged and `Ok(false)` is returned.
    async fn decrement_stock(&self, product_ref: &str, quantity: i64) -> Result<bool, InventoryError>;

    /// Returns `quantity` units of the product to stock. Missing products are treated as in
    /// [`InventoryStore::decrement_stock`].
    async fn increment_stock(&self, product_ref: &str, quantity: i64) -> Result<bool, InventoryError>;

    async fn stock_level(&self, product_ref: &str) -> Result<Option<i64>, InventoryError>;

    /// Creates the product if necessary and sets its stock level.
    async fn set_stock_level(&self, product_ref: &str, stock: i64) -> Result<(), InventoryError>;
}
