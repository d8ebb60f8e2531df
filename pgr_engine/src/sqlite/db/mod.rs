//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! Single-row queries use `fetch_all` rather than `fetch_optional`/`fetch_one`. SQLite only completes a statement
//! (and releases its read snapshot, or commits an `UPDATE ... RETURNING`) once it has been stepped to the end, and a
//! half-read statement on a pooled connection leaves later readers on that connection looking at stale rows.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod carts;
pub mod inventory;
pub mod orders;
pub mod transactions;

const SQLITE_DB_URL: &str = "sqlite://data/payments.db";

pub fn db_url() -> String {
    let result = env::var("PGR_DATABASE_URL").unwrap_or_else(|_| {
        info!("PGR_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

/// The single row of a `fetch_all` result that is expected to return exactly one row.
pub(crate) fn first_row<T>(rows: Vec<T>) -> Result<T, SqlxError> {
    rows.into_iter().next().ok_or(SqlxError::RowNotFound)
}
