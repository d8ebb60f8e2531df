use chrono::Duration;
use log::{debug, trace};
use sqlx::{types::Json, SqliteConnection};

use super::first_row;
use crate::{
    db_types::{FinalStatus, GatewayRef, Metadata, NewTransaction, OrderRef, Transaction, TransactionStatus},
    traits::LedgerError,
};

/// Marks every active pending transaction for the order as superseded. Returns the number of rows affected.
pub async fn supersede_pending(order_ref: &OrderRef, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE transactions SET superseded_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
            WHERE order_ref = $1 AND status = 'Pending' AND superseded_at IS NULL
        "#,
    )
    .bind(order_ref.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Inserts a new pending transaction. This is not atomic with respect to [`supersede_pending`]. Embed both calls
/// inside a transaction and pass `&mut *tx` as the connection argument.
pub async fn insert_transaction(
    txn: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<Transaction, LedgerError> {
    let gateway_ref = txn.gateway_ref.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO transactions (order_ref, gateway_ref, amount, currency, status)
            VALUES ($1, $2, $3, $4, 'Pending')
            RETURNING *;
        "#,
    )
    .bind(txn.order_ref)
    .bind(txn.gateway_ref)
    .bind(txn.amount)
    .bind(txn.currency)
    .fetch_all(conn)
    .await
    .and_then(first_row);
    match result {
        Ok(txn) => Ok(txn),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Err(LedgerError::DuplicateGatewayRef(gateway_ref)),
        Err(e) => Err(e.into()),
    }
}

/// The compare-and-set at the heart of the ledger. Only a row that is still `Pending` is updated, so at most one
/// caller ever gets `Some` back for a given gateway reference.
pub async fn finalize_if_pending(
    gateway_ref: &GatewayRef,
    status: FinalStatus,
    metadata: &Metadata,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let status = TransactionStatus::from(status);
    let txn: Option<Transaction> = sqlx::query_as(
        r#"
            UPDATE transactions
            SET status = $1, metadata = json_patch(metadata, $2), updated_at = CURRENT_TIMESTAMP
            WHERE gateway_ref = $3 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(Json(metadata))
    .bind(gateway_ref.as_str())
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    if txn.is_some() {
        debug!("🗃️ Transaction {gateway_ref} moved from Pending to {status}");
    }
    Ok(txn)
}

/// Adds any keys from `metadata` that the transaction does not already carry.
pub async fn merge_metadata(
    gateway_ref: &GatewayRef,
    metadata: &Metadata,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let txn = sqlx::query_as(
        r#"
            UPDATE transactions
            SET metadata = json_patch($1, metadata), updated_at = CURRENT_TIMESTAMP
            WHERE gateway_ref = $2
            RETURNING *;
        "#,
    )
    .bind(Json(metadata))
    .bind(gateway_ref.as_str())
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(txn)
}

pub async fn fetch_transaction(
    gateway_ref: &GatewayRef,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let txn = sqlx::query_as("SELECT * FROM transactions WHERE gateway_ref = $1")
        .bind(gateway_ref.as_str())
        .fetch_all(conn)
        .await?
        .into_iter()
        .next();
    Ok(txn)
}

pub async fn latest_for_order(
    order_ref: &OrderRef,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let txn = sqlx::query_as("SELECT * FROM transactions WHERE order_ref = $1 ORDER BY id DESC LIMIT 1")
        .bind(order_ref.as_str())
        .fetch_all(conn)
        .await?
        .into_iter()
        .next();
    Ok(txn)
}

/// All transactions for the order, oldest first.
pub async fn transactions_for_order(
    order_ref: &OrderRef,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let txns = sqlx::query_as("SELECT * FROM transactions WHERE order_ref = $1 ORDER BY id ASC")
        .bind(order_ref.as_str())
        .fetch_all(conn)
        .await?;
    Ok(txns)
}

pub async fn remove_pending(gateway_ref: &GatewayRef, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transactions WHERE gateway_ref = $1 AND status = 'Pending'")
        .bind(gateway_ref.as_str())
        .execute(conn)
        .await?;
    trace!("🗃️ Removed {} pending transaction(s) for {gateway_ref}", result.rows_affected());
    Ok(result.rows_affected() > 0)
}

pub async fn stale_pending(age: Duration, conn: &mut SqliteConnection) -> Result<Vec<Transaction>, sqlx::Error> {
    let modifier = format!("-{} seconds", age.num_seconds().max(0));
    let txns = sqlx::query_as(
        r#"
            SELECT * FROM transactions
            WHERE status = 'Pending' AND superseded_at IS NULL AND created_at < datetime('now', $1)
            ORDER BY created_at ASC
        "#,
    )
    .bind(modifier)
    .fetch_all(conn)
    .await?;
    Ok(txns)
}
