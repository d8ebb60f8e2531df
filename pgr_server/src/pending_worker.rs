use chrono::Duration;
use log::*;
use pgr_engine::{db_types::Transaction, SqliteDatabase, TransactionLedger};
use tokio::task::JoinHandle;

/// Starts the pending attempt worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every minute, payment attempts that have been pending for longer than `alert_after` are reported. The gateway
/// never told us how they ended, so someone needs to look them up. They are never finalized from here.
pub fn start_pending_worker(db: SqliteDatabase, alert_after: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        let ledger = TransactionLedger::new(db);
        info!("🕰️ Pending payment worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Looking for stale pending payments");
            match ledger.stale_pending(alert_after).await {
                Ok(stale) if stale.is_empty() => trace!("🕰️ No stale pending payments"),
                Ok(stale) => {
                    warn!(
                        "🕰️ {} payment(s) have been pending for more than {} minutes and need manual follow-up: {}",
                        stale.len(),
                        alert_after.num_minutes(),
                        transaction_list(&stale)
                    );
                },
                Err(e) => {
                    error!("🕰️ Error running the pending payment job: {e}");
                },
            }
        }
    })
}

fn transaction_list(txns: &[Transaction]) -> String {
    txns.iter()
        .map(|t| format!("[{}] order: {} amount: {} since: {}", t.gateway_ref, t.order_ref, t.amount, t.created_at))
        .collect::<Vec<String>>()
        .join(", ")
}
