//! Default event hooks installed by the server.
//!
//! Order confirmation emails, refund workflows and the like hang off these events. The server itself only logs them.
use futures::FutureExt;
use log::*;
use pgr_engine::events::EventHooks;

pub fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_payment_succeeded(|ev| {
            info!(
                "📬️ Order {} paid by {} ({}). Customer {} can be notified.",
                ev.order.order_ref, ev.transaction.gateway_ref, ev.transaction.amount, ev.order.customer_ref
            );
            async {}.boxed()
        })
        .on_payment_failed(|ev| {
            info!(
                "📬️ Payment {} for order {} failed. {}",
                ev.transaction.gateway_ref,
                ev.order.order_ref,
                ev.transaction.meta("error_description").unwrap_or("No reason given")
            );
            async {}.boxed()
        })
        .on_order_cancelled(|ev| {
            if ev.refund_due {
                warn!(
                    "📬️ Order {} was cancelled after payment. {} needs to be refunded to customer {}.",
                    ev.order.order_ref, ev.order.total, ev.order.customer_ref
                );
            } else {
                info!("📬️ Order {} was cancelled", ev.order.order_ref);
            }
            async {}.boxed()
        })
        .on_duplicate_payment(|ev| {
            warn!(
                "📬️ Payment {} captured {} for order {}, which was already paid. Refund customer {}.",
                ev.transaction.gateway_ref, ev.transaction.amount, ev.order.order_ref, ev.order.customer_ref
            );
            async {}.boxed()
        });
    hooks
}
