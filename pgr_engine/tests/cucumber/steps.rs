use std::{str::FromStr, time::Duration};

use cucumber::{given, then, when};
use pgr_engine::{
    db_types::{FulfillmentStatus, NewOrder, OrderRef, PaymentStatus},
    payment_objects::PaymentOutcome,
    test_utils::gateway_sim::GatewayResponseBuilder,
    CartStore,
    InventoryStore,
    LedgerStore,
    OrderStore,
    ReconciliationError,
};

use crate::{cucumber::PaymentWorld, support::customer};

#[given(expr = "customer '{word}' orders {int} '{word}' at {int} each as {word}")]
async fn place_order(world: &mut PaymentWorld, customer_ref: String, qty: i64, product: String, price: i64, id: String) {
    let order = NewOrder::new(OrderRef::from(id), customer_ref.as_str()).with_item(
        product.as_str(),
        qty,
        PaymentWorld::major(price),
    );
    world.system().orders.create_order(order).await.expect("Error creating order");
    world.system().db.add_to_cart(&customer_ref, &product, qty).await.expect("Error filling cart");
}

#[when(expr = "the customer starts a payment for order {word}")]
async fn start_payment(world: &mut PaymentWorld, order_ref: String) {
    let payment = world
        .system()
        .checkout
        .initiate_payment(&OrderRef::from(order_ref.as_str()), customer())
        .await
        .expect("Error initiating payment");
    world.payments.insert(order_ref, payment);
}

#[when(expr = "the gateway sends a {word} webhook for order {word}")]
async fn webhook(world: &mut PaymentWorld, status: String, order_ref: String) {
    let msg = world.response(&status, &order_ref).signed(&world.system().config);
    world.last_outcome = Some(world.system().reconciliation.handle_webhook(&msg).await);
}

#[when(expr = "the browser returns with a {word} response for order {word}")]
async fn browser_return(world: &mut PaymentWorld, status: String, order_ref: String) {
    let msg = world.response(&status, &order_ref).signed(&world.system().config);
    world.last_outcome = Some(world.system().reconciliation.handle_browser_return(&msg).await);
}

#[when(expr = "the gateway sends a forged {word} webhook for order {word}")]
async fn forged_webhook(world: &mut PaymentWorld, status: String, order_ref: String) {
    let msg = world.response(&status, &order_ref).forged(&world.system().config);
    world.last_outcome = Some(world.system().reconciliation.handle_webhook(&msg).await);
}

#[when(expr = "the gateway sends a {word} webhook for order {word} with an amount of {int}")]
async fn webhook_with_amount(world: &mut PaymentWorld, status: String, order_ref: String, amount: i64) {
    let msg =
        world.response(&status, &order_ref).with_amount(PaymentWorld::major(amount)).signed(&world.system().config);
    world.last_outcome = Some(world.system().reconciliation.handle_webhook(&msg).await);
}

#[when(expr = "the gateway sends a success webhook for unknown payment {word}")]
async fn unknown_webhook(world: &mut PaymentWorld, gateway_ref: String) {
    let msg = GatewayResponseBuilder::success(gateway_ref.as_str(), PaymentWorld::major(100))
        .signed(&world.system().config);
    world.last_outcome = Some(world.system().reconciliation.handle_webhook(&msg).await);
}

#[when(expr = "order {word} is cancelled")]
async fn cancel_order(world: &mut PaymentWorld, order_ref: String) {
    world.system().orders.cancel_order(&OrderRef::from(order_ref), None).await.expect("Error cancelling order");
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut PaymentWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then(expr = "the payment outcome is {word}")]
async fn check_outcome(world: &mut PaymentWorld, expected: String) {
    let expected = match expected.as_str() {
        "Success" => PaymentOutcome::Success,
        "Failed" => PaymentOutcome::Failed,
        "Pending" => PaymentOutcome::Pending,
        s => panic!("Unknown payment outcome: {s}"),
    };
    assert_eq!(world.outcome().outcome, expected);
}

#[then("the response was applied")]
async fn check_applied(world: &mut PaymentWorld) {
    assert!(world.outcome().applied, "The response should have finalized the transaction");
}

#[then("the response was not applied")]
async fn check_duplicate(world: &mut PaymentWorld) {
    assert!(!world.outcome().applied, "The response should not have changed anything");
}

#[then(expr = "the response is rejected with {word}")]
async fn check_rejected(world: &mut PaymentWorld, reason: String) {
    let Some(Err(err)) = &world.last_outcome else {
        panic!("Expected the last response to be rejected, got {:?}", world.last_outcome);
    };
    let matched = match reason.as_str() {
        "SignatureMismatch" => matches!(err, ReconciliationError::SignatureMismatch { .. }),
        "ForeignMerchant" => matches!(err, ReconciliationError::ForeignMerchant { .. }),
        "UnknownTransaction" => matches!(err, ReconciliationError::UnknownTransaction(_)),
        "MalformedPayload" => matches!(err, ReconciliationError::MalformedPayload(_)),
        s => panic!("Unknown rejection reason: {s}"),
    };
    assert!(matched, "Expected {reason}, got {err:?}");
}

#[then(expr = "order {word} has payment status {word}")]
async fn check_payment_status(world: &mut PaymentWorld, order_ref: String, status: String) {
    let order = world.system().db.fetch_order(&OrderRef::from(order_ref)).await.unwrap().expect("Order not found");
    let expected = PaymentStatus::from_str(&status).expect("Not a valid payment status");
    assert_eq!(order.payment_status, expected);
}

#[then(expr = "order {word} has fulfillment status {word}")]
async fn check_fulfillment_status(world: &mut PaymentWorld, order_ref: String, status: String) {
    let order = world.system().db.fetch_order(&OrderRef::from(order_ref)).await.unwrap().expect("Order not found");
    let expected = FulfillmentStatus::from_str(&status).expect("Not a valid fulfillment status");
    assert_eq!(order.fulfillment_status, expected);
}

#[then(expr = "there are {int} '{word}' in stock")]
async fn check_stock(world: &mut PaymentWorld, quantity: i64, product: String) {
    let level = world.system().db.stock_level(&product).await.unwrap();
    assert_eq!(level, Some(quantity), "Stock level of {product} is incorrect");
}

#[then(expr = "the cart for '{word}' has {int} item(s)")]
async fn check_cart(world: &mut PaymentWorld, customer_ref: String, count: usize) {
    let items = world.system().db.cart_items(&customer_ref).await.unwrap();
    assert_eq!(items.len(), count, "Cart for {customer_ref} has the wrong number of items");
}

#[then(expr = "the latest transaction for order {word} has metadata {word} set to {string}")]
async fn check_metadata(world: &mut PaymentWorld, order_ref: String, key: String, value: String) {
    let txn = world
        .system()
        .db
        .latest_for_order(&OrderRef::from(order_ref))
        .await
        .unwrap()
        .expect("No transaction for order");
    assert_eq!(txn.meta(&key), Some(value.as_str()), "Metadata {key} is incorrect");
}

#[then(expr = "the latest transaction for order {word} has metadata {word}")]
async fn check_metadata_present(world: &mut PaymentWorld, order_ref: String, key: String) {
    let txn = world
        .system()
        .db
        .latest_for_order(&OrderRef::from(order_ref))
        .await
        .unwrap()
        .expect("No transaction for order");
    assert!(txn.meta(&key).is_some(), "Metadata {key} is missing. {:?}", txn.metadata);
}
