use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use pgr_common::MinorUnits;
use pgr_engine::{
    db_types::{FulfillmentStatus, LineItem, Order, OrderRef, PaymentStatus},
    events::EventProducers,
    OrderApi,
};

use super::{helpers::send, mocks::MockBackend};
use crate::routes::{CancelOrderRoute, PaymentStatusRoute};

fn configure(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderApi::new(backend, EventProducers::default());
        cfg.service(PaymentStatusRoute::<MockBackend>::new())
            .service(CancelOrderRoute::<MockBackend>::new())
            .app_data(web::Data::new(api));
    }
}

fn order(payment_status: PaymentStatus, fulfillment_status: FulfillmentStatus) -> Order {
    Order {
        id: 1,
        order_ref: OrderRef::from("ORD-1"),
        customer_ref: "alice".to_string(),
        total: MinorUnits::from(10_000),
        currency: "INR".to_string(),
        payment_status,
        fulfillment_status,
        synced_transaction_id: None,
        cancel_reason: None,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        items: vec![LineItem::new("tea", 4, MinorUnits::from(2500))],
    }
}

#[actix_web::test]
async fn status_of_unknown_order() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|_| Ok(None));
    let res = send(TestRequest::get().uri("/payments/status/ORD-404"), configure(backend)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body, r#"{"error":"The data was not found. The requested order ORD-404 does not exist"}"#);
}

#[actix_web::test]
async fn status_of_order_without_payment_attempts() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|_| Ok(Some(order(PaymentStatus::Unpaid, FulfillmentStatus::Pending))));
    backend.expect_latest_for_order().returning(|_| Ok(None));
    let res = send(TestRequest::get().uri("/payments/status/ORD-1"), configure(backend)).await;
    assert_eq!(res.status, StatusCode::OK);
    let report: serde_json::Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(report["order"]["order_ref"], "ORD-1");
    assert_eq!(report["order"]["payment_status"], "Unpaid");
    assert!(report["latest_transaction"].is_null());
}

#[actix_web::test]
async fn cancel_unpaid_order() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|_| Ok(Some(order(PaymentStatus::Unpaid, FulfillmentStatus::Pending))));
    backend
        .expect_save_order()
        .withf(|o, expected| {
            *expected == PaymentStatus::Unpaid &&
                o.fulfillment_status == FulfillmentStatus::Cancelled &&
                o.cancel_reason.as_deref() == Some("changed my mind")
        })
        .times(1)
        .returning(|o, _| Ok(Some(o.clone())));
    backend.expect_increment_stock().never();
    let req =
        TestRequest::post().uri("/orders/ORD-1/cancel").set_json(serde_json::json!({"reason": "changed my mind"}));
    let res = send(req, configure(backend)).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let order: Order = serde_json::from_str(&res.body).unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    assert_eq!(order.fulfillment_status, FulfillmentStatus::Cancelled);
}

#[actix_web::test]
async fn cancel_paid_order_flags_a_refund() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|_| Ok(Some(order(PaymentStatus::Paid, FulfillmentStatus::Processing))));
    backend
        .expect_save_order()
        .withf(|o, expected| *expected == PaymentStatus::Paid && o.payment_status == PaymentStatus::Refunded)
        .returning(|o, _| Ok(Some(o.clone())));
    backend
        .expect_increment_stock()
        .withf(|p, q| p.to_string() == "tea" && *q == 4)
        .times(1)
        .returning(|_, _| Ok(true));
    let res = send(TestRequest::post().uri("/orders/ORD-1/cancel"), configure(backend)).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let order: Order = serde_json::from_str(&res.body).unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Refunded);
}

#[actix_web::test]
async fn shipped_orders_cannot_be_cancelled() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|_| Ok(Some(order(PaymentStatus::Paid, FulfillmentStatus::Shipped))));
    backend.expect_save_order().never();
    let res = send(TestRequest::post().uri("/orders/ORD-1/cancel"), configure(backend)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn concurrent_payment_blocks_cancellation() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|_| Ok(Some(order(PaymentStatus::Unpaid, FulfillmentStatus::Pending))));
    backend.expect_save_order().returning(|_, _| Ok(None));
    let res = send(TestRequest::post().uri("/orders/ORD-1/cancel"), configure(backend)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}
