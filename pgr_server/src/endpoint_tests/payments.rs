use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use pgr_common::MinorUnits;
use pgr_engine::{
    db_types::{NewOrder, OrderRef, PaymentStatus},
    events::EventProducers,
    payment_objects::{InitiatedPayment, PaymentStatusReport},
    test_utils::{
        gateway_sim::{test_gateway_config, GatewayResponseBuilder},
        prepare_env::{prepare_test_env, random_db_path},
    },
    CheckoutApi,
    LedgerError,
    OrderApi,
    ReconciliationApi,
    SqliteDatabase,
};

use super::{
    helpers::{send, server_options, FRONTEND_URL},
    mocks::{untouched_backend, MockBackend},
};
use crate::{
    data_objects::GatewayCallback,
    gateway_client::PreflightConnector,
    routes::{
        CancelOrderRoute,
        GatewayReturnRoute,
        GatewayWebhookRoute,
        InitiatePaymentRoute,
        PaymentStatusRoute,
    },
};

fn callback(msg: String) -> GatewayCallback {
    GatewayCallback { msg }
}

fn configure_mock(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = ReconciliationApi::new(backend, test_gateway_config(), EventProducers::default());
        cfg.service(GatewayWebhookRoute::<MockBackend>::new())
            .service(GatewayReturnRoute::<MockBackend>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(server_options()));
    }
}

#[actix_web::test]
async fn forged_webhook_is_acknowledged_without_touching_the_database() {
    let _ = env_logger::try_init().ok();
    let msg = GatewayResponseBuilder::success("ORD-1-1700000000000", MinorUnits::from(10_000))
        .forged(&test_gateway_config());
    let req = TestRequest::post().uri("/payments/gateway/webhook").set_form(callback(msg));
    let res = send(req, configure_mock(untouched_backend())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, r#"{"success":true}"#);
}

#[actix_web::test]
async fn foreign_merchant_webhook_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let msg = GatewayResponseBuilder::success("ORD-1-1700000000000", MinorUnits::from(10_000))
        .with_merchant("SOMEONE-ELSE")
        .signed(&test_gateway_config());
    let req = TestRequest::post().uri("/payments/gateway/webhook").set_json(callback(msg));
    let res = send(req, configure_mock(untouched_backend())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, r#"{"success":true}"#);
}

#[actix_web::test]
async fn webhook_without_data_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/payments/gateway/webhook").set_json(callback("  ".into()));
    let res = send(req, configure_mock(untouched_backend())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, r#"{"success":false,"message":"No webhook data received"}"#);
    let req = TestRequest::post().uri("/payments/gateway/webhook");
    let res = send(req, configure_mock(untouched_backend())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn webhook_asks_for_a_retry_when_the_database_is_down() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_clone().returning(|| {
        let mut db = MockBackend::new();
        db.expect_fetch_transaction().returning(|_| Err(LedgerError::DatabaseError("database is locked".into())));
        db
    });
    let msg = GatewayResponseBuilder::success("ORD-1-1700000000000", MinorUnits::from(10_000))
        .signed(&test_gateway_config());
    let req = TestRequest::post().uri("/payments/gateway/webhook").set_form(callback(msg));
    let res = send(req, configure_mock(backend)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn forged_return_redirects_to_the_failure_page() {
    let _ = env_logger::try_init().ok();
    let msg = GatewayResponseBuilder::success("ORD-1-1700000000000", MinorUnits::from(10_000))
        .forged(&test_gateway_config());
    let req = TestRequest::post().uri("/payments/gateway/return").set_form(callback(msg));
    let res = send(req, configure_mock(untouched_backend())).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.unwrap(), format!("{FRONTEND_URL}/payment/failed?reason=invalid-response"));
}

#[actix_web::test]
async fn return_without_data_redirects_to_the_failure_page() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/payments/gateway/return");
    let res = send(req, configure_mock(untouched_backend())).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.unwrap(), format!("{FRONTEND_URL}/payment/failed?reason=no-data"));
}

#[actix_web::test]
async fn return_for_an_unknown_payment_redirects_to_the_failure_page() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_clone().returning(|| {
        let mut db = MockBackend::new();
        db.expect_fetch_transaction().returning(|_| Ok(None));
        db
    });
    let msg = GatewayResponseBuilder::success("ORD-404-1700000000000", MinorUnits::from(10_000))
        .signed(&test_gateway_config());
    let req = TestRequest::post().uri("/payments/gateway/return").set_form(callback(msg));
    let res = send(req, configure_mock(backend)).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.unwrap(), format!("{FRONTEND_URL}/payment/failed?reason=unknown-transaction"));
}

//-------------------------------------------  Full flow on SQLite  ---------------------------------------------------

async fn sqlite_backend() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    let orders = OrderApi::new(db.clone(), EventProducers::default());
    orders
        .create_order(NewOrder::new("ORD-1".into(), "alice").with_item("tea", 4, MinorUnits::from(2500)))
        .await
        .expect("Error creating order");
    db
}

fn configure_sqlite(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let config = test_gateway_config();
        cfg.service(InitiatePaymentRoute::<SqliteDatabase>::new())
            .service(GatewayWebhookRoute::<SqliteDatabase>::new())
            .service(GatewayReturnRoute::<SqliteDatabase>::new())
            .service(PaymentStatusRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .app_data(web::Data::new(CheckoutApi::new(db.clone(), config.clone())))
            .app_data(web::Data::new(ReconciliationApi::new(db.clone(), config, EventProducers::default())))
            .app_data(web::Data::new(OrderApi::new(db, EventProducers::default())))
            .app_data(web::Data::new(server_options()))
            .app_data(web::Data::new(None::<PreflightConnector>));
    }
}

async fn initiate(db: &SqliteDatabase, order_ref: &str) -> InitiatedPayment {
    let req = TestRequest::post()
        .uri(&format!("/payments/initiate/{order_ref}"))
        .set_json(serde_json::json!({"name": "Alice", "email": "alice@example.com", "phone": "9999999999"}));
    let res = send(req, configure_sqlite(db.clone())).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    serde_json::from_str(&res.body).expect("Invalid initiation response")
}

async fn status(db: &SqliteDatabase, order_ref: &str) -> PaymentStatusReport {
    let req = TestRequest::get().uri(&format!("/payments/status/{order_ref}"));
    let res = send(req, configure_sqlite(db.clone())).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    serde_json::from_str(&res.body).expect("Invalid status response")
}

#[actix_web::test]
async fn webhook_then_browser_return() {
    let db = sqlite_backend().await;
    let payment = initiate(&db, "ORD-1").await;
    assert_eq!(payment.order_ref, OrderRef::from("ORD-1"));
    assert_eq!(payment.amount, MinorUnits::from(10_000));
    assert_eq!(payment.merchant_id, "MERCH01");

    let msg = GatewayResponseBuilder::success(payment.gateway_ref.clone(), payment.amount)
        .signed(&test_gateway_config());
    let req = TestRequest::post().uri("/payments/gateway/webhook").set_form(callback(msg.clone()));
    let res = send(req, configure_sqlite(db.clone())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, r#"{"success":true}"#);

    let req = TestRequest::post().uri("/payments/gateway/return").set_form(callback(msg));
    let res = send(req, configure_sqlite(db.clone())).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.unwrap(), format!("{FRONTEND_URL}/thank-you?orderId=ORD-1"));

    let report = status(&db, "ORD-1").await;
    assert_eq!(report.order.payment_status, PaymentStatus::Paid);
    let txn = report.latest_transaction.expect("No transaction recorded");
    assert_eq!(txn.gateway_ref, payment.gateway_ref);
    assert_eq!(txn.meta("channel"), Some("webhook"));
}

#[actix_web::test]
async fn failed_payment_redirects_to_the_failed_page() {
    let db = sqlite_backend().await;
    let payment = initiate(&db, "ORD-1").await;
    let msg = GatewayResponseBuilder::failed(payment.gateway_ref.clone(), payment.amount)
        .signed(&test_gateway_config());
    let req = TestRequest::post().uri("/payments/gateway/return").set_form(callback(msg));
    let res = send(req, configure_sqlite(db.clone())).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.unwrap(), format!("{FRONTEND_URL}/payment/failed?orderId=ORD-1"));
    let report = status(&db, "ORD-1").await;
    assert_eq!(report.order.payment_status, PaymentStatus::Failed);
}

#[actix_web::test]
async fn pending_payment_redirects_to_the_pending_page() {
    let db = sqlite_backend().await;
    let payment = initiate(&db, "ORD-1").await;
    let msg = GatewayResponseBuilder::pending(payment.gateway_ref.clone(), payment.amount)
        .signed(&test_gateway_config());
    let req = TestRequest::post().uri("/payments/gateway/return").set_form(callback(msg));
    let res = send(req, configure_sqlite(db.clone())).await;
    assert_eq!(res.location.unwrap(), format!("{FRONTEND_URL}/payment/pending?orderId=ORD-1"));
    let report = status(&db, "ORD-1").await;
    assert_eq!(report.order.payment_status, PaymentStatus::Unpaid);
}

#[actix_web::test]
async fn paid_orders_cannot_be_paid_again() {
    let db = sqlite_backend().await;
    let payment = initiate(&db, "ORD-1").await;
    let msg = GatewayResponseBuilder::success(payment.gateway_ref.clone(), payment.amount)
        .signed(&test_gateway_config());
    let req = TestRequest::post().uri("/payments/gateway/webhook").set_form(callback(msg));
    send(req, configure_sqlite(db.clone())).await;
    let req = TestRequest::post().uri("/payments/initiate/ORD-1");
    let res = send(req, configure_sqlite(db.clone())).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    let req = TestRequest::post().uri("/payments/initiate/ORD-404");
    let res = send(req, configure_sqlite(db.clone())).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
