use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use pgr_engine::{
    events::{EventHandlers, EventProducers},
    CheckoutApi,
    OrderApi,
    ReconciliationApi,
    SqliteDatabase,
};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    gateway_client::PreflightConnector,
    notifications::logging_hooks,
    pending_worker::start_pending_worker,
    routes::{
        health,
        CancelOrderRoute,
        GatewayReturnRoute,
        GatewayWebhookRoute,
        InitiatePaymentRoute,
        PaymentStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    let handlers = EventHandlers::new(config.notifier_buffer, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let _worker = start_pending_worker(db.clone(), config.pending_alert_after);
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let connector = match &config.preflight_url {
        Some(url) => {
            info!("💻️ Payment requests will be submitted to {url} before hand-over");
            Some(PreflightConnector::new(url.as_str()).map_err(|e| ServerError::InitializeError(e.to_string()))?)
        },
        None => None,
    };
    let options = ServerOptions::from_config(&config);
    let gateway = config.gateway.clone();
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutApi::new(db.clone(), gateway.clone());
        let reconciliation_api = ReconciliationApi::new(db.clone(), gateway.clone(), producers.clone());
        let order_api = OrderApi::new(db.clone(), producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pgr::access_log"))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(order_api))
            .app_data(web::Data::new(options.clone()))
            .app_data(web::Data::new(connector.clone()))
            .service(health)
            .service(InitiatePaymentRoute::<SqliteDatabase>::new())
            .service(GatewayWebhookRoute::<SqliteDatabase>::new())
            .service(GatewayReturnRoute::<SqliteDatabase>::new())
            .service(PaymentStatusRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
