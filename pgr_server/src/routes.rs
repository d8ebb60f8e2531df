//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the engine, which does its I/O
//! asynchronously, so workers are free to serve other requests while a database call is in flight.
//!
//! The two gateway callbacks have fixed response contracts:
//! * The webhook always answers `{"success":true}`, including when the response is rejected, so that the gateway
//!   stops retrying. The only exception is a transient backend failure, which answers 500 so that it does retry.
//! * The browser return always answers with a `303 See Other` redirect to a front-end page.
use actix_web::{get, http::header, web, Either, HttpRequest, HttpResponse, Responder};
use log::*;
use pgr_engine::{
    db_types::OrderRef,
    CartStore,
    CheckoutApi,
    CustomerDetails,
    InventoryStore,
    LedgerStore,
    OrderApi,
    OrderStore,
    ReconciliationApi,
    ReconciliationError,
};

use crate::{
    config::ServerOptions,
    data_objects::{CancelOrderRequest, GatewayAck, GatewayCallback, JsonResponse},
    errors::ServerError,
    gateway_client::PreflightConnector,
    helpers::{failure_redirect, get_remote_ip, outcome_redirect},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

type CallbackBody = Option<Either<web::Json<GatewayCallback>, web::Form<GatewayCallback>>>;

fn callback_msg(body: CallbackBody) -> Option<String> {
    let msg = match body? {
        Either::Left(json) => json.into_inner().msg,
        Either::Right(form) => form.into_inner().msg,
    };
    (!msg.trim().is_empty()).then_some(msg)
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(initiate_payment => Post "/payments/initiate/{order_ref}" impl OrderStore, LedgerStore);
/// Starts a payment attempt for the order and returns the signed request the browser hands to the gateway.
///
/// The body may carry the customer's contact details (`name`, `email`, `phone`). They are passed to the gateway
/// unchanged.
pub async fn initiate_payment<B>(
    path: web::Path<String>,
    body: Option<web::Json<CustomerDetails>>,
    api: web::Data<CheckoutApi<B>>,
    options: web::Data<ServerOptions>,
    connector: web::Data<Option<PreflightConnector>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore + LedgerStore,
{
    let order_ref = OrderRef::from(path.into_inner());
    let customer = body.map(|b| b.into_inner()).unwrap_or_default();
    debug!("💻️ Payment initiation request for order {order_ref}");
    let result = match connector.get_ref() {
        Some(c) => api.initiate_payment_with(c, options.initiation_timeout, &order_ref, customer).await,
        None => api.initiate_payment(&order_ref, customer).await,
    };
    let payment = result.map_err(|e| {
        warn!("💻️ Could not initiate payment for order {order_ref}. {e}");
        e
    })?;
    info!("💻️ Payment {} initiated for order {order_ref} ({})", payment.gateway_ref, payment.amount);
    Ok(HttpResponse::Ok().json(payment))
}

//----------------------------------------------   Gateway callbacks  ---------------------------------------------
route!(gateway_webhook => Post "/payments/gateway/webhook" impl LedgerStore, OrderStore, InventoryStore, CartStore);
pub async fn gateway_webhook<B>(
    req: HttpRequest,
    body: CallbackBody,
    api: web::Data<ReconciliationApi<B>>,
    options: web::Data<ServerOptions>,
) -> HttpResponse
where
    B: LedgerStore + OrderStore + InventoryStore + CartStore,
{
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    let Some(msg) = callback_msg(body) else {
        warn!("💻️ Webhook call from {peer:?} did not contain a msg field");
        return HttpResponse::BadRequest().json(JsonResponse::failure("No webhook data received"));
    };
    match api.handle_webhook(&msg).await {
        Ok(outcome) => info!(
            "💻️ Webhook for {} handled. Outcome: {}. Applied: {}",
            outcome.gateway_ref, outcome.outcome, outcome.applied
        ),
        Err(e) if e.is_transient() => {
            error!("💻️ Webhook from {peer:?} could not be handled. The gateway will retry. {e}");
            return HttpResponse::InternalServerError().json(JsonResponse::failure("Temporary failure. Please retry."));
        },
        Err(e) if e.is_security_event() => error!("💻️ Rejected webhook from {peer:?}. {e}"),
        Err(e) => warn!("💻️ Webhook from {peer:?} was not applied. {e}"),
    }
    HttpResponse::Ok().json(GatewayAck::received())
}

route!(gateway_return => Post "/payments/gateway/return" impl LedgerStore, OrderStore, InventoryStore, CartStore);
pub async fn gateway_return<B>(
    req: HttpRequest,
    body: CallbackBody,
    api: web::Data<ReconciliationApi<B>>,
    options: web::Data<ServerOptions>,
) -> HttpResponse
where
    B: LedgerStore + OrderStore + InventoryStore + CartStore,
{
    let frontend = options.frontend_url.as_str();
    let location = match callback_msg(body) {
        None => {
            warn!("💻️ Browser returned from the gateway without payment data");
            failure_redirect(frontend, "no-data")
        },
        Some(msg) => match api.handle_browser_return(&msg).await {
            Ok(outcome) => {
                info!("💻️ Browser returned for {}. Outcome: {}", outcome.gateway_ref, outcome.outcome);
                outcome_redirect(frontend, outcome.outcome, &outcome.order_ref)
            },
            Err(e) => {
                let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
                if e.is_security_event() {
                    error!("💻️ Rejected browser return from {peer:?}. {e}");
                } else {
                    warn!("💻️ Browser return from {peer:?} was not applied. {e}");
                }
                failure_redirect(frontend, failure_reason(&e))
            },
        },
    };
    HttpResponse::SeeOther().insert_header((header::LOCATION, location)).finish()
}

fn failure_reason(e: &ReconciliationError) -> &'static str {
    match e {
        ReconciliationError::UnknownTransaction(_) => "unknown-transaction",
        ReconciliationError::DatabaseError(_) => "server-error",
        ReconciliationError::MalformedPayload(_)
        | ReconciliationError::SignatureMismatch { .. }
        | ReconciliationError::ForeignMerchant { .. } => "invalid-response",
    }
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(payment_status => Get "/payments/status/{order_ref}" impl OrderStore, LedgerStore, InventoryStore);
pub async fn payment_status<B>(
    path: web::Path<String>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore + LedgerStore + InventoryStore,
{
    let order_ref = OrderRef::from(path.into_inner());
    trace!("💻️ Payment status request for order {order_ref}");
    let report = api.payment_status(&order_ref).await?;
    Ok(HttpResponse::Ok().json(report))
}

route!(cancel_order => Post "/orders/{order_ref}/cancel" impl OrderStore, LedgerStore, InventoryStore);
pub async fn cancel_order<B>(
    path: web::Path<String>,
    body: Option<web::Json<CancelOrderRequest>>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore + LedgerStore + InventoryStore,
{
    let order_ref = OrderRef::from(path.into_inner());
    let reason = body.and_then(|b| b.into_inner().reason);
    debug!("💻️ Cancellation request for order {order_ref}");
    let order = api.cancel_order(&order_ref, reason).await.map_err(|e| {
        debug!("💻️ Could not cancel order {order_ref}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}
