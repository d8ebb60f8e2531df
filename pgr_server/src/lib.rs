//! # Payment gateway reconciliation server
//! This crate hosts the HTTP front end for the reconciliation engine. It is responsible for:
//! * Handing signed payment requests to the customer's browser.
//! * Receiving the gateway's webhook and the customer's browser return, and passing both to the engine.
//! * Answering payment status queries and order cancellations.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /payments/initiate/{order_ref}`: Starts a payment attempt.
//! * `POST /payments/gateway/webhook`: The gateway's server-to-server notification.
//! * `POST /payments/gateway/return`: Where the gateway sends the customer's browser.
//! * `GET /payments/status/{order_ref}`: The order and its latest payment attempt.
//! * `POST /orders/{order_ref}/cancel`: Cancels an order, flagging a refund if it was paid.

pub mod cli;
pub mod config;
pub mod errors;

pub mod data_objects;
pub mod gateway_client;
pub mod helpers;
pub mod notifications;
pub mod pending_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
