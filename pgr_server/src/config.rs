use std::{env, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use pgr_common::{
    helpers::{parse_boolean_flag, parse_number_or},
    Secret,
    DEFAULT_CURRENCY_CODE,
};
use pgr_engine::{gateway_config::DEFAULT_PAYMENT_MODE, signer::FIELD_DELIMITER, GatewayConfig};

use crate::errors::ServerError;

const DEFAULT_PGR_HOST: &str = "127.0.0.1";
const DEFAULT_PGR_PORT: u16 = 8360;
const DEFAULT_INITIATION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PENDING_ALERT_MINUTES: i64 = 60;
const DEFAULT_NOTIFIER_BUFFER: usize = 64;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Merchant account and signing key. Handed to the engine as-is.
    pub gateway: GatewayConfig,
    /// Base URL of the shop front end. Customers are redirected here after returning from the gateway.
    pub frontend_url: String,
    /// If set, signed payment requests are submitted to this URL before the customer is handed over to the gateway.
    pub preflight_url: Option<String>,
    /// How long the preflight submission may take before the payment attempt is abandoned.
    pub initiation_timeout: StdDuration,
    /// Pending payment attempts older than this are reported by the pending attempt worker.
    pub pending_alert_after: Duration,
    pub notifier_buffer: usize,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
}

impl ServerConfig {
    pub fn new(host: &str, port: u16, gateway: GatewayConfig) -> Self {
        Self {
            host: host.to_string(),
            port,
            database_url: String::default(),
            gateway,
            frontend_url: String::default(),
            preflight_url: None,
            initiation_timeout: StdDuration::from_secs(DEFAULT_INITIATION_TIMEOUT_SECS),
            pending_alert_after: Duration::minutes(DEFAULT_PENDING_ALERT_MINUTES),
            notifier_buffer: DEFAULT_NOTIFIER_BUFFER,
            use_x_forwarded_for: false,
            use_forwarded: false,
        }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        Self::try_from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from a variable lookup. Missing gateway credentials are an error. Everything else has
    /// a default.
    pub fn try_from_lookup<F>(var: F) -> Result<Self, ServerError>
    where F: Fn(&str) -> Option<String> {
        let host = var("PGR_HOST").unwrap_or_else(|| DEFAULT_PGR_HOST.into());
        let port = match var("PGR_PORT") {
            Some(s) => s.parse::<u16>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid port for PGR_PORT. {e} Using the default, {DEFAULT_PGR_PORT}, instead.");
                DEFAULT_PGR_PORT
            }),
            None => DEFAULT_PGR_PORT,
        };
        let database_url = required(&var, "PGR_DATABASE_URL")?;
        let merchant_id = required(&var, "PGR_MERCHANT_ID")?;
        if merchant_id.contains(FIELD_DELIMITER) {
            return Err(ServerError::ConfigurationError(format!(
                "PGR_MERCHANT_ID may not contain '{FIELD_DELIMITER}'"
            )));
        }
        let signing_secret = Secret::new(var("PGR_SIGNING_SECRET").unwrap_or_default());
        if signing_secret.is_blank() {
            error!("🪛️ PGR_SIGNING_SECRET is not set. The server cannot sign or verify gateway messages without it.");
            return Err(ServerError::ConfigurationError("PGR_SIGNING_SECRET is not set".into()));
        }
        let gateway_url = required_url(&var, "PGR_GATEWAY_URL")?;
        let return_url = required_url(&var, "PGR_RETURN_URL")?;
        if return_url.contains(FIELD_DELIMITER) {
            return Err(ServerError::ConfigurationError(format!("PGR_RETURN_URL may not contain '{FIELD_DELIMITER}'")));
        }
        let frontend_url = required_url(&var, "PGR_FRONTEND_URL")?.trim_end_matches('/').to_string();
        let payment_mode = var("PGR_PAYMENT_MODE").unwrap_or_else(|| DEFAULT_PAYMENT_MODE.into());
        let currency = var("PGR_CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY_CODE.into());
        let gateway = GatewayConfig::new(merchant_id, signing_secret)
            .with_gateway_url(gateway_url)
            .with_return_url(return_url)
            .with_payment_mode(payment_mode)
            .with_currency(currency);
        let preflight_url = var("PGR_GATEWAY_PREFLIGHT_URL").filter(|s| !s.trim().is_empty());
        let initiation_timeout =
            StdDuration::from_secs(parse_number_or(var("PGR_INITIATION_TIMEOUT"), DEFAULT_INITIATION_TIMEOUT_SECS));
        let pending_alert_after =
            Duration::minutes(parse_number_or(var("PGR_PENDING_ALERT_AFTER"), DEFAULT_PENDING_ALERT_MINUTES));
        let notifier_buffer = parse_number_or(var("PGR_NOTIFIER_BUFFER"), DEFAULT_NOTIFIER_BUFFER).max(1);
        let use_x_forwarded_for = parse_boolean_flag(var("PGR_USE_X_FORWARDED_FOR"), false);
        let use_forwarded = parse_boolean_flag(var("PGR_USE_FORWARDED"), false);
        info!(
            "🪛️ Gateway configured for merchant {} ({} / {})",
            gateway.merchant_id, gateway.payment_mode, gateway.currency
        );
        Ok(Self {
            host,
            port,
            database_url,
            gateway,
            frontend_url,
            preflight_url,
            initiation_timeout,
            pending_alert_after,
            notifier_buffer,
            use_x_forwarded_for,
            use_forwarded,
        })
    }
}

fn required<F>(var: &F, name: &str) -> Result<String, ServerError>
where F: Fn(&str) -> Option<String> {
    match var(name) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => {
            error!("🪛️ {name} is not set.");
            Err(ServerError::ConfigurationError(format!("{name} is not set")))
        },
    }
}

fn required_url<F>(var: &F, name: &str) -> Result<String, ServerError>
where F: Fn(&str) -> Option<String> {
    let url = required(var, name)?;
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(url)
    } else {
        Err(ServerError::ConfigurationError(format!("{name} is not an http(s) URL: {url}")))
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that request handlers need. Excludes secrets.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub frontend_url: String,
    pub initiation_timeout: StdDuration,
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            frontend_url: config.frontend_url.clone(),
            initiation_timeout: config.initiation_timeout,
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
        }
    }
}
