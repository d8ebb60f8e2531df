//! Submits signed payment requests to the gateway before the customer is handed over.
//!
//! Some gateway integrations want to see the request server-to-server first. When `PGR_GATEWAY_PREFLIGHT_URL` is
//! set, the initiation route posts the signed payload there and only returns it to the browser if the gateway
//! accepts it.
use std::sync::Arc;

use log::*;
use pgr_engine::{signer::SignedRequest, ConnectorError, GatewayConnector};
use reqwest::Client;

#[derive(Clone, Debug)]
pub struct PreflightConnector {
    url: String,
    client: Arc<Client>,
}

impl PreflightConnector {
    pub fn new<S: Into<String>>(url: S) -> Result<Self, ConnectorError> {
        let client = Client::builder().build().map_err(|e| ConnectorError(e.to_string()))?;
        Ok(Self { url: url.into(), client: Arc::new(client) })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl GatewayConnector for PreflightConnector {
    async fn submit(&self, request: &SignedRequest) -> Result<(), ConnectorError> {
        let payload = request.payload();
        trace!("💻️ Submitting payment request to {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .form(&[("msg", payload.as_str())])
            .send()
            .await
            .map_err(|e| ConnectorError(e.to_string()))?;
        if response.status().is_success() {
            debug!("💻️ Gateway accepted the payment request. {}", response.status());
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(ConnectorError(format!("Gateway rejected the payment request ({status}). {message}")))
        }
    }
}
