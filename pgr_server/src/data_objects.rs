use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The body the gateway posts to both the webhook and the browser return URL, either as JSON or as a form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCallback {
    pub msg: String,
}

/// The fixed acknowledgement the gateway expects from the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayAck {
    pub success: bool,
}

impl GatewayAck {
    pub fn received() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
}
