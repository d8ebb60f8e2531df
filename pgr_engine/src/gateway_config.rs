use pgr_common::{Secret, DEFAULT_CURRENCY_CODE};

use crate::signer::Signer;

pub const DEFAULT_PAYMENT_MODE: &str = "DIRECT";

/// Everything the engine needs to know about the merchant's account with the payment gateway.
///
/// Built once at startup and handed to the [`Signer`], the checkout flow and the reconciliation dispatcher.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// The merchant id issued by the gateway. Embedded in every request and checked on every response.
    pub merchant_id: String,
    /// HMAC key shared with the gateway.
    pub signing_secret: Secret<String>,
    /// The gateway's payment page. Handed to the browser along with the signed request.
    pub gateway_url: String,
    /// Where the gateway sends the customer's browser once payment completes.
    pub return_url: String,
    pub payment_mode: String,
    pub currency: String,
}

impl GatewayConfig {
    pub fn new<S: Into<String>>(merchant_id: S, signing_secret: Secret<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            signing_secret,
            gateway_url: String::default(),
            return_url: String::default(),
            payment_mode: DEFAULT_PAYMENT_MODE.to_string(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
        }
    }

    pub fn with_gateway_url<S: Into<String>>(mut self, url: S) -> Self {
        self.gateway_url = url.into();
        self
    }

    pub fn with_return_url<S: Into<String>>(mut self, url: S) -> Self {
        self.return_url = url.into();
        self
    }

    pub fn with_payment_mode<S: Into<String>>(mut self, mode: S) -> Self {
        self.payment_mode = mode.into();
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn signer(&self) -> Signer {
        Signer::new(self.signing_secret.clone())
    }
}
