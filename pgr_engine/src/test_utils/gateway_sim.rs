//! Builds gateway response messages the way the payment gateway does, so that tests can drive both inbound channels.
use pgr_common::MinorUnits;

use crate::{
    db_types::GatewayRef,
    gateway_config::GatewayConfig,
    pgr_api::{STATUS_FAILED, STATUS_PENDING, STATUS_SUCCESS},
};

pub const TEST_MERCHANT_ID: &str = "MERCH01";
pub const TEST_SIGNING_SECRET: &str = "test-signing-secret";

pub fn test_gateway_config() -> GatewayConfig {
    GatewayConfig::new(TEST_MERCHANT_ID, TEST_SIGNING_SECRET.into())
        .with_gateway_url("https://gateway.example.com/pay")
        .with_return_url("https://shop.example.com/payments/gateway/return")
}

/// A simulated gateway response. Fields default to a successful payment.
#[derive(Debug, Clone)]
pub struct GatewayResponseBuilder {
    pub merchant_id: String,
    pub gateway_ref: GatewayRef,
    pub status_code: String,
    pub gateway_txn_id: String,
    pub bank_ref: String,
    pub amount: MinorUnits,
    pub auth_status: String,
    pub error_status: String,
    pub error_description: String,
}

impl GatewayResponseBuilder {
    pub fn new<G: Into<GatewayRef>>(gateway_ref: G, amount: MinorUnits) -> Self {
        let gateway_ref = gateway_ref.into();
        Self {
            merchant_id: TEST_MERCHANT_ID.to_string(),
            gateway_txn_id: format!("GTX{}", gateway_ref.as_str().len() * 7919),
            gateway_ref,
            status_code: STATUS_SUCCESS.to_string(),
            bank_ref: "BANK0001".to_string(),
            amount,
            auth_status: STATUS_SUCCESS.to_string(),
            error_status: "NA".to_string(),
            error_description: "NA".to_string(),
        }
    }

    pub fn success<G: Into<GatewayRef>>(gateway_ref: G, amount: MinorUnits) -> Self {
        Self::new(gateway_ref, amount)
    }

    pub fn failed<G: Into<GatewayRef>>(gateway_ref: G, amount: MinorUnits) -> Self {
        Self::new(gateway_ref, amount).with_status(STATUS_FAILED).with_error("ERR01", "Declined by bank")
    }

    pub fn pending<G: Into<GatewayRef>>(gateway_ref: G, amount: MinorUnits) -> Self {
        Self::new(gateway_ref, amount).with_status(STATUS_PENDING)
    }

    pub fn with_status(mut self, code: &str) -> Self {
        self.status_code = code.to_string();
        self.auth_status = code.to_string();
        self
    }

    pub fn with_merchant(mut self, merchant_id: &str) -> Self {
        self.merchant_id = merchant_id.to_string();
        self
    }

    pub fn with_amount(mut self, amount: MinorUnits) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_error(mut self, status: &str, description: &str) -> Self {
        self.error_status = status.to_string();
        self.error_description = description.to_string();
        self
    }

    /// The nineteen response fields, without a signature.
    pub fn message(&self) -> String {
        let amount = format!("{:011}.{:02}", self.amount.value() / 100, self.amount.value() % 100);
        [
            self.merchant_id.as_str(),
            self.gateway_ref.as_str(),
            self.status_code.as_str(),
            self.gateway_txn_id.as_str(),
            self.bank_ref.as_str(),
            amount.as_str(),
            "HDF",
            self.auth_status.as_str(),
            "01",
            "INR",
            "NA",
            "NA",
            "NA",
            "NA",
            "NA",
            "NA",
            "NA",
            self.error_status.as_str(),
            self.error_description.as_str(),
        ]
        .join("|")
    }

    /// The full message, signed with the given configuration's secret.
    pub fn signed(&self, config: &GatewayConfig) -> String {
        let message = self.message();
        let signature = config.signer().sign(&message).expect("HMAC accepts any key length");
        format!("{message}|{signature}")
    }

    /// Signed correctly, then one hex character of the signature flipped.
    pub fn forged(&self, config: &GatewayConfig) -> String {
        let mut signed = self.signed(config);
        let last = signed.pop().unwrap_or('0');
        signed.push(if last == '0' { '1' } else { '0' });
        signed
    }
}
