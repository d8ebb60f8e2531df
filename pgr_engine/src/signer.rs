//! Builds signed payment requests for the gateway, and verifies the signatures on the messages it sends back.
//!
//! Messages are flat lists of fields joined with `|`. The signature is an HMAC-SHA256 over the joined fields, keyed
//! with the merchant's signing secret and rendered as lower-case hex. On inbound messages the signature is the last
//! field.
//!
//! Nothing in here does any I/O.
use std::sync::OnceLock;

use hmac::{Hmac, Mac};
use log::*;
use pgr_common::{MinorUnits, Secret};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::db_types::GatewayRef;

type HmacSha256 = Hmac<Sha256>;

pub const FIELD_DELIMITER: char = '|';
/// Nine message fields followed by the signature.
pub const REQUEST_FIELD_COUNT: usize = 10;
/// Nineteen response fields followed by the signature.
pub const RESPONSE_FIELD_COUNT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("Payment amount must be positive, got {0}")]
    InvalidAmount(MinorUnits),
    #[error("The {0} field contains the field delimiter")]
    MalformedField(&'static str),
    #[error("Expected {expected} fields in the payload, but found {found}")]
    MalformedPayload { expected: usize, found: usize },
    #[error("The signing key was rejected: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl CustomerDetails {
    pub fn new<S: Into<String>>(name: S, email: S, phone: S) -> Self {
        Self { name: name.into(), email: email.into(), phone: phone.into() }
    }
}

/// The fields of an outbound payment request, in the order the gateway expects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub merchant_id: String,
    pub gateway_ref: GatewayRef,
    pub amount: MinorUnits,
    pub currency: String,
    pub customer: CustomerDetails,
    pub return_url: String,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRequest {
    pub message: String,
    pub signature: String,
}

impl SignedRequest {
    /// The message with its signature appended, as some gateway integrations expect a single field.
    pub fn payload(&self) -> String {
        format!("{}{FIELD_DELIMITER}{}", self.message, self.signature)
    }
}

/// The result of checking an inbound message. `fields` excludes the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayload {
    pub fields: Vec<String>,
    pub verified: bool,
}

#[derive(Clone)]
pub struct Signer {
    secret: Secret<String>,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signer({})", self.secret)
    }
}

impl Signer {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    /// Joins the request fields in gateway order and signs them.
    ///
    /// Fields are never escaped or altered. A field that contains the delimiter is rejected, since it would shift
    /// every subsequent field on the gateway's side.
    pub fn build_signed_request(&self, req: &PaymentRequest) -> Result<SignedRequest, SignerError> {
        if !req.amount.is_positive() {
            return Err(SignerError::InvalidAmount(req.amount));
        }
        let amount = req.amount.value().to_string();
        let fields: [(&'static str, &str); 9] = [
            ("merchant_id", req.merchant_id.as_str()),
            ("gateway_ref", req.gateway_ref.as_str()),
            ("amount", amount.as_str()),
            ("currency", req.currency.as_str()),
            ("customer_name", req.customer.name.as_str()),
            ("customer_email", req.customer.email.as_str()),
            ("customer_phone", req.customer.phone.as_str()),
            ("return_url", req.return_url.as_str()),
            ("mode", req.mode.as_str()),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| v.contains(FIELD_DELIMITER)) {
            return Err(SignerError::MalformedField(*name));
        }
        let message = fields.iter().map(|(_, v)| *v).collect::<Vec<_>>().join("|");
        let signature = self.sign(&message)?;
        trace!("🔏️ Signed payment request for {}", req.gateway_ref);
        Ok(SignedRequest { message, signature })
    }

    /// Splits `raw` into fields and checks the trailing signature against the rest of the message.
    ///
    /// The only error is a wrong field count. Every other problem, including a signature that is not in canonical
    /// lower-case hex form, is reported as `verified: false`.
    pub fn verify_signature(&self, raw: &str, expected_fields: usize) -> Result<VerifiedPayload, SignerError> {
        let found = raw.split(FIELD_DELIMITER).count();
        let malformed = SignerError::MalformedPayload { expected: expected_fields, found };
        if found != expected_fields {
            return Err(malformed);
        }
        let Some((message, signature)) = raw.rsplit_once(FIELD_DELIMITER) else {
            return Err(malformed);
        };
        let verified = self.check(message, signature)?;
        let fields = message.split(FIELD_DELIMITER).map(String::from).collect();
        Ok(VerifiedPayload { fields, verified })
    }

    pub fn sign(&self, message: &str) -> Result<String, SignerError> {
        let mut mac = self.mac()?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn check(&self, message: &str, signature: &str) -> Result<bool, SignerError> {
        if !canonical_signature().is_match(signature) {
            return Ok(false);
        }
        let Ok(expected) = hex::decode(signature) else {
            return Ok(false);
        };
        let mut mac = self.mac()?;
        mac.update(message.as_bytes());
        Ok(mac.verify_slice(&expected).is_ok())
    }

    fn mac(&self) -> Result<HmacSha256, SignerError> {
        HmacSha256::new_from_slice(self.secret.reveal().as_bytes()).map_err(|e| SignerError::InvalidKey(e.to_string()))
    }
}

fn canonical_signature() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[0-9a-f]{64}$").expect("signature pattern is a valid regex"))
}
