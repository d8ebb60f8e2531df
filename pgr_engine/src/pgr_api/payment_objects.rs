use std::fmt::Display;

use pgr_common::{MinorUnits, MinorUnitsConversionError};
use serde::{Deserialize, Serialize};

use crate::db_types::{GatewayRef, Metadata, Order, OrderRef, Transaction, TransactionStatus};

pub const STATUS_SUCCESS: &str = "0300";
pub const STATUS_FAILED: &str = "0399";
pub const STATUS_PENDING: &str = "0002";

const MERCHANT_ID: usize = 0;
const GATEWAY_REF: usize = 1;
const TXN_STATUS: usize = 2;
const GATEWAY_TXN_ID: usize = 3;
const BANK_REF: usize = 4;
const TXN_AMOUNT: usize = 5;
const BANK_ID: usize = 6;
const AUTH_STATUS: usize = 7;
const TXN_TYPE: usize = 8;
const CURRENCY: usize = 9;
const ERROR_STATUS: usize = 17;
const ERROR_DESCRIPTION: usize = 18;

/// Which inbound channel delivered a gateway response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    /// The gateway's asynchronous server-to-server notification.
    Webhook,
    /// The customer's browser, redirected back from the gateway.
    BrowserReturn,
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Webhook => write!(f, "webhook"),
            Channel::BrowserReturn => write!(f, "return"),
        }
    }
}

/// What the gateway's status code means for the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOutcome {
    Success,
    Failed,
    /// The gateway has not reached a verdict yet. The transaction stays pending.
    PendingStill,
}

/// A verified gateway response, split into named fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub merchant_id: String,
    pub gateway_ref: GatewayRef,
    pub status_code: String,
    pub gateway_txn_id: String,
    pub bank_ref: String,
    pub amount: String,
    pub bank_id: String,
    pub auth_status: String,
    pub txn_type: String,
    pub currency: String,
    pub additional_info: Vec<String>,
    pub error_status: String,
    pub error_description: String,
}

impl GatewayResponse {
    /// Builds the response from the message fields (the signature already removed). Missing fields are left empty,
    /// but callers are expected to have checked the field count already.
    pub fn from_fields(fields: &[String]) -> Self {
        let field = |i: usize| fields.get(i).cloned().unwrap_or_default();
        Self {
            merchant_id: field(MERCHANT_ID),
            gateway_ref: GatewayRef(field(GATEWAY_REF)),
            status_code: field(TXN_STATUS),
            gateway_txn_id: field(GATEWAY_TXN_ID),
            bank_ref: field(BANK_REF),
            amount: field(TXN_AMOUNT),
            bank_id: field(BANK_ID),
            auth_status: field(AUTH_STATUS),
            txn_type: field(TXN_TYPE),
            currency: field(CURRENCY),
            additional_info: (CURRENCY + 1..ERROR_STATUS).map(field).collect(),
            error_status: field(ERROR_STATUS),
            error_description: field(ERROR_DESCRIPTION),
        }
    }

    pub fn is_recognised_status(&self) -> bool {
        matches!(self.status_code.as_str(), STATUS_SUCCESS | STATUS_FAILED | STATUS_PENDING)
    }

    /// Maps the status code. Anything unrecognised is a failure.
    pub fn outcome(&self) -> GatewayOutcome {
        match self.status_code.as_str() {
            STATUS_SUCCESS => GatewayOutcome::Success,
            STATUS_PENDING => GatewayOutcome::PendingStill,
            _ => GatewayOutcome::Failed,
        }
    }

    /// The reported amount. The gateway sends major units with up to two decimals.
    pub fn amount(&self) -> Result<MinorUnits, MinorUnitsConversionError> {
        self.amount.parse()
    }

    /// The fields worth keeping on the transaction record. Empty fields are left out.
    pub fn metadata(&self, channel: Channel) -> Metadata {
        let mut meta = Metadata::new();
        let mut put = |k: &str, v: &str| {
            if !v.trim().is_empty() {
                meta.insert(k.to_string(), v.to_string());
            }
        };
        put("gateway_txn_id", &self.gateway_txn_id);
        put("bank_ref", &self.bank_ref);
        put("gateway_status", &self.status_code);
        put("auth_status", &self.auth_status);
        put("txn_amount", &self.amount);
        put("bank_id", &self.bank_id);
        put("txn_type", &self.txn_type);
        put("error_status", &self.error_status);
        put("error_description", &self.error_description);
        put("channel", &channel.to_string());
        meta
    }
}

/// Where the customer should be sent, and what the gateway is told, once a response has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOutcome {
    Success,
    Failed,
    Pending,
}

impl From<TransactionStatus> for PaymentOutcome {
    fn from(value: TransactionStatus) -> Self {
        match value {
            TransactionStatus::Pending => PaymentOutcome::Pending,
            TransactionStatus::Success => PaymentOutcome::Success,
            TransactionStatus::Failed => PaymentOutcome::Failed,
        }
    }
}

impl Display for PaymentOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentOutcome::Success => write!(f, "success"),
            PaymentOutcome::Failed => write!(f, "failed"),
            PaymentOutcome::Pending => write!(f, "pending"),
        }
    }
}

/// The result of handling one inbound gateway response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationOutcome {
    pub gateway_ref: GatewayRef,
    pub order_ref: OrderRef,
    pub channel: Channel,
    /// Derived from the transaction record after the call, not from the response that was just handled.
    pub outcome: PaymentOutcome,
    /// True if this response was the one that finalized the transaction.
    pub applied: bool,
}

impl ReconciliationOutcome {
    pub fn new(transaction: &Transaction, channel: Channel, applied: bool) -> Self {
        Self {
            gateway_ref: transaction.gateway_ref.clone(),
            order_ref: transaction.order_ref.clone(),
            channel,
            outcome: transaction.status.into(),
            applied,
        }
    }
}

/// Everything the browser needs to hand the customer over to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiatedPayment {
    pub order_ref: OrderRef,
    pub gateway_ref: GatewayRef,
    pub transaction_id: i64,
    pub merchant_id: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub message: String,
    pub signature: String,
    pub payment_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusReport {
    pub order: Order,
    pub latest_transaction: Option<Transaction>,
}
