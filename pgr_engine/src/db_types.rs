use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use pgr_common::{MinorUnits, DEFAULT_CURRENCY_CODE};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

/// Free-form data reported by the gateway (provider transaction id, bank reference, raw error fields and so on).
pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderRef       ---------------------------------------------------------
/// The merchant's order reference. Unique and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderRef(pub String);

impl FromStr for OrderRef {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       GatewayRef      ---------------------------------------------------------
/// The order reference sent to the payment gateway. One per payment attempt, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct GatewayRef(pub String);

impl From<String> for GatewayRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GatewayRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for GatewayRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl GatewayRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// No successful payment has been recorded for the order yet.
    Unpaid,
    /// A verified success outcome has been applied to the order.
    Paid,
    /// The latest payment attempt failed. The customer may try again.
    Failed,
    /// The order was paid and subsequently refunded.
    Refunded,
}

impl PaymentStatus {
    /// `Paid` and `Refunded` are never overwritten by a gateway outcome.
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Refunded)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "Unpaid"),
            PaymentStatus::Paid => write!(f, "Paid"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unpaid" => Ok(Self::Unpaid),
            "Paid" => Ok(Self::Paid),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   FulfillmentStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum FulfillmentStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfillmentStatus::Pending => write!(f, "Pending"),
            FulfillmentStatus::Processing => write!(f, "Processing"),
            FulfillmentStatus::Shipped => write!(f, "Shipped"),
            FulfillmentStatus::Delivered => write!(f, "Delivered"),
            FulfillmentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for FulfillmentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid fulfillment status: {s}"))),
        }
    }
}

//--------------------------------------       LineItem        ---------------------------------------------------------
/// One product line of an order. The unit price is frozen when the order is placed.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LineItem {
    pub product_ref: String,
    pub quantity: i64,
    pub unit_price: MinorUnits,
}

impl LineItem {
    pub fn new<S: Into<String>>(product_ref: S, quantity: i64, unit_price: MinorUnits) -> Self {
        Self { product_ref: product_ref.into(), quantity, unit_price }
    }

    pub fn subtotal(&self) -> MinorUnits {
        self.unit_price * self.quantity
    }
}

//--------------------------------------          Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_ref: OrderRef,
    pub customer_ref: String,
    pub total: MinorUnits,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
    /// The id of the transaction whose outcome was last projected onto this order.
    pub synced_transaction_id: Option<i64>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub items: Vec<LineItem>,
}

impl Order {
    pub fn with_items(mut self, items: Vec<LineItem>) -> Self {
        self.items = items;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.fulfillment_status == FulfillmentStatus::Cancelled
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_ref: OrderRef,
    /// Identifies the customer, and therefore the cart to clear once the order is paid.
    pub customer_ref: String,
    pub currency: String,
    pub items: Vec<LineItem>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(order_ref: OrderRef, customer_ref: S) -> Self {
        Self {
            order_ref,
            customer_ref: customer_ref.into(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            items: Vec::new(),
        }
    }

    pub fn with_item<S: Into<String>>(mut self, product_ref: S, quantity: i64, unit_price: MinorUnits) -> Self {
        self.items.push(LineItem::new(product_ref, quantity, unit_price));
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    /// The order total is always the sum of the line items.
    pub fn total(&self) -> MinorUnits {
        self.items.iter().map(LineItem::subtotal).sum()
    }
}

//--------------------------------------   TransactionStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Created at initiation, awaiting a verified outcome from the gateway.
    Pending,
    /// Terminal. The gateway reported a verified successful payment.
    Success,
    /// Terminal. The gateway reported a failure, or the outcome could not be accepted.
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "Pending"),
            TransactionStatus::Success => write!(f, "Success"),
            TransactionStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid transaction status: {s}"))),
        }
    }
}

/// The terminal statuses a pending transaction can be finalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalStatus {
    Success,
    Failed,
}

impl From<FinalStatus> for TransactionStatus {
    fn from(value: FinalStatus) -> Self {
        match value {
            FinalStatus::Success => TransactionStatus::Success,
            FinalStatus::Failed => TransactionStatus::Failed,
        }
    }
}

impl Display for FinalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        TransactionStatus::from(*self).fmt(f)
    }
}

//--------------------------------------       Transaction     ---------------------------------------------------------
/// One attempt to pay for an order through the gateway.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub order_ref: OrderRef,
    pub gateway_ref: GatewayRef,
    pub amount: MinorUnits,
    pub currency: String,
    pub status: TransactionStatus,
    pub metadata: Json<Metadata>,
    /// Set when a newer attempt for the same order replaced this one while it was still pending.
    pub superseded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_superseded(&self) -> bool {
        self.superseded_at.is_some()
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub order_ref: OrderRef,
    pub gateway_ref: GatewayRef,
    pub amount: MinorUnits,
    pub currency: String,
}

impl NewTransaction {
    pub fn new(order_ref: OrderRef, gateway_ref: GatewayRef, amount: MinorUnits) -> Self {
        Self { order_ref, gateway_ref, amount, currency: DEFAULT_CURRENCY_CODE.to_string() }
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }
}

//--------------------------------------        CartItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub customer_ref: String,
    pub product_ref: String,
    pub quantity: i64,
}
