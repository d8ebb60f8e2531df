use std::{fmt::Debug, time::Duration};

use log::*;
use thiserror::Error;

use crate::{
    db_types::{NewTransaction, OrderRef},
    gateway_config::GatewayConfig,
    helpers::new_gateway_ref,
    pgr_api::{errors::OrderApiError, ledger_api::TransactionLedger, payment_objects::InitiatedPayment},
    signer::{CustomerDetails, PaymentRequest, SignedRequest, Signer},
    traits::{LedgerStore, OrderStore},
};

#[derive(Debug, Clone, Error)]
#[error("Gateway connector error: {0}")]
pub struct ConnectorError(pub String);

/// Submits a signed payment request to the gateway on the customer's behalf. Only needed for integrations where the
/// server, rather than the customer's browser, talks to the gateway first.
#[allow(async_fn_in_trait)]
pub trait GatewayConnector {
    async fn submit(&self, request: &SignedRequest) -> Result<(), ConnectorError>;
}

/// Starts payment attempts.
pub struct CheckoutApi<B> {
    db: B,
    config: GatewayConfig,
    signer: Signer,
    ledger: TransactionLedger<B>,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({})", self.config.merchant_id)
    }
}

impl<B: Clone> CheckoutApi<B> {
    pub fn new(db: B, config: GatewayConfig) -> Self {
        let signer = config.signer();
        let ledger = TransactionLedger::new(db.clone());
        Self { db, config, signer, ledger }
    }
}

impl<B> CheckoutApi<B>
where B: OrderStore + LedgerStore
{
    /// Signs a payment request for the order's full amount and records a new pending transaction for it.
    ///
    /// Any earlier pending attempt for the order is superseded. The order must exist, must not be cancelled, and must
    /// not already be paid or refunded. Nothing is written if the request cannot be signed.
    pub async fn initiate_payment(
        &self,
        order_ref: &OrderRef,
        customer: CustomerDetails,
    ) -> Result<InitiatedPayment, OrderApiError> {
        let order =
            self.db.fetch_order(order_ref).await?.ok_or_else(|| OrderApiError::OrderNotFound(order_ref.clone()))?;
        if order.payment_status.is_settled() {
            return Err(OrderApiError::AlreadyPaid(order_ref.clone()));
        }
        if order.is_cancelled() {
            return Err(OrderApiError::OrderCancelled(order_ref.clone()));
        }
        let gateway_ref = new_gateway_ref(order_ref);
        let request = PaymentRequest {
            merchant_id: self.config.merchant_id.clone(),
            gateway_ref: gateway_ref.clone(),
            amount: order.total,
            currency: order.currency.clone(),
            customer,
            return_url: self.config.return_url.clone(),
            mode: self.config.payment_mode.clone(),
        };
        let signed = self.signer.build_signed_request(&request)?;
        let new_txn = NewTransaction::new(order_ref.clone(), gateway_ref, order.total).with_currency(&order.currency);
        let txn = self.ledger.create_pending(new_txn).await?;
        Ok(InitiatedPayment {
            order_ref: txn.order_ref,
            gateway_ref: txn.gateway_ref,
            transaction_id: txn.id,
            merchant_id: self.config.merchant_id.clone(),
            amount: txn.amount,
            currency: txn.currency,
            message: signed.message,
            signature: signed.signature,
            payment_url: self.config.gateway_url.clone(),
        })
    }

    /// As [`Self::initiate_payment`], then submits the signed request through `connector`.
    ///
    /// If the connector fails or does not answer within `timeout`, the pending transaction is rolled back and
    /// [`OrderApiError::GatewayUnavailable`] is returned.
    pub async fn initiate_payment_with<C: GatewayConnector>(
        &self,
        connector: &C,
        timeout: Duration,
        order_ref: &OrderRef,
        customer: CustomerDetails,
    ) -> Result<InitiatedPayment, OrderApiError> {
        let payment = self.initiate_payment(order_ref, customer).await?;
        let request = SignedRequest { message: payment.message.clone(), signature: payment.signature.clone() };
        let reason = match tokio::time::timeout(timeout, connector.submit(&request)).await {
            Ok(Ok(())) => return Ok(payment),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("No response from the gateway after {}ms", timeout.as_millis()),
        };
        warn!("🛒️ Payment attempt {} could not be submitted: {reason}", payment.gateway_ref);
        self.ledger.rollback_pending(&payment.gateway_ref).await?;
        Err(OrderApiError::GatewayUnavailable(reason))
    }
}
