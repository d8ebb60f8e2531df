use std::collections::HashMap;

use cucumber::World;
use pgr_engine::{
    db_types::MinorUnits,
    payment_objects::{InitiatedPayment, ReconciliationOutcome},
    test_utils::gateway_sim::GatewayResponseBuilder,
    ReconciliationError,
};

use crate::support::TestSystem;

#[derive(Default, Debug, World)]
pub struct PaymentWorld {
    pub system: Option<TestSystem>,
    /// The most recent payment attempt for each order
    pub payments: HashMap<String, InitiatedPayment>,
    pub last_outcome: Option<Result<ReconciliationOutcome, ReconciliationError>>,
}

impl PaymentWorld {
    pub fn system(&self) -> &TestSystem {
        self.system.as_ref().expect("Payment system not initialised")
    }

    pub fn payment(&self, order_ref: &str) -> &InitiatedPayment {
        self.payments.get(order_ref).unwrap_or_else(|| panic!("No payment was started for order {order_ref}"))
    }

    /// A gateway response for the latest attempt on the order, with the given status.
    pub fn response(&self, status: &str, order_ref: &str) -> GatewayResponseBuilder {
        let payment = self.payment(order_ref);
        let amount = payment.amount;
        match status {
            "success" => GatewayResponseBuilder::success(payment.gateway_ref.clone(), amount),
            "failed" => GatewayResponseBuilder::failed(payment.gateway_ref.clone(), amount),
            "pending" => GatewayResponseBuilder::pending(payment.gateway_ref.clone(), amount),
            code => GatewayResponseBuilder::new(payment.gateway_ref.clone(), amount).with_status(code),
        }
    }

    pub fn outcome(&self) -> &ReconciliationOutcome {
        match &self.last_outcome {
            Some(Ok(outcome)) => outcome,
            Some(Err(e)) => panic!("The last gateway response was rejected: {e}"),
            None => panic!("No gateway response has been handled"),
        }
    }

    pub fn major(amount: i64) -> MinorUnits {
        MinorUnits::from_major(amount)
    }
}
