use std::{net::IpAddr, str::FromStr, sync::OnceLock};

use actix_web::HttpRequest;
use log::{debug, trace};
use pgr_engine::{db_types::OrderRef, payment_objects::PaymentOutcome};
use regex::Regex;

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| forwarded_for().captures(v))
            .and_then(|caps| caps.name("ip"))
            .map(|m| m.as_str())
            .and_then(|s| IpAddr::from_str(s).ok());
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr().map(|a| a.ip());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr
    })
}

fn forwarded_for() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"for="?(?P<ip>[^;,"]+)"#).expect("forwarded pattern is a valid regex"))
}

/// The front-end page a customer lands on after the gateway sends them back.
pub fn outcome_redirect(frontend_url: &str, outcome: PaymentOutcome, order_ref: &OrderRef) -> String {
    match outcome {
        PaymentOutcome::Success => format!("{frontend_url}/thank-you?orderId={order_ref}"),
        PaymentOutcome::Failed => format!("{frontend_url}/payment/failed?orderId={order_ref}"),
        PaymentOutcome::Pending => format!("{frontend_url}/payment/pending?orderId={order_ref}"),
    }
}

/// The generic failure page, for when the response could not be tied to an order.
pub fn failure_redirect(frontend_url: &str, reason: &str) -> String {
    format!("{frontend_url}/payment/failed?reason={reason}")
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn redirects() {
        let order_ref = OrderRef::from("ORD-1");
        let base = "https://shop.example.com";
        assert_eq!(
            outcome_redirect(base, PaymentOutcome::Success, &order_ref),
            "https://shop.example.com/thank-you?orderId=ORD-1"
        );
        assert_eq!(
            outcome_redirect(base, PaymentOutcome::Failed, &order_ref),
            "https://shop.example.com/payment/failed?orderId=ORD-1"
        );
        assert_eq!(
            outcome_redirect(base, PaymentOutcome::Pending, &order_ref),
            "https://shop.example.com/payment/pending?orderId=ORD-1"
        );
        assert_eq!(failure_redirect(base, "no-data"), "https://shop.example.com/payment/failed?reason=no-data");
    }

    #[test]
    fn remote_ip_from_headers() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "10.0.0.1, 192.168.1.1"))
            .insert_header(("Forwarded", "for=172.16.0.5;proto=https"))
            .peer_addr("127.0.0.1:8000".parse().unwrap())
            .to_http_request();
        assert_eq!(get_remote_ip(&req, true, true), Some("10.0.0.1".parse().unwrap()));
        assert_eq!(get_remote_ip(&req, false, true), Some("172.16.0.5".parse().unwrap()));
        assert_eq!(get_remote_ip(&req, false, false), Some("127.0.0.1".parse().unwrap()));
    }
}
