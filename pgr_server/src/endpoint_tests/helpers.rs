use std::time::Duration;

use actix_web::{
    body::MessageBody,
    http::{header, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use log::debug;

use crate::config::ServerOptions;

pub const FRONTEND_URL: &str = "https://shop.example.com";

pub fn server_options() -> ServerOptions {
    ServerOptions {
        frontend_url: FRONTEND_URL.to_string(),
        initiation_timeout: Duration::from_secs(2),
        use_x_forwarded_for: false,
        use_forwarded: false,
    }
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

pub async fn send<F>(req: TestRequest, configure: F) -> TestResponse
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::call_service(&service, req.to_request()).await.into_parts();
    let status = res.status();
    let location = res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()).map(String::from);
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    TestResponse { status, location, body }
}
