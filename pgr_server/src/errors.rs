use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use pgr_engine::OrderApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state of the order. {0}")]
    InvalidOrderState(String),
    #[error("The payment gateway is unavailable. {0}")]
    GatewayUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidOrderState(_) => StatusCode::CONFLICT,
            Self::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderApiError> for ServerError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderApiError::AlreadyPaid(_)
            | OrderApiError::OrderCancelled(_)
            | OrderApiError::OrderAlreadyExists(_)
            | OrderApiError::CancellationForbidden(_)
            | OrderApiError::ConcurrentUpdate(_) => Self::InvalidOrderState(e.to_string()),
            OrderApiError::InvalidOrder(_) | OrderApiError::SigningError(_) => Self::InvalidRequestBody(e.to_string()),
            OrderApiError::GatewayUnavailable(_) => Self::GatewayUnavailable(e.to_string()),
            OrderApiError::DatabaseError(_) | OrderApiError::DuplicateGatewayRef(_) => {
                Self::BackendError(e.to_string())
            },
        }
    }
}

#[cfg(test)]
mod test {
    use pgr_engine::{db_types::OrderRef, SignerError};

    use super::*;

    #[test]
    fn order_errors_map_to_status_codes() {
        let id = || OrderRef::from("ORD-1");
        let status = |e: OrderApiError| ServerError::from(e).status_code();
        assert_eq!(status(OrderApiError::OrderNotFound(id())), StatusCode::NOT_FOUND);
        assert_eq!(status(OrderApiError::AlreadyPaid(id())), StatusCode::CONFLICT);
        assert_eq!(status(OrderApiError::ConcurrentUpdate(id())), StatusCode::CONFLICT);
        assert_eq!(
            status(OrderApiError::SigningError(SignerError::MalformedField("customer_name"))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(OrderApiError::GatewayUnavailable("timeout".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status(OrderApiError::DatabaseError("locked".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
