use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::*;
use serde_json::json;
use storefront_payment_engine::{
    traits::{GatewayClientError, StoreApiError},
    OrderApiError,
    OrderFlowError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize the server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read the request. {0}")]
    InvalidRequestBody(String),
    #[error("The payment gateway call failed. {0}")]
    PaymentGatewayError(String),
    #[error("The requested data was not found. {0}")]
    NoRecordFound(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Unspecified error. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            ServerError::NoRecordFound(_) => StatusCode::NOT_FOUND,
            ServerError::PaymentGatewayError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        debug!("💻️ Responding {} to a failed request. {self}", self.status_code());
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(value: OrderFlowError) -> Self {
        match value {
            OrderFlowError::OrderError(e) => e.into(),
            OrderFlowError::GatewayError(e) => e.into(),
            OrderFlowError::StoreError(e) => ServerError::BackendError(e.to_string()),
            e @ OrderFlowError::IntentNotFound(_) => ServerError::NoRecordFound(e.to_string()),
            OrderFlowError::InvalidIntent(msg) => ServerError::InvalidRequestBody(msg),
        }
    }
}

impl From<OrderApiError> for ServerError {
    fn from(value: OrderApiError) -> Self {
        match value {
            e @ OrderApiError::ItemNotFound(_) => ServerError::NoRecordFound(e.to_string()),
            e @ (OrderApiError::ItemNotPriced(_) | OrderApiError::InvalidQuantity | OrderApiError::EmptyOrder) => {
                ServerError::InvalidRequestBody(e.to_string())
            },
            e @ (OrderApiError::StoreError(_) | OrderApiError::RolledBack(_, _)) => {
                ServerError::BackendError(e.to_string())
            },
        }
    }
}

impl From<GatewayClientError> for ServerError {
    fn from(value: GatewayClientError) -> Self {
        match value {
            e @ GatewayClientError::PaymentNotFound(_) => ServerError::NoRecordFound(e.to_string()),
            e => ServerError::PaymentGatewayError(e.to_string()),
        }
    }
}

impl From<StoreApiError> for ServerError {
    fn from(value: StoreApiError) -> Self {
        ServerError::BackendError(value.to_string())
    }
}

#[cfg(test)]
mod test {
    use actix_web::{http::StatusCode, ResponseError};
    use storefront_payment_engine::{
        traits::GatewayClientError,
        OrderApiError,
        OrderFlowError,
    };

    use super::ServerError;

    #[test]
    fn status_codes_follow_the_error_taxonomy() {
        let e: ServerError = OrderApiError::ItemNotFound("x".into()).into();
        assert_eq!(e.status_code(), StatusCode::NOT_FOUND);
        let e: ServerError = OrderApiError::InvalidQuantity.into();
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        let e: ServerError = GatewayClientError::Network("down".into()).into();
        assert_eq!(e.status_code(), StatusCode::BAD_GATEWAY);
        let e: ServerError = GatewayClientError::PaymentNotFound("p".into()).into();
        assert_eq!(e.status_code(), StatusCode::NOT_FOUND);
        let e: ServerError =
            OrderFlowError::IntentNotFound(storefront_payment_engine::db_types::ExternalRef::from("r")).into();
        assert_eq!(e.status_code(), StatusCode::NOT_FOUND);
        let e = ServerError::Unspecified("boom".into());
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
