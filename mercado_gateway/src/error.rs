use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MercadoPagoApiError {
    #[error("Could not initialize the Mercado Pago client. {0}")]
    Initialization(String),
    #[error("Mercado Pago has no record of payment {0}")]
    PaymentNotFound(String),
    #[error("Mercado Pago rejected the request ({status}): {message}")]
    QueryError { status: u16, message: String },
    #[error("Error sending request to Mercado Pago. {0}")]
    RequestError(String),
    #[error("Could not deserialize the Mercado Pago response. {0}")]
    JsonError(String),
}
