use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sps_common::Money;
use thiserror::Error;

use crate::db_types::ExternalRef;

/// Errors a payment gateway client can produce.
#[derive(Debug, Clone, Error)]
pub enum GatewayClientError {
    #[error("The gateway has no record of payment {0}")]
    PaymentNotFound(String),
    #[error("The gateway rejected the request ({status}): {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not reach the payment gateway. {0}")]
    Network(String),
    #[error("Could not interpret the gateway response. {0}")]
    ResponseFormat(String),
}

/// The settlement status of a payment, as reported by the gateway. Statuses the reconciliation flow does not act
/// on are preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Approved,
    Pending,
    Rejected,
    Other(String),
}

impl From<&str> for PaymentStatus {
    fn from(value: &str) -> Self {
        match value {
            "approved" => PaymentStatus::Approved,
            "pending" => PaymentStatus::Pending,
            "rejected" => PaymentStatus::Rejected,
            other => PaymentStatus::Other(other.to_string()),
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Approved => write!(f, "approved"),
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Rejected => write!(f, "rejected"),
            PaymentStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// The canonical record of a payment, as fetched from the gateway. Notification bodies are never trusted; this
/// record is always re-fetched from the gateway before any state changes on our side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPaymentRecord {
    pub payment_id: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub status_detail: Option<String>,
    pub amount: Money,
    pub currency: String,
    #[serde(default)]
    pub external_ref: Option<ExternalRef>,
    #[serde(default)]
    pub payer_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

/// A request to open a checkout at the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPreference {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub unit_price: Money,
    pub quantity: i64,
    pub currency: String,
    pub external_ref: ExternalRef,
    #[serde(default)]
    pub payer_email: Option<String>,
}

/// A checkout created at the gateway, with the URL the customer must be sent to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutPreference {
    pub preference_id: String,
    pub checkout_url: String,
    #[serde(default)]
    pub sandbox_checkout_url: Option<String>,
}

/// Client for the payment gateway.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayClient: Clone {
    /// Creates a checkout preference at the gateway. This call is never retried by implementations, since a
    /// duplicate request would open a second checkout.
    async fn create_preference(&self, preference: NewPreference) -> Result<CheckoutPreference, GatewayClientError>;

    /// Fetches the canonical payment record for `payment_id` from the gateway.
    async fn payment_by_id(&self, payment_id: &str) -> Result<GatewayPaymentRecord, GatewayClientError>;
}
