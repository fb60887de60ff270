use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sps_common::Money;
use storefront_payment_engine::{db_types::LineItem, traits::GatewayPaymentRecord};

/// The body of `POST /payments/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub customer_id: i64,
    /// The basket the payment is for. Line items are validated and priced against the catalog when the payment
    /// settles.
    pub items: Vec<LineItemRequest>,
    /// Title shown on the gateway's checkout page.
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// The checkout price, sent as a string so clients do not have to worry about float formatting.
    pub price: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default = "default_currency")]
    pub currency_id: String,
    /// Optional reference to reuse, e.g. when a customer retries a checkout.
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub payer_email: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

fn default_currency() -> String {
    "ARS".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub item_id: String,
    pub quantity: i64,
}

impl From<LineItemRequest> for LineItem {
    fn from(value: LineItemRequest) -> Self {
        LineItem::new(value.item_id, value.quantity)
    }
}

/// The response to `POST /payments/create`. `init_point` is the URL the customer must be sent to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: String,
    pub init_point: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox_init_point: Option<String>,
}

/// A payment notification from the gateway. Only the payment id is ever used; everything else about the payment
/// is re-fetched from the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookNotification {
    #[serde(default, rename = "type")]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub live_mode: Option<bool>,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookData {
    pub id: String,
}

/// Query parameters of `POST /payments/webhook`. The gateway repeats the notification type here.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookParams {
    #[serde(default, rename = "type")]
    pub notification_type: Option<String>,
}

/// Query parameters of `POST /payments/process-order`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessOrderParams {
    #[serde(rename = "externalReference")]
    pub external_reference: String,
}

/// The response to `GET /payments/{payment_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub status_detail: Option<String>,
    pub transaction_amount: Money,
    pub currency_id: String,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_approved: Option<DateTime<Utc>>,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub payer_email: Option<String>,
}

impl From<GatewayPaymentRecord> for PaymentInfo {
    fn from(record: GatewayPaymentRecord) -> Self {
        Self {
            id: record.payment_id,
            status: record.status.to_string(),
            status_detail: record.status_detail,
            transaction_amount: record.amount,
            currency_id: record.currency,
            date_created: record.created_at,
            date_approved: record.approved_at,
            external_reference: record.external_ref.map(|r| r.to_string()),
            payer_email: record.payer_email,
        }
    }
}

/// The uniform acknowledgement envelope for webhook responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failure<S: ToString>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
