//! Wire representations of the Mercado Pago objects this client touches. Field names follow the vendor API
//! exactly; only the fields this system reads or writes are modelled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct PreferenceItem {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category_id: String,
    pub quantity: i64,
    pub currency_id: String,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferenceBackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferencePayer {
    pub email: String,
}

/// The request body for `POST /checkout/preferences`.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub back_urls: PreferenceBackUrls,
    pub statement_descriptor: String,
    pub external_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<PreferencePayer>,
}

/// A created checkout preference. `init_point` is the URL the customer must be sent to.
#[derive(Debug, Clone, Deserialize)]
pub struct Preference {
    pub id: String,
    pub init_point: String,
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentPayer {
    #[serde(default)]
    pub email: Option<String>,
}

/// The canonical payment record from `GET /v1/payments/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub status: String,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub transaction_amount: f64,
    #[serde(default)]
    pub currency_id: String,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_approved: Option<DateTime<Utc>>,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub payer: Option<PaymentPayer>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payment_deserializes_from_vendor_json() {
        let json = r#"{
            "id": 12345678901,
            "status": "approved",
            "status_detail": "accredited",
            "transaction_amount": 15000,
            "currency_id": "ARS",
            "date_created": "2024-05-01T11:26:38.000-04:00",
            "date_approved": "2024-05-01T11:26:40.000-04:00",
            "external_reference": "sps-abc123",
            "payer": { "email": "buyer@example.com" },
            "some_field_we_do_not_model": { "nested": true }
        }"#;
        let payment: Payment = serde_json::from_str(json).unwrap();
        assert_eq!(payment.id, 12345678901);
        assert_eq!(payment.status, "approved");
        assert_eq!(payment.transaction_amount, 15000.0);
        assert_eq!(payment.external_reference.as_deref(), Some("sps-abc123"));
        assert_eq!(payment.payer.unwrap().email.as_deref(), Some("buyer@example.com"));
        assert!(payment.date_approved.unwrap() > payment.date_created.unwrap());
    }

    #[test]
    fn sparse_payments_still_deserialize() {
        let payment: Payment = serde_json::from_str(r#"{"id": 1, "status": "pending"}"#).unwrap();
        assert!(payment.external_reference.is_none());
        assert!(payment.payer.is_none());
    }
}
