use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use sps_common::Money;

use crate::{
    db_types::ExternalRef,
    traits::{
        CheckoutPreference,
        GatewayClientError,
        GatewayPaymentRecord,
        NewPreference,
        PaymentGatewayClient,
        PaymentStatus,
    },
};

#[derive(Default)]
struct ScriptedGatewayInner {
    payments: HashMap<String, GatewayPaymentRecord>,
    preferences: Vec<NewPreference>,
}

/// A gateway double that replays whatever payment records a test scripts into it.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    inner: Arc<Mutex<ScriptedGatewayInner>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a payment record with sensible defaults for scripting.
    pub fn payment(payment_id: &str, status: PaymentStatus, external_ref: Option<&str>) -> GatewayPaymentRecord {
        GatewayPaymentRecord {
            payment_id: payment_id.to_string(),
            status,
            status_detail: None,
            amount: Money::from(1000),
            currency: "ARS".to_string(),
            external_ref: external_ref.map(ExternalRef::from),
            payer_email: None,
            created_at: None,
            approved_at: None,
        }
    }

    pub fn script_payment(&self, record: GatewayPaymentRecord) {
        self.inner.lock().unwrap().payments.insert(record.payment_id.clone(), record);
    }

    /// The preferences that have been created on this gateway, oldest first.
    pub fn preferences(&self) -> Vec<NewPreference> {
        self.inner.lock().unwrap().preferences.clone()
    }
}

impl PaymentGatewayClient for ScriptedGateway {
    async fn create_preference(&self, preference: NewPreference) -> Result<CheckoutPreference, GatewayClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.preferences.push(preference);
        let n = inner.preferences.len();
        Ok(CheckoutPreference {
            preference_id: format!("pref-{n}"),
            checkout_url: format!("https://gateway.test/checkout/{n}"),
            sandbox_checkout_url: Some(format!("https://sandbox.gateway.test/checkout/{n}")),
        })
    }

    async fn payment_by_id(&self, payment_id: &str) -> Result<GatewayPaymentRecord, GatewayClientError> {
        self.inner
            .lock()
            .unwrap()
            .payments
            .get(payment_id)
            .cloned()
            .ok_or_else(|| GatewayClientError::PaymentNotFound(payment_id.to_string()))
    }
}
