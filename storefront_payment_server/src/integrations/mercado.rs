//! Adapts the Mercado Pago client to the engine's payment gateway seam.

use mercado_gateway::{
    data_objects::{Payment, PreferenceBackUrls, PreferenceItem, PreferencePayer, PreferenceRequest},
    MercadoPagoApi,
    MercadoPagoApiError,
    MercadoPagoConfig,
};
use sps_common::Money;
use storefront_payment_engine::{
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

/// The production payment gateway: Mercado Pago, seen through the engine's `PaymentGatewayClient` seam.
#[derive(Debug, Clone)]
pub struct MercadoGateway {
    api: MercadoPagoApi,
}

impl MercadoGateway {
    pub fn new(config: MercadoPagoConfig) -> Result<Self, MercadoPagoApiError> {
        let api = MercadoPagoApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentGatewayClient for MercadoGateway {
    async fn create_preference(&self, preference: NewPreference) -> Result<CheckoutPreference, GatewayClientError> {
        let request = to_preference_request(preference, self.api.config());
        let created = self.api.create_preference(&request).await.map_err(into_client_error)?;
        Ok(CheckoutPreference {
            preference_id: created.id,
            checkout_url: created.init_point,
            sandbox_checkout_url: created.sandbox_init_point,
        })
    }

    async fn payment_by_id(&self, payment_id: &str) -> Result<GatewayPaymentRecord, GatewayClientError> {
        let payment = self.api.get_payment(payment_id).await.map_err(into_client_error)?;
        to_payment_record(payment)
    }
}

fn to_preference_request(preference: NewPreference, config: &MercadoPagoConfig) -> PreferenceRequest {
    let item = PreferenceItem {
        id: preference.external_ref.to_string(),
        title: preference.title,
        description: preference.description,
        category_id: "others".to_string(),
        quantity: preference.quantity,
        currency_id: preference.currency,
        unit_price: preference.unit_price.value() as f64,
    };
    PreferenceRequest {
        items: vec![item],
        back_urls: PreferenceBackUrls {
            success: config.success_url.clone(),
            failure: config.failure_url.clone(),
            pending: config.pending_url.clone(),
        },
        statement_descriptor: config.statement_descriptor.clone(),
        external_reference: preference.external_ref.to_string(),
        payer: preference.payer_email.map(|email| PreferencePayer { email }),
    }
}

fn to_payment_record(payment: Payment) -> Result<GatewayPaymentRecord, GatewayClientError> {
    let amount = Money::try_from(payment.transaction_amount)
        .map_err(|e| GatewayClientError::ResponseFormat(e.to_string()))?;
    Ok(GatewayPaymentRecord {
        payment_id: payment.id.to_string(),
        status: PaymentStatus::from(payment.status.as_str()),
        status_detail: payment.status_detail,
        amount,
        currency: payment.currency_id,
        external_ref: payment.external_reference.map(ExternalRef::from),
        payer_email: payment.payer.and_then(|p| p.email),
        created_at: payment.date_created,
        approved_at: payment.date_approved,
    })
}

fn into_client_error(error: MercadoPagoApiError) -> GatewayClientError {
    match error {
        MercadoPagoApiError::PaymentNotFound(id) => GatewayClientError::PaymentNotFound(id),
        MercadoPagoApiError::QueryError { status, message } => GatewayClientError::QueryError { status, message },
        MercadoPagoApiError::RequestError(e) | MercadoPagoApiError::Initialization(e) => GatewayClientError::Network(e),
        MercadoPagoApiError::JsonError(e) => GatewayClientError::ResponseFormat(e),
    }
}

#[cfg(test)]
mod test {
    use mercado_gateway::data_objects::Payment;
    use storefront_payment_engine::traits::PaymentStatus;

    use super::to_payment_record;

    #[test]
    fn payments_convert_to_gateway_records() {
        let payment: Payment = serde_json::from_str(
            r#"{
                "id": 42,
                "status": "approved",
                "transaction_amount": 5500.0,
                "currency_id": "ARS",
                "external_reference": "sps-xyz",
                "payer": { "email": "buyer@example.com" }
            }"#,
        )
        .unwrap();
        let record = to_payment_record(payment).unwrap();
        assert_eq!(record.payment_id, "42");
        assert_eq!(record.status, PaymentStatus::Approved);
        assert_eq!(record.amount.value(), 5500);
        assert_eq!(record.external_ref.unwrap().as_str(), "sps-xyz");
        assert_eq!(record.payer_email.as_deref(), Some("buyer@example.com"));
    }

    #[test]
    fn unknown_statuses_are_preserved() {
        let payment: Payment = serde_json::from_str(r#"{"id": 1, "status": "in_mediation"}"#).unwrap();
        let record = to_payment_record(payment).unwrap();
        assert_eq!(record.status, PaymentStatus::Other("in_mediation".to_string()));
    }
}
