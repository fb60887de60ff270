use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::MercadoPagoConfig,
    data_objects::{Payment, Preference, PreferenceRequest},
    error::MercadoPagoApiError,
};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_CONNECT_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct MercadoPagoApi {
    config: MercadoPagoConfig,
    client: Arc<Client>,
}

impl MercadoPagoApi {
    pub fn new(config: MercadoPagoConfig) -> Result<Self, MercadoPagoApiError> {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.access_token.reveal()))
            .map_err(|e| MercadoPagoApiError::Initialization(format!("Invalid access token. {e}")))?;
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .build()
            .map_err(|e| MercadoPagoApiError::Initialization(e.to_string()))?;
        debug!("💰️ Mercado Pago client created for {}", config.base_url);
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MercadoPagoConfig {
        &self.config
    }

    /// Opens a checkout preference. This request is sent exactly once; retrying it could open a second checkout
    /// for the same basket.
    pub async fn create_preference(&self, request: &PreferenceRequest) -> Result<Preference, MercadoPagoApiError> {
        trace!("💰️ Creating checkout preference for reference {}", request.external_reference);
        self.rest_query(Method::POST, "/checkout/preferences", Some(request), false).await
    }

    /// Fetches the canonical record of a payment. Reads are idempotent, so connection failures are retried a
    /// handful of times before giving up.
    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, MercadoPagoApiError> {
        trace!("💰️ Fetching payment {payment_id}");
        let path = format!("/v1/payments/{payment_id}");
        match self.rest_query::<Payment, ()>(Method::GET, &path, None, true).await {
            Err(MercadoPagoApiError::QueryError { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(MercadoPagoApiError::PaymentNotFound(payment_id.to_string()))
            },
            other => other,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn rest_query<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        retry_connect: bool,
    ) -> Result<T, MercadoPagoApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut attempts = 0u32;
        let response = loop {
            attempts += 1;
            let mut request = self.client.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }
            match request.send().await {
                Ok(response) => break response,
                Err(e) if retry_connect && e.is_connect() && attempts < MAX_CONNECT_ATTEMPTS => {
                    warn!("💰️ Could not connect to Mercado Pago (attempt {attempts}/{MAX_CONNECT_ATTEMPTS}). {e}");
                    tokio::time::sleep(RETRY_BACKOFF * attempts).await;
                },
                Err(e) => return Err(MercadoPagoApiError::RequestError(e.to_string())),
            }
        };
        let status = response.status();
        if status.is_success() {
            response.json::<T>().await.map_err(|e| MercadoPagoApiError::JsonError(e.to_string()))
        } else {
            let message = response.text().await.unwrap_or_else(|e| e.to_string());
            debug!("💰️ Mercado Pago returned {status} for {url}: {message}");
            Err(MercadoPagoApiError::QueryError { status: status.as_u16(), message })
        }
    }
}
