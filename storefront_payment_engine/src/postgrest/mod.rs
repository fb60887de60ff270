//! The production storage backend: a PostgREST-style data API, as exposed by Supabase.
//!
//! Every table is reached under `{base_url}/rest/v1/{table}` with filters passed as query parameters
//! (`id=eq.42`) and write behavior controlled through the `Prefer` header. One `PostgrestStore` instance holds a
//! single pooled HTTP client and is cheap to clone.

mod catalog;
mod customers;
mod orders;

use std::{env, sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use sps_common::Secret;

use crate::traits::StoreApiError;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection details for the data API.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
}

impl StoreConfig {
    pub fn new<S: Into<String>>(base_url: S, api_key: Secret<String>) -> Self {
        Self { base_url: base_url.into(), api_key }
    }

    /// Creates a new configuration from the `SPS_STORE_URL` and `SPS_STORE_API_KEY` environment variables, or
    /// useless defaults with a warning if they are not set.
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("SPS_STORE_URL").unwrap_or_else(|_| {
            warn!("🪛️ SPS_STORE_URL is not set. Using an unusable default. The store will not work.");
            "http://localhost:54321".to_string()
        });
        let api_key = env::var("SPS_STORE_API_KEY").map(Secret::new).unwrap_or_else(|_| {
            warn!("🪛️ SPS_STORE_API_KEY is not set. Store queries will be rejected.");
            Secret::new(String::new())
        });
        Self { base_url, api_key }
    }
}

/// A client for the data API, implementing all of the engine's storage seams.
#[derive(Clone)]
pub struct PostgrestStore {
    config: StoreConfig,
    client: Arc<Client>,
}

impl PostgrestStore {
    pub fn new(config: StoreConfig) -> Result<Self, StoreApiError> {
        let key = HeaderValue::from_str(config.api_key.reveal())
            .map_err(|e| StoreApiError::Initialization(format!("The API key is not a valid header value. {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| StoreApiError::Initialization(format!("The API key is not a valid header value. {e}")))?;
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(DEFAULT_READ_TIMEOUT)
            .build()
            .map_err(|e| StoreApiError::Initialization(e.to_string()))?;
        debug!("📝️ Data store client created for {}", config.base_url);
        Ok(Self { config, client: Arc::new(client) })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.base_url.trim_end_matches('/'))
    }

    /// Runs a query against `table` and deserializes the row set in the response.
    pub(crate) async fn rows<T, B>(
        &self,
        method: Method,
        table: &str,
        params: &[(&str, &str)],
        body: Option<&B>,
        prefer: Option<&str>,
    ) -> Result<Vec<T>, StoreApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.table_url(table);
        trace!("📝️ {method} {url} {params:?}");
        let mut request = self.client.request(method, url);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(prefer) = prefer {
            request = request.header("Prefer", prefer);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|e| StoreApiError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            response.json::<Vec<T>>().await.map_err(|e| StoreApiError::ResponseFormat(e.to_string()))
        } else {
            let message = response.text().await.unwrap_or_else(|e| e.to_string());
            debug!("📝️ The data store returned {status}: {message}");
            Err(StoreApiError::QueryError { status: status.as_u16(), message })
        }
    }

    /// Runs a query where the response body does not matter, such as a DELETE.
    pub(crate) async fn execute(
        &self,
        method: Method,
        table: &str,
        params: &[(&str, &str)],
    ) -> Result<(), StoreApiError> {
        let url = self.table_url(table);
        trace!("📝️ {method} {url} {params:?}");
        let response = self
            .client
            .request(method, url)
            .query(params)
            .send()
            .await
            .map_err(|e| StoreApiError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_else(|e| e.to_string());
            Err(StoreApiError::QueryError { status: status.as_u16(), message })
        }
    }
}
