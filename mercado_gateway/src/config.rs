use std::env;

use log::*;
use sps_common::Secret;

pub const DEFAULT_API_BASE_URL: &str = "https://api.mercadopago.com";
const DEFAULT_REDIRECT_BASE: &str = "http://localhost:8360/payments";

#[derive(Debug, Clone)]
pub struct MercadoPagoConfig {
    pub base_url: String,
    pub access_token: Secret<String>,
    /// Where the gateway sends the customer after a successful, failed or pending checkout.
    pub success_url: String,
    pub failure_url: String,
    pub pending_url: String,
    /// The label that appears on the customer's card statement.
    pub statement_descriptor: String,
}

impl Default for MercadoPagoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            access_token: Secret::default(),
            success_url: format!("{DEFAULT_REDIRECT_BASE}/success"),
            failure_url: format!("{DEFAULT_REDIRECT_BASE}/failure"),
            pending_url: format!("{DEFAULT_REDIRECT_BASE}/pending"),
            statement_descriptor: "STOREFRONT".to_string(),
        }
    }
}

impl MercadoPagoConfig {
    /// Creates a new configuration from the `SPS_MP_*` environment variables, falling back to defaults (with a
    /// warning) where a variable is not set.
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let base_url = env::var("SPS_MP_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let access_token = env::var("SPS_MP_ACCESS_TOKEN").map(Secret::new).unwrap_or_else(|_| {
            warn!("🪛️ SPS_MP_ACCESS_TOKEN is not set. Calls to Mercado Pago will be rejected.");
            Secret::default()
        });
        let success_url = env::var("SPS_MP_SUCCESS_URL").unwrap_or_else(|_| {
            warn!("🪛️ SPS_MP_SUCCESS_URL is not set. Using default: {}", defaults.success_url);
            defaults.success_url.clone()
        });
        let failure_url = env::var("SPS_MP_FAILURE_URL").unwrap_or_else(|_| {
            warn!("🪛️ SPS_MP_FAILURE_URL is not set. Using default: {}", defaults.failure_url);
            defaults.failure_url.clone()
        });
        let pending_url = env::var("SPS_MP_PENDING_URL").unwrap_or_else(|_| {
            warn!("🪛️ SPS_MP_PENDING_URL is not set. Using default: {}", defaults.pending_url);
            defaults.pending_url.clone()
        });
        let statement_descriptor = env::var("SPS_MP_STATEMENT_DESCRIPTOR").unwrap_or_else(|_| {
            info!("🪛️ SPS_MP_STATEMENT_DESCRIPTOR is not set. Using default: {}", defaults.statement_descriptor);
            defaults.statement_descriptor.clone()
        });
        Self { base_url, access_token, success_url, failure_url, pending_url, statement_descriptor }
    }
}
