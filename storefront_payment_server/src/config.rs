use std::env;

use chrono::Duration;
use log::*;
use mercado_gateway::MercadoPagoConfig;
use sps_common::{parse_boolean_flag, Secret};
use storefront_payment_engine::StoreConfig;

pub const DEFAULT_SPS_HOST: &str = "127.0.0.1";
pub const DEFAULT_SPS_PORT: u16 = 8360;
const DEFAULT_INTENT_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How long an unconfirmed payment intent may sit in the cache before it is considered abandoned and
    /// evicted.
    pub intent_ttl: Duration,
    pub store: StoreConfig,
    pub gateway: MercadoPagoConfig,
    pub webhook: WebhookOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPS_HOST.to_string(),
            port: DEFAULT_SPS_PORT,
            intent_ttl: Duration::hours(DEFAULT_INTENT_TTL_HOURS),
            store: StoreConfig::default(),
            gateway: MercadoPagoConfig::default(),
            webhook: WebhookOptions::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("SPS_HOST").unwrap_or_else(|_| {
            info!("🪛️ SPS_HOST is not set. Using the default: {DEFAULT_SPS_HOST}");
            DEFAULT_SPS_HOST.to_string()
        });
        let port = env::var("SPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port ({e}). Using the default: {DEFAULT_SPS_PORT}");
                    DEFAULT_SPS_PORT
                })
            })
            .unwrap_or(DEFAULT_SPS_PORT);
        let intent_ttl = env::var("SPS_INTENT_TTL_HOURS")
            .map(|s| {
                s.parse::<i64>().map(Duration::hours).unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid intent TTL ({e}). Using the default: {DEFAULT_INTENT_TTL_HOURS} hours"
                    );
                    Duration::hours(DEFAULT_INTENT_TTL_HOURS)
                })
            })
            .unwrap_or_else(|_| Duration::hours(DEFAULT_INTENT_TTL_HOURS));
        let store = StoreConfig::from_env_or_default();
        let gateway = MercadoPagoConfig::from_env_or_default();
        let webhook = WebhookOptions::from_env_or_default();
        Self { host, port, intent_ttl, store, gateway, webhook }
    }
}

/// Controls verification of gateway webhook signatures.
#[derive(Debug, Clone, Default)]
pub struct WebhookOptions {
    pub secret: Option<Secret<String>>,
    pub verify_signatures: bool,
}

impl WebhookOptions {
    /// Signature checks off. For local development and tests.
    pub fn disabled() -> Self {
        Self { secret: None, verify_signatures: false }
    }

    pub fn from_env_or_default() -> Self {
        let secret = env::var("SPS_WEBHOOK_SECRET").ok().map(Secret::new);
        let verify_signatures = parse_boolean_flag(env::var("SPS_WEBHOOK_CHECKS").ok(), true);
        match (&secret, verify_signatures) {
            (None, true) => {
                warn!("🪛️ SPS_WEBHOOK_SECRET is not set. Webhook signatures will NOT be verified.");
            },
            (_, false) => warn!("🪛️ Webhook signature checks are disabled. Do not do this in production."),
            _ => {},
        }
        Self { secret, verify_signatures }
    }

    /// Whether incoming webhooks must carry a valid signature.
    pub fn active(&self) -> bool {
        self.verify_signatures && self.secret.is_some()
    }
}

#[cfg(test)]
mod test {
    use super::WebhookOptions;
    use sps_common::Secret;

    #[test]
    fn webhook_checks_require_a_secret() {
        let options = WebhookOptions::disabled();
        assert!(!options.active());
        let options = WebhookOptions { secret: None, verify_signatures: true };
        assert!(!options.active());
        let options = WebhookOptions { secret: Some(Secret::new("s".into())), verify_signatures: true };
        assert!(options.active());
    }
}
