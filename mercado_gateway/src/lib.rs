//! # Mercado Gateway
//!
//! A minimal client for the two corners of the Mercado Pago REST API this system needs:
//!
//! * `POST /checkout/preferences` — open a checkout and get the URL to send the customer to, and
//! * `GET /v1/payments/{id}` — fetch the canonical record of a payment.
//!
//! Nothing vendor-specific leaks out of this crate beyond its own data objects; the server adapts them to the
//! engine's gateway seam.

mod api;
mod config;
pub mod data_objects;
mod error;

pub use api::MercadoPagoApi;
pub use config::MercadoPagoConfig;
pub use error::MercadoPagoApiError;
