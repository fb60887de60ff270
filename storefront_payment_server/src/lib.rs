//! # Storefront payment server
//!
//! The HTTP face of the payment-to-order reconciliation flow. The server exposes
//!
//! * `POST /payments/create` — open a checkout at the payment gateway and cache the pending intent,
//! * `POST /payments/webhook` — receive payment notifications from the gateway,
//! * `POST /payments/process-order` — manual fallback for confirming an intent when a webhook went missing,
//! * `GET  /payments/{payment_id}` — look up the canonical record of a payment,
//! * `GET  /payments/success|failure|pending` — checkout redirect landing points, and
//! * `GET  /health` — liveness probe.
//!
//! All business logic lives in `storefront_payment_engine`; this crate only does HTTP, configuration and wiring.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
