//! # Storefront payment engine
//!
//! The business logic for turning gateway payments into storefront orders. The engine is agnostic about both the
//! storage backend and the payment gateway; it talks to them through the seams defined in [`traits`], so the same
//! reconciliation logic runs against the production PostgREST data API and against in-memory doubles in tests.
//!
//! The main entry points are
//! * [`OrderFlowApi`], the reconciliation state machine that pairs gateway payment notifications with pending
//!   payment intents and produces paid orders, and
//! * [`OrderApi`], the order aggregator that prices line items against the catalog and writes order records.
//!
//! Pending intents live in the [`intent_cache::PendingIntentCache`] until a payment settles or the intent is
//! abandoned and expires.

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod intent_cache;
mod spe_api;
pub mod traits;

#[cfg(feature = "postgrest")]
mod postgrest;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

#[cfg(feature = "postgrest")]
pub use postgrest::{PostgrestStore, StoreConfig};
pub use spe_api::{
    errors::{OrderApiError, OrderFlowError},
    order_flow_api::{NewPaymentIntent, OrderFlowApi, ReconciliationOutcome},
    orders_api::OrderApi,
};
