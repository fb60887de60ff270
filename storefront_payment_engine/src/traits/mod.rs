//! The seams between the engine and the outside world.
//!
//! The engine never talks to a database or a payment gateway directly. It goes through the traits in this module,
//! so the concrete backends (the PostgREST data API, the Mercado Pago client) can be swapped for in-memory doubles
//! in tests without touching the reconciliation logic.
//!
//! * [`CatalogLookup`], [`CustomerLookup`] and [`OrderStore`] cover the storage concerns. [`StorefrontStore`] is a
//!   blanket umbrella over all three for code that needs the whole store.
//! * [`PaymentGatewayClient`] covers the payment gateway.

mod catalog;
mod customers;
mod orders;
mod payment_gateway;

use thiserror::Error;

pub use catalog::CatalogLookup;
pub use customers::CustomerLookup;
pub use orders::OrderStore;
pub use payment_gateway::{
    CheckoutPreference,
    GatewayClientError,
    GatewayPaymentRecord,
    NewPreference,
    PaymentGatewayClient,
    PaymentStatus,
};

/// Errors the storage backend can produce. Backends translate their native failures into this taxonomy so the
/// engine can treat "the store said no" and "the store is unreachable" differently.
#[derive(Debug, Clone, Error)]
pub enum StoreApiError {
    #[error("Could not initialize the data store client. {0}")]
    Initialization(String),
    #[error("The data store rejected the query ({status}): {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not reach the data store. {0}")]
    Network(String),
    #[error("Could not interpret the data store response. {0}")]
    ResponseFormat(String),
}

/// Umbrella over the three storage seams, for code that is generic over the whole store.
pub trait StorefrontStore: CatalogLookup + CustomerLookup + OrderStore {}

impl<T> StorefrontStore for T where T: CatalogLookup + CustomerLookup + OrderStore {}
