use crate::{db_types::Customer, traits::StoreApiError};

/// Read access to customer records.
#[allow(async_fn_in_trait)]
pub trait CustomerLookup: Clone {
    /// Fetches a customer by id. Returns `Ok(None)` if no such customer exists.
    async fn customer_by_id(&self, customer_id: i64) -> Result<Option<Customer>, StoreApiError>;
}
