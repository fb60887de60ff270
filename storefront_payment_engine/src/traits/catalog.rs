use crate::{db_types::CatalogItem, traits::StoreApiError};

/// Read access to the storefront catalog.
#[allow(async_fn_in_trait)]
pub trait CatalogLookup: Clone {
    /// Fetches a single catalog item by id. Returns `Ok(None)` if no such item exists.
    async fn catalog_item(&self, item_id: &str) -> Result<Option<CatalogItem>, StoreApiError>;
}
