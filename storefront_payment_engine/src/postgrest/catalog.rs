use reqwest::Method;

use crate::{
    db_types::CatalogItem,
    postgrest::PostgrestStore,
    traits::{CatalogLookup, StoreApiError},
};

impl CatalogLookup for PostgrestStore {
    async fn catalog_item(&self, item_id: &str) -> Result<Option<CatalogItem>, StoreApiError> {
        let filter = format!("eq.{item_id}");
        let rows: Vec<CatalogItem> =
            self.rows(Method::GET, "catalog_items", &[("id", &filter)], Option::<&()>::None, None).await?;
        Ok(rows.into_iter().next())
    }
}
