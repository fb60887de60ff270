use reqwest::Method;

use crate::{
    db_types::Customer,
    postgrest::PostgrestStore,
    traits::{CustomerLookup, StoreApiError},
};

impl CustomerLookup for PostgrestStore {
    async fn customer_by_id(&self, customer_id: i64) -> Result<Option<Customer>, StoreApiError> {
        let filter = format!("eq.{customer_id}");
        let rows: Vec<Customer> =
            self.rows(Method::GET, "customers", &[("id", &filter)], Option::<&()>::None, None).await?;
        Ok(rows.into_iter().next())
    }
}
