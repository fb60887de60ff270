use log::*;
use reqwest::Method;

use crate::{
    db_types::{ExternalRef, NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType},
    postgrest::PostgrestStore,
    traits::{OrderStore, StoreApiError},
};

impl OrderStore for PostgrestStore {
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), StoreApiError> {
        // With ignore-duplicates, PostgREST answers an insert that hits the unique external_ref constraint with
        // an empty representation instead of an error, so "the row already existed" is an ordinary result.
        if let Some(external_ref) = order.external_ref.clone() {
            let rows: Vec<Order> = self
                .rows(
                    Method::POST,
                    "orders",
                    &[("on_conflict", "external_ref")],
                    Some(&order),
                    Some("return=representation,resolution=ignore-duplicates"),
                )
                .await?;
            match rows.into_iter().next() {
                Some(order) => {
                    debug!("📝️ Order #{} inserted for reference {external_ref}", order.id);
                    Ok((order, true))
                },
                None => {
                    let existing = self.fetch_order_by_external_ref(&external_ref).await?.ok_or_else(|| {
                        StoreApiError::ResponseFormat(format!(
                            "The insert for reference {external_ref} was skipped as a duplicate, but no existing \
                             order was found"
                        ))
                    })?;
                    debug!("📝️ Order for reference {external_ref} already exists as #{}", existing.id);
                    Ok((existing, false))
                },
            }
        } else {
            let rows: Vec<Order> =
                self.rows(Method::POST, "orders", &[], Some(&order), Some("return=representation")).await?;
            let order = rows
                .into_iter()
                .next()
                .ok_or_else(|| StoreApiError::ResponseFormat("The insert returned no representation".to_string()))?;
            debug!("📝️ Order #{} inserted", order.id);
            Ok((order, true))
        }
    }

    async fn insert_order_item(&self, item: NewOrderItem) -> Result<OrderItem, StoreApiError> {
        let rows: Vec<OrderItem> =
            self.rows(Method::POST, "order_items", &[], Some(&item), Some("return=representation")).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreApiError::ResponseFormat("The insert returned no representation".to_string()))
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, StoreApiError> {
        let filter = format!("eq.{order_id}");
        let rows: Vec<Order> = self.rows(Method::GET, "orders", &[("id", &filter)], Option::<&()>::None, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_order_by_external_ref(&self, external_ref: &ExternalRef) -> Result<Option<Order>, StoreApiError> {
        let filter = format!("eq.{external_ref}");
        let rows: Vec<Order> =
            self.rows(Method::GET, "orders", &[("external_ref", &filter)], Option::<&()>::None, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, StoreApiError> {
        let filter = format!("eq.{order_id}");
        self.rows(Method::GET, "order_items", &[("order_id", &filter)], Option::<&()>::None, None).await
    }

    async fn update_order_status(&self, order_id: i64, status: OrderStatusType) -> Result<Order, StoreApiError> {
        let filter = format!("eq.{order_id}");
        let patch = serde_json::json!({ "status": status });
        let rows: Vec<Order> = self
            .rows(Method::PATCH, "orders", &[("id", &filter)], Some(&patch), Some("return=representation"))
            .await?;
        rows.into_iter().next().ok_or_else(|| StoreApiError::QueryError {
            status: 404,
            message: format!("no order with id {order_id}"),
        })
    }

    async fn delete_order(&self, order_id: i64) -> Result<(), StoreApiError> {
        let filter = format!("eq.{order_id}");
        // lines first, then the header, so a failure in between cannot orphan any lines
        self.execute(Method::DELETE, "order_items", &[("order_id", &filter)]).await?;
        self.execute(Method::DELETE, "orders", &[("id", &filter)]).await?;
        debug!("📝️ Order #{order_id} and its lines were deleted");
        Ok(())
    }
}
