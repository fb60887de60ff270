//! The order aggregator.

use std::fmt::{Debug, Formatter};

use futures_util::future::try_join_all;
use log::*;
use sps_common::Money;

use crate::{
    db_types::{
        CatalogItem,
        ExternalRef,
        LineItem,
        NewOrder,
        NewOrderItem,
        Order,
        OrderDetail,
        OrderItem,
        OrderItemDetail,
    },
    spe_api::errors::OrderApiError,
    traits::{CatalogLookup, CustomerLookup, OrderStore},
};

/// Prices baskets against the catalog and writes order records.
///
/// `create_order` is all-or-nothing: every line item is validated and priced before anything is written, and if a
/// line item insert fails after the order header has been written, the header is deleted again so the store never
/// holds a half-written order.
pub struct OrderApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi ({:?})", self.db)
    }
}

struct PricedLine {
    line: LineItem,
    price: Money,
    name: Option<String>,
    poster: Option<String>,
}

impl<B> OrderApi<B>
where B: CatalogLookup + CustomerLookup + OrderStore
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Creates a pending order for `customer_id` from the given basket.
    ///
    /// Prices are resolved from the catalog at this moment; the order total is the sum of `unit price × quantity`
    /// over the lines, in basket order.
    ///
    /// When `external_ref` is given, creation is idempotent on that reference: if an order for the reference
    /// already exists, it is returned as-is and nothing new is written. The boolean in the result is `true` when
    /// a new order was actually created.
    pub async fn create_order(
        &self,
        customer_id: i64,
        line_items: &[LineItem],
        external_ref: Option<ExternalRef>,
    ) -> Result<(OrderDetail, bool), OrderApiError> {
        if line_items.is_empty() {
            return Err(OrderApiError::EmptyOrder);
        }
        if line_items.iter().any(|line| line.quantity <= 0) {
            return Err(OrderApiError::InvalidQuantity);
        }
        // Resolve every price before writing anything. The lookups run concurrently but the results come back in
        // basket order, so the total is deterministic.
        let priced = try_join_all(line_items.iter().map(|line| self.price_line(line))).await?;
        let total: Money = priced.iter().map(|p| p.price * p.line.quantity).sum();
        let mut order = NewOrder::new(customer_id, total);
        if let Some(external_ref) = external_ref.clone() {
            order = order.with_external_ref(external_ref);
        }
        let (order, inserted) = self.db.insert_order(order).await?;
        if !inserted {
            debug!(
                "📝️ An order for reference {} already exists as order #{}. Not creating another one.",
                external_ref.as_ref().map(|r| r.as_str()).unwrap_or_default(),
                order.id
            );
            let detail = self.order_detail(order).await?;
            return Ok((detail, false));
        }
        debug!("📝️ Order #{} created for customer {customer_id}, total {total}", order.id);
        let mut items = Vec::with_capacity(priced.len());
        for p in priced {
            let new_item = NewOrderItem {
                order_id: order.id,
                item_id: p.line.item_id.clone(),
                quantity: p.line.quantity,
                price: p.price,
            };
            match self.db.insert_order_item(new_item).await {
                Ok(item) => items.push(OrderItemDetail {
                    id: item.id,
                    item_id: item.item_id,
                    name: p.name,
                    poster: p.poster,
                    quantity: item.quantity,
                    price: item.price,
                }),
                Err(e) => {
                    warn!("📝️ Could not write a line item for order #{}. Rolling the order back. {e}", order.id);
                    if let Err(del_err) = self.db.delete_order(order.id).await {
                        error!("📝️ Order #{} could not be rolled back and is now inconsistent! {del_err}", order.id);
                    }
                    return Err(OrderApiError::RolledBack(order.id, e));
                },
            }
        }
        let customer_name = self.db.customer_by_id(customer_id).await?.map(|c| c.name);
        let detail = OrderDetail {
            id: order.id,
            customer_id: order.customer_id,
            customer_name,
            total: order.total,
            status: order.status,
            created_at: order.created_at,
            items,
        };
        Ok((detail, true))
    }

    /// Loads an order's lines and metadata for presentation.
    pub async fn order_detail(&self, order: Order) -> Result<OrderDetail, OrderApiError> {
        let items = self.db.fetch_order_items(order.id).await?;
        let catalog: Vec<Option<CatalogItem>> =
            try_join_all(items.iter().map(|item| self.db.catalog_item(&item.item_id))).await?;
        let items = items
            .into_iter()
            .zip(catalog)
            .map(|(item, meta): (OrderItem, Option<CatalogItem>)| {
                let (name, poster) = meta.map(|m| (m.name, m.poster)).unwrap_or_default();
                OrderItemDetail { id: item.id, item_id: item.item_id, name, poster, quantity: item.quantity, price: item.price }
            })
            .collect();
        let customer_name = self.db.customer_by_id(order.customer_id).await?.map(|c| c.name);
        Ok(OrderDetail {
            id: order.id,
            customer_id: order.customer_id,
            customer_name,
            total: order.total,
            status: order.status,
            created_at: order.created_at,
            items,
        })
    }

    async fn price_line(&self, line: &LineItem) -> Result<PricedLine, OrderApiError> {
        let item = self
            .db
            .catalog_item(&line.item_id)
            .await?
            .ok_or_else(|| OrderApiError::ItemNotFound(line.item_id.clone()))?;
        let price = item.price.ok_or_else(|| OrderApiError::ItemNotPriced(item.id.clone()))?;
        Ok(PricedLine { line: line.clone(), price, name: item.name, poster: item.poster })
    }
}
