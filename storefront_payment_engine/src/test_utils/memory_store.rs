use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::Utc;
use sps_common::Money;

use crate::{
    db_types::{CatalogItem, Customer, ExternalRef, NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType},
    traits::{CatalogLookup, CustomerLookup, OrderStore, StoreApiError},
};

#[derive(Default)]
struct MemoryStoreInner {
    catalog: HashMap<String, CatalogItem>,
    customers: HashMap<i64, Customer>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    next_order_id: i64,
    next_item_id: i64,
    item_insert_count: usize,
    item_inserts_before_failure: Option<usize>,
}

/// An in-memory implementation of the storage seams, with a failure-injection knob for exercising the rollback
/// path.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_catalog_item(&self, id: &str, name: &str, price: i64) {
        let item = CatalogItem {
            id: id.to_string(),
            name: Some(name.to_string()),
            price: Some(Money::from(price)),
            stock: Some(100),
            description: None,
            poster: None,
        };
        self.inner.lock().unwrap().catalog.insert(id.to_string(), item);
    }

    /// Adds a catalog item without a price, which cannot be ordered.
    pub fn add_unpriced_item(&self, id: &str, name: &str) {
        let item = CatalogItem { id: id.to_string(), name: Some(name.to_string()), ..Default::default() };
        self.inner.lock().unwrap().catalog.insert(id.to_string(), item);
    }

    pub fn add_customer(&self, id: i64, name: &str, email: &str) {
        let customer = Customer { id, name: name.to_string(), email: email.to_string() };
        self.inner.lock().unwrap().customers.insert(id, customer);
    }

    /// After `n` successful line-item inserts, every further insert fails.
    pub fn fail_item_inserts_after(&self, n: usize) {
        self.inner.lock().unwrap().item_inserts_before_failure = Some(n);
    }

    pub fn orders(&self) -> Vec<Order> {
        self.inner.lock().unwrap().orders.clone()
    }

    pub fn order_count(&self) -> usize {
        self.inner.lock().unwrap().orders.len()
    }

    pub fn items_for_order(&self, order_id: i64) -> Vec<OrderItem> {
        self.inner.lock().unwrap().order_items.iter().filter(|i| i.order_id == order_id).cloned().collect()
    }
}

impl CatalogLookup for MemoryStore {
    async fn catalog_item(&self, item_id: &str) -> Result<Option<CatalogItem>, StoreApiError> {
        Ok(self.inner.lock().unwrap().catalog.get(item_id).cloned())
    }
}

impl CustomerLookup for MemoryStore {
    async fn customer_by_id(&self, customer_id: i64) -> Result<Option<Customer>, StoreApiError> {
        Ok(self.inner.lock().unwrap().customers.get(&customer_id).cloned())
    }
}

impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), StoreApiError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(external_ref) = &order.external_ref {
            if let Some(existing) = inner.orders.iter().find(|o| o.external_ref.as_ref() == Some(external_ref)) {
                return Ok((existing.clone(), false));
            }
        }
        inner.next_order_id += 1;
        let record = Order {
            id: inner.next_order_id,
            customer_id: order.customer_id,
            total: order.total,
            status: order.status,
            external_ref: order.external_ref,
            created_at: Utc::now(),
            updated_at: None,
        };
        inner.orders.push(record.clone());
        Ok((record, true))
    }

    async fn insert_order_item(&self, item: NewOrderItem) -> Result<OrderItem, StoreApiError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(limit) = inner.item_inserts_before_failure {
            if inner.item_insert_count >= limit {
                return Err(StoreApiError::QueryError { status: 500, message: "injected line item failure".to_string() });
            }
        }
        inner.item_insert_count += 1;
        inner.next_item_id += 1;
        let record = OrderItem {
            id: inner.next_item_id,
            order_id: item.order_id,
            item_id: item.item_id,
            quantity: item.quantity,
            price: item.price,
        };
        inner.order_items.push(record.clone());
        Ok(record)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, StoreApiError> {
        Ok(self.inner.lock().unwrap().orders.iter().find(|o| o.id == order_id).cloned())
    }

    async fn fetch_order_by_external_ref(&self, external_ref: &ExternalRef) -> Result<Option<Order>, StoreApiError> {
        Ok(self.inner.lock().unwrap().orders.iter().find(|o| o.external_ref.as_ref() == Some(external_ref)).cloned())
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, StoreApiError> {
        Ok(self.items_for_order(order_id))
    }

    async fn update_order_status(&self, order_id: i64, status: OrderStatusType) -> Result<Order, StoreApiError> {
        let mut inner = self.inner.lock().unwrap();
        let order = inner
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| StoreApiError::QueryError { status: 404, message: format!("no order with id {order_id}") })?;
        order.status = status;
        order.updated_at = Some(Utc::now());
        Ok(order.clone())
    }

    async fn delete_order(&self, order_id: i64) -> Result<(), StoreApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.order_items.retain(|i| i.order_id != order_id);
        inner.orders.retain(|o| o.id != order_id);
        Ok(())
    }
}
