use crate::{
    db_types::{ExternalRef, NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType},
    traits::StoreApiError,
};

/// Write and read access to order records.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// Inserts a new order record.
    ///
    /// When the order carries an external reference, the insert is create-if-absent on that reference: if an
    /// order with the same reference already exists, no new row is written and the existing order is returned
    /// instead. The boolean in the result is `true` when a row was actually inserted.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), StoreApiError>;

    /// Inserts a single order line.
    async fn insert_order_item(&self, item: NewOrderItem) -> Result<OrderItem, StoreApiError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, StoreApiError>;

    async fn fetch_order_by_external_ref(&self, external_ref: &ExternalRef) -> Result<Option<Order>, StoreApiError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, StoreApiError>;

    /// Sets the status of an order and returns the updated record. It is an error
    /// (`StoreApiError::QueryError` with status 404) if the order does not exist.
    async fn update_order_status(&self, order_id: i64, status: OrderStatusType) -> Result<Order, StoreApiError>;

    /// Deletes an order and all of its lines. Deleting an order that does not exist is not an error.
    async fn delete_order(&self, order_id: i64) -> Result<(), StoreApiError>;
}
