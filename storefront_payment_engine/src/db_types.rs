//! The data types stored in, or derived from, the storefront database.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sps_common::Money;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Cannot convert {0} into the requested type")]
pub struct ConversionError(String);

/// The reference that links a checkout preference at the payment gateway back to a pending intent on our side.
/// We mint it when the intent is created, hand it to the gateway, and the gateway echoes it back in payment
/// records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalRef(String);

impl ExternalRef {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExternalRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ExternalRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for ExternalRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The lifecycle status of an order.
///
/// Orders are created as `Pending`, move to `Paid` once the gateway confirms the payment, and to `Cancelled` if
/// the storefront abandons them. There are no other transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    Pending,
    Paid,
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "PENDING"),
            OrderStatusType::Paid => write!(f, "PAID"),
            OrderStatusType::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl std::str::FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatusType::Pending),
            "PAID" => Ok(OrderStatusType::Paid),
            "CANCELLED" => Ok(OrderStatusType::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|e| {
            error!("{e}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

/// One line of a shopping basket: a catalog item id and how many of it the customer wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: String,
    pub quantity: i64,
}

impl LineItem {
    pub fn new<S: Into<String>>(item_id: S, quantity: i64) -> Self {
        Self { item_id: item_id.into(), quantity }
    }
}

/// A basket that is waiting for its payment to settle at the gateway. No order exists yet; the intent holds
/// everything needed to create one the moment an approved payment arrives carrying the matching
/// [`ExternalRef`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingIntent {
    pub external_ref: ExternalRef,
    pub customer_id: i64,
    pub line_items: Vec<LineItem>,
}

impl PendingIntent {
    pub fn new(external_ref: ExternalRef, customer_id: i64, line_items: Vec<LineItem>) -> Self {
        Self { external_ref, customer_id, line_items }
    }
}

/// An order record as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub total: Money,
    pub status: OrderStatusType,
    #[serde(default)]
    pub external_ref: Option<ExternalRef>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A new order record, ready for insertion.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub customer_id: i64,
    pub total: Money,
    pub status: OrderStatusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<ExternalRef>,
}

impl NewOrder {
    pub fn new(customer_id: i64, total: Money) -> Self {
        Self { customer_id, total, status: OrderStatusType::Pending, external_ref: None }
    }

    pub fn with_external_ref(mut self, external_ref: ExternalRef) -> Self {
        self.external_ref = Some(external_ref);
        self
    }
}

/// A single order line as stored in the database. `price` is the unit price that was current when the order was
/// created; later catalog price changes do not touch existing orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub item_id: String,
    pub quantity: i64,
    pub price: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOrderItem {
    pub order_id: i64,
    pub item_id: String,
    pub quantity: i64,
    pub price: Money,
}

/// A product in the storefront catalog. Catalog rows are maintained by the storefront admin tooling and can be
/// sparse, so everything except the id is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// An order line decorated with catalog metadata for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemDetail {
    pub id: i64,
    pub item_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    pub quantity: i64,
    pub price: Money,
}

/// An order together with its lines and customer metadata, as returned to API clients and event subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: i64,
    pub customer_id: i64,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub total: Money,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemDetail>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_status_round_trip() {
        for status in [OrderStatusType::Pending, OrderStatusType::Paid, OrderStatusType::Cancelled] {
            let s = status.to_string();
            assert_eq!(s.parse::<OrderStatusType>().unwrap(), status);
        }
        assert!("SHIPPED".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn order_status_serde_uses_screaming_snake() {
        let json = serde_json::to_string(&OrderStatusType::Paid).unwrap();
        assert_eq!(json, "\"PAID\"");
        let status: OrderStatusType = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(status, OrderStatusType::Cancelled);
    }

    #[test]
    fn new_order_builder() {
        let order = NewOrder::new(42, Money::from(1500)).with_external_ref(ExternalRef::new("sps-abc"));
        assert_eq!(order.status, OrderStatusType::Pending);
        assert_eq!(order.external_ref, Some(ExternalRef::new("sps-abc")));
    }
}
