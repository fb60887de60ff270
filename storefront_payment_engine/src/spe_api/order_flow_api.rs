//! The payment reconciliation flow.
//!
//! `OrderFlowApi` is the one place where payment intents, gateway payments and orders meet. A reference moves
//! through exactly one of these paths:
//!
//! * intent created → payment approved → order created and marked paid → intent evicted,
//! * intent created → payment rejected → intent evicted, no order,
//! * intent created → nothing happens → intent expires, no order.
//!
//! Pending payments change nothing; the gateway will notify again when the payment settles.

use std::fmt::{Debug, Formatter};

use log::*;
use sps_common::Money;

use crate::{
    db_types::{ExternalRef, LineItem, OrderDetail, OrderStatusType, PendingIntent},
    events::{EventProducers, OrderPaidEvent},
    helpers::new_external_ref,
    intent_cache::PendingIntentCache,
    spe_api::{errors::OrderFlowError, orders_api::OrderApi},
    traits::{CatalogLookup, CheckoutPreference, CustomerLookup, NewPreference, OrderStore, PaymentGatewayClient, PaymentStatus},
};

/// Everything needed to open a checkout at the gateway and remember the basket it pays for.
#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
    pub customer_id: i64,
    pub line_items: Vec<LineItem>,
    /// Title shown on the gateway's checkout page.
    pub title: String,
    pub description: Option<String>,
    /// The price shown at the gateway. Order totals are re-derived from the catalog at confirmation time, so a
    /// stale price here cannot corrupt an order.
    pub unit_price: Money,
    pub quantity: i64,
    pub currency: String,
    /// Reference to reuse, e.g. when a customer retries a failed checkout. A fresh one is minted when absent.
    pub external_ref: Option<ExternalRef>,
    pub payer_email: Option<String>,
}

/// What a payment notification amounted to, once the canonical payment record was consulted.
#[derive(Debug, Clone)]
pub enum ReconciliationOutcome {
    /// The payment was approved and an order is now confirmed as paid.
    OrderPaid(OrderDetail),
    /// The payment was approved but no pending intent exists for its reference. Either the notification is a
    /// duplicate that lost the race, or the intent expired before payment.
    NoPendingIntent(ExternalRef),
    /// The payment was approved but its record carries no external reference, so there is nothing to match
    /// against.
    Unmatched(String),
    /// The payment was rejected. Any pending intent for the reference has been discarded.
    Rejected { external_ref: Option<ExternalRef> },
    /// The payment has not settled yet. Nothing changed; the gateway will notify again.
    StillPending(String),
    /// The payment status is one the flow does not act on.
    Ignored(String),
}

/// The reconciliation state machine. Generic over the storage backend and the gateway client.
pub struct OrderFlowApi<B, G> {
    orders: OrderApi<B>,
    gateway: G,
    cache: PendingIntentCache,
    producers: EventProducers,
}

impl<B: Debug, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.orders)
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: CatalogLookup + CustomerLookup + OrderStore,
    G: PaymentGatewayClient,
{
    pub fn new(db: B, gateway: G, cache: PendingIntentCache, producers: EventProducers) -> Self {
        Self { orders: OrderApi::new(db), gateway, cache, producers }
    }

    pub fn orders(&self) -> &OrderApi<B> {
        &self.orders
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn cache(&self) -> &PendingIntentCache {
        &self.cache
    }

    /// Opens a checkout at the gateway and caches the pending intent under its external reference.
    ///
    /// The intent is cached only after the gateway accepts the preference, so a failed gateway call leaves no
    /// state behind.
    pub async fn create_payment_intent(&self, request: NewPaymentIntent) -> Result<CheckoutPreference, OrderFlowError> {
        if request.line_items.is_empty() {
            return Err(OrderFlowError::InvalidIntent("A payment must cover at least one line item".to_string()));
        }
        if request.line_items.iter().any(|line| line.quantity <= 0) {
            return Err(OrderFlowError::InvalidIntent("Line item quantities must be positive".to_string()));
        }
        if request.quantity <= 0 {
            return Err(OrderFlowError::InvalidIntent("The payment quantity must be positive".to_string()));
        }
        let external_ref = request.external_ref.clone().unwrap_or_else(new_external_ref);
        let preference = NewPreference {
            title: request.title,
            description: request.description,
            unit_price: request.unit_price,
            quantity: request.quantity,
            currency: request.currency,
            external_ref: external_ref.clone(),
            payer_email: request.payer_email,
        };
        let checkout = self.gateway.create_preference(preference).await?;
        debug!("🔄️💰️ Checkout {} opened at the gateway for reference {external_ref}", checkout.preference_id);
        let intent = PendingIntent::new(external_ref.clone(), request.customer_id, request.line_items);
        self.cache.put(intent);
        info!("🔄️💰️ Pending intent cached under reference {external_ref}");
        Ok(checkout)
    }

    /// Handles a payment notification from the gateway.
    ///
    /// The notification body is never trusted. The canonical payment record is fetched from the gateway first,
    /// and only its status and reference drive the state machine.
    pub async fn process_payment_notification(
        &self,
        payment_id: &str,
    ) -> Result<ReconciliationOutcome, OrderFlowError> {
        let record = self.gateway.payment_by_id(payment_id).await?;
        debug!(
            "🔄️💰️ The gateway reports payment {payment_id} as '{}' (reference: {})",
            record.status,
            record.external_ref.as_ref().map(|r| r.as_str()).unwrap_or("none"),
        );
        match record.status {
            PaymentStatus::Approved => {
                let Some(external_ref) = record.external_ref else {
                    warn!("🔄️💰️ Payment {payment_id} is approved but carries no reference. Nothing to reconcile.");
                    return Ok(ReconciliationOutcome::Unmatched(payment_id.to_string()));
                };
                match self.confirm_reference(&external_ref).await? {
                    Some(detail) => Ok(ReconciliationOutcome::OrderPaid(detail)),
                    None => {
                        info!(
                            "🔄️💰️ No pending intent for reference {external_ref}. The payment was either already \
                             processed or its intent expired."
                        );
                        Ok(ReconciliationOutcome::NoPendingIntent(external_ref))
                    },
                }
            },
            PaymentStatus::Rejected => {
                if let Some(external_ref) = &record.external_ref {
                    if self.cache.remove(external_ref).is_some() {
                        info!("🔄️💰️ Payment {payment_id} was rejected. Intent for reference {external_ref} discarded.");
                    }
                }
                Ok(ReconciliationOutcome::Rejected { external_ref: record.external_ref })
            },
            PaymentStatus::Pending => {
                info!("🔄️💰️ Payment {payment_id} has not settled yet. Waiting for the next notification.");
                Ok(ReconciliationOutcome::StillPending(payment_id.to_string()))
            },
            PaymentStatus::Other(status) => {
                info!("🔄️💰️ Payment {payment_id} has status '{status}', which this flow does not act on.");
                Ok(ReconciliationOutcome::Ignored(status))
            },
        }
    }

    /// Manual fallback: confirms the intent for `external_ref` directly, without consulting the gateway. Used by
    /// trusted server-side callers when a webhook went missing. Errors with
    /// [`OrderFlowError::IntentNotFound`] when no intent is cached for the reference.
    pub async fn process_order_for_reference(&self, external_ref: &ExternalRef) -> Result<OrderDetail, OrderFlowError> {
        info!("🔄️📦️ Manual order processing requested for reference {external_ref}");
        match self.confirm_reference(external_ref).await? {
            Some(detail) => Ok(detail),
            None => Err(OrderFlowError::IntentNotFound(external_ref.clone())),
        }
    }

    /// Turns the pending intent for `external_ref` into a paid order, then evicts the intent. Returns `Ok(None)`
    /// when no intent is cached for the reference.
    ///
    /// Runs under the per-reference confirmation lock, so duplicate notifications for one reference execute one
    /// at a time; the loser of the race finds the cache empty and does nothing. Should the process die between
    /// creating the order and evicting the intent, the retry is still safe: order creation is idempotent on the
    /// reference, and the leftover order is simply marked paid again.
    async fn confirm_reference(&self, external_ref: &ExternalRef) -> Result<Option<OrderDetail>, OrderFlowError> {
        let _guard = self.cache.lock_ref(external_ref).await;
        let Some(intent) = self.cache.get(external_ref) else {
            return Ok(None);
        };
        let (mut detail, created) =
            self.orders.create_order(intent.customer_id, &intent.line_items, Some(external_ref.clone())).await?;
        if !created {
            debug!("🔄️📦️ Order #{} for reference {external_ref} already existed. Finishing its confirmation.", detail.id);
        }
        let updated = self.orders.db().update_order_status(detail.id, OrderStatusType::Paid).await?;
        detail.status = updated.status;
        self.cache.remove(external_ref);
        info!("🔄️📦️ Order #{} is confirmed as paid for reference {external_ref} 🎉", detail.id);
        self.call_order_paid_hook(&detail).await;
        Ok(Some(detail))
    }

    async fn call_order_paid_hook(&self, order: &OrderDetail) {
        for producer in &self.producers.order_paid {
            trace!("🔄️📬️ Notifying order-paid subscribers about order #{}", order.id);
            producer.publish_event(OrderPaidEvent::new(order.clone())).await;
        }
    }
}
