//! An asynchronous pub-sub mechanism for order lifecycle events.
//!
//! The server defines hooks at startup via [`EventHooks`], turns them into running handler tasks with
//! [`EventHandlers`], and hands the matching [`EventProducers`] to the [`OrderFlowApi`](crate::OrderFlowApi),
//! which fires events as orders move through the reconciliation flow. Handlers run on their own tasks, so a slow
//! subscriber never blocks payment processing.

use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::sync::mpsc;

use crate::db_types::OrderDetail;

/// Fired when an order has been confirmed as paid. Fulfillment hangs off this event.
#[derive(Debug, Clone)]
pub struct OrderPaidEvent {
    pub order: OrderDetail,
}

impl OrderPaidEvent {
    pub fn new(order: OrderDetail) -> Self {
        Self { order }
    }
}

/// The signature of an event hook.
pub type EventHook<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// A running consumer for events of type `E`. Create one per hook, [`subscribe`](EventHandler::subscribe) as many
/// producers as needed, then hand the handler to a task via [`start`](EventHandler::start).
pub struct EventHandler<E: Send + 'static> {
    receiver: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    hook: EventHook<E>,
}

impl<E: Send + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, hook: EventHook<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { receiver, sender, hook }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer { sender: self.sender.clone() }
    }

    /// Consumes events until every producer has been dropped. Each event is dispatched on its own task.
    pub async fn start(mut self) {
        drop(self.sender);
        while let Some(event) = self.receiver.recv().await {
            let hook = Arc::clone(&self.hook);
            tokio::spawn(async move { hook(event).await });
        }
        debug!("📬️ All producers dropped. Event handler shutting down.");
    }
}

/// The publishing side of an event channel. Cheap to clone.
#[derive(Clone)]
pub struct EventProducer<E: Send> {
    sender: mpsc::Sender<E>,
}

impl<E: Send> EventProducer<E> {
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Could not publish event. The handler has shut down. {e}");
        }
    }
}

/// The hooks the server wants to run for each event type. All hooks are optional.
#[derive(Clone, Default)]
pub struct EventHooks {
    pub on_order_paid: Option<EventHook<OrderPaidEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, hook: F) -> &mut Self
    where F: Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(hook));
        self
    }
}

/// The producers matching a set of started handlers. The flow API holds a set of these and fires every producer
/// in it when the corresponding event happens. An empty set is valid and silently does nothing, which is what
/// tests usually want.
#[derive(Clone, Default)]
pub struct EventProducers {
    pub order_paid: Vec<EventProducer<OrderPaidEvent>>,
}

/// Bundles the handlers built from a set of [`EventHooks`].
#[derive(Default)]
pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_paid = hooks.on_order_paid.map(|hook| EventHandler::new(buffer_size, hook));
        Self { on_order_paid }
    }

    pub fn producers(&self) -> EventProducers {
        let mut producers = EventProducers::default();
        if let Some(handler) = &self.on_order_paid {
            producers.order_paid.push(handler.subscribe());
        }
        producers
    }

    /// Spawns a consuming task for each configured handler.
    pub fn start(self) {
        if let Some(handler) = self.on_order_paid {
            info!("📬️ Starting handler for order-paid events");
            tokio::spawn(handler.start());
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use chrono::Utc;
    use sps_common::Money;

    use super::*;
    use crate::db_types::{OrderDetail, OrderStatusType};

    fn order(id: i64) -> OrderDetail {
        OrderDetail {
            id,
            customer_id: 1,
            customer_name: None,
            total: Money::from(100),
            status: OrderStatusType::Paid,
            created_at: Utc::now(),
            items: vec![],
        }
    }

    #[tokio::test]
    async fn hooks_receive_published_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::clone(&count);
        let mut hooks = EventHooks::default();
        hooks.on_order_paid(move |event: OrderPaidEvent| {
            let count = Arc::clone(&count2);
            Box::pin(async move {
                assert_eq!(event.order.status, OrderStatusType::Paid);
                count.fetch_add(1, Ordering::SeqCst);
            })
        });
        let handlers = EventHandlers::new(8, hooks);
        let producers = handlers.producers();
        let consumer = tokio::spawn(async move {
            if let Some(handler) = handlers.on_order_paid {
                handler.start().await;
            }
        });
        for i in 0..3 {
            for producer in &producers.order_paid {
                producer.publish_event(OrderPaidEvent::new(order(i))).await;
            }
        }
        drop(producers);
        consumer.await.unwrap();
        // dispatch tasks may still be in flight just after shutdown
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
