use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use storefront_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    intent_cache::PendingIntentCache,
    traits::{PaymentGatewayClient, StorefrontStore},
    OrderFlowApi,
    PostgrestStore,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::mercado::MercadoGateway,
    routes::{
        health,
        payment_failure,
        payment_pending,
        payment_success,
        CreatePaymentRoute,
        PaymentInfoRoute,
        PaymentWebhookRoute,
        ProcessOrderRoute,
    },
};

/// Builds the production stack (PostgREST store, Mercado Pago gateway, order-paid hooks), starts the expiry
/// worker and runs the server until it is shut down.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let store = PostgrestStore::new(config.store.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway =
        MercadoGateway::new(config.gateway.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let cache = PendingIntentCache::new(config.intent_ttl);
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|event| {
        Box::pin(async move {
            info!(
                "📬️ Order #{} for customer {} is paid ({}). Fulfillment can begin.",
                event.order.id,
                event.order.customer_name.as_deref().unwrap_or("unknown"),
                event.order.total,
            );
        })
    });
    let handlers = EventHandlers::new(32, hooks);
    let producers = handlers.producers();
    handlers.start();
    start_expiry_worker(cache.clone());
    let server = create_server_instance(config, store, gateway, cache, producers)?;
    server.await.map_err(ServerError::from)
}

/// Creates the actix server instance. Split from [`run_server`] so tests and tooling can run the full routing
/// table against alternative backends.
pub fn create_server_instance<B, G>(
    config: ServerConfig,
    store: B,
    gateway: G,
    cache: PendingIntentCache,
    producers: EventProducers,
) -> Result<Server, ServerError>
where
    B: StorefrontStore + Send + Sync + 'static,
    G: PaymentGatewayClient + Send + Sync + 'static,
{
    let webhook_options = config.webhook.clone();
    let srv = HttpServer::new(move || {
        let api = OrderFlowApi::new(store.clone(), gateway.clone(), cache.clone(), producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(webhook_options.clone()))
            .service(health)
            // the literal /payments/* paths must be registered before the {payment_id} resource
            .service(payment_success)
            .service(payment_failure)
            .service(payment_pending)
            .service(CreatePaymentRoute::<B, G>::new())
            .service(PaymentWebhookRoute::<B, G>::new())
            .service(ProcessOrderRoute::<B, G>::new())
            .service(PaymentInfoRoute::<B, G>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("💻️ Server bound to {}:{}", config.host, config.port);
    Ok(srv)
}
