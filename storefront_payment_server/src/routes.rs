//! Request handlers.
//!
//! Most handlers are generic over the storage backend and the gateway client, so the same handler code runs
//! against the production stack and against in-memory doubles in tests. Since actix's routing attributes do not
//! support generic handlers, the [`route!`] macro generates a small service factory struct per handler
//! (`create_payment` becomes `CreatePaymentRoute<B, G>`) that `server.rs` registers with concrete types.

use actix_web::{get, http::StatusCode, web, HttpRequest, HttpResponse, Responder};
use log::*;
use paste::paste;
use serde::Deserialize;
use serde_json::json;
use sps_common::Money;
use storefront_payment_engine::{
    db_types::ExternalRef,
    traits::{GatewayClientError, PaymentGatewayClient, StorefrontStore},
    NewPaymentIntent,
    OrderFlowApi,
    OrderFlowError,
    ReconciliationOutcome,
};

use crate::{
    config::WebhookOptions,
    data_objects::{
        JsonResponse,
        PaymentInfo,
        PaymentRequest,
        PaymentResponse,
        ProcessOrderParams,
        WebhookNotification,
        WebhookParams,
    },
    errors::ServerError,
    helpers::verify_webhook_signature,
};

/// Generates a service factory for a handler that is generic over one or more of the engine's seams, since
/// `#[get(...)]`-style attributes cannot register generic functions. One type parameter is generated per listed
/// trait, named `T<Trait>`.
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste! {
            pub struct [<$name:camel Route>]<$([<T $bounds>]),+> {
                _data: std::marker::PhantomData<($([<T $bounds>]),+,)>,
            }

            impl<$([<T $bounds>]),+> [<$name:camel Route>]<$([<T $bounds>]),+> {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self {
                    Self { _data: std::marker::PhantomData }
                }
            }

            impl<$([<T $bounds>]),+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds>]),+>
            where $([<T $bounds>]: $bounds + 'static),+
            {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name::<$([<T $bounds>]),+>);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };
}

//----------------------------------------------   Health  ----------------------------------------------------

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  --------------------------------------------------

route!(create_payment => Post "/payments/create" impl StorefrontStore, PaymentGatewayClient);
/// Opens a checkout at the payment gateway for the given basket and returns the URL to send the customer to.
pub async fn create_payment<TStorefrontStore, TPaymentGatewayClient>(
    body: web::Json<PaymentRequest>,
    api: web::Data<OrderFlowApi<TStorefrontStore, TPaymentGatewayClient>>,
) -> Result<HttpResponse, ServerError>
where
    TStorefrontStore: StorefrontStore,
    TPaymentGatewayClient: PaymentGatewayClient,
{
    let request = body.into_inner();
    debug!("💻️ POST payment creation for customer {}", request.customer_id);
    let intent = to_payment_intent(request)?;
    let checkout = api.create_payment_intent(intent).await?;
    Ok(HttpResponse::Ok().json(PaymentResponse {
        id: checkout.preference_id,
        init_point: checkout.checkout_url,
        sandbox_init_point: checkout.sandbox_checkout_url,
    }))
}

fn to_payment_intent(request: PaymentRequest) -> Result<NewPaymentIntent, ServerError> {
    let unit_price = request
        .price
        .parse::<Money>()
        .map_err(|e| ServerError::InvalidRequestBody(format!("'{}' is not a valid price. {e}", request.price)))?;
    Ok(NewPaymentIntent {
        customer_id: request.customer_id,
        line_items: request.items.into_iter().map(Into::into).collect(),
        title: request.title,
        description: request.description,
        unit_price,
        quantity: request.quantity,
        currency: request.currency_id,
        external_ref: request.external_reference.map(ExternalRef::from),
        payer_email: request.payer_email,
    })
}

//----------------------------------------------   Payment info  ----------------------------------------------

route!(payment_info => Get "/payments/{payment_id}" impl StorefrontStore, PaymentGatewayClient);
/// Fetches the canonical record of a payment from the gateway.
pub async fn payment_info<TStorefrontStore, TPaymentGatewayClient>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<TStorefrontStore, TPaymentGatewayClient>>,
) -> Result<HttpResponse, ServerError>
where
    TStorefrontStore: StorefrontStore,
    TPaymentGatewayClient: PaymentGatewayClient,
{
    let payment_id = path.into_inner();
    debug!("💻️ GET payment info for {payment_id}");
    let record = api.gateway().payment_by_id(&payment_id).await?;
    Ok(HttpResponse::Ok().json(PaymentInfo::from(record)))
}

//----------------------------------------------   Webhook  ---------------------------------------------------

route!(payment_webhook => Post "/payments/webhook" impl StorefrontStore, PaymentGatewayClient);
/// Receives payment notifications from the gateway.
///
/// The gateway retries any non-2xx response, so every failure the flow knows how to live with is acknowledged
/// with a 200 and a failure body. The exceptions are a payload we cannot even parse, which is a 500 (something is
/// genuinely broken and retries are the right call), and a gateway we cannot reach, which is a 502 so the
/// notification comes around again once the gateway recovers.
pub async fn payment_webhook<TStorefrontStore, TPaymentGatewayClient>(
    req: HttpRequest,
    body: web::Bytes,
    query: web::Query<WebhookParams>,
    api: web::Data<OrderFlowApi<TStorefrontStore, TPaymentGatewayClient>>,
    options: web::Data<WebhookOptions>,
) -> Result<HttpResponse, ServerError>
where
    TStorefrontStore: StorefrontStore,
    TPaymentGatewayClient: PaymentGatewayClient,
{
    trace!("🛒️ Received webhook request: {}", req.uri());
    // Parsed by hand so that a malformed payload is a hard error rather than actix's default 400.
    let notification: WebhookNotification = serde_json::from_slice(&body).map_err(|e| {
        warn!("🛒️ Could not parse the webhook payload. {e}");
        ServerError::Unspecified(format!("Could not parse the webhook payload. {e}"))
    })?;
    let payment_id = notification.data.id.clone();
    if options.active() {
        if let Some(secret) = &options.secret {
            let signature = req.headers().get("x-signature").and_then(|v| v.to_str().ok()).unwrap_or_default();
            let request_id = req.headers().get("x-request-id").and_then(|v| v.to_str().ok()).unwrap_or_default();
            if !verify_webhook_signature(secret.reveal(), signature, request_id, &payment_id) {
                warn!("🛒️ Webhook signature verification failed for payment {payment_id}. Not processing.");
                return Ok(HttpResponse::Ok().json(JsonResponse::failure("Invalid signature")));
            }
        }
    }
    let kind = query.notification_type.clone().or(notification.notification_type);
    if kind.as_deref() != Some("payment") {
        debug!("🛒️ Ignoring webhook of type {}", kind.as_deref().unwrap_or("unknown"));
        return Ok(HttpResponse::Ok().json(JsonResponse::success("Notification type ignored.")));
    }
    info!("🛒️ Payment notification received for payment {payment_id}");
    let response = match api.process_payment_notification(&payment_id).await {
        Ok(outcome) => JsonResponse::success(outcome_message(&outcome)),
        Err(OrderFlowError::GatewayError(e @ GatewayClientError::PaymentNotFound(_))) => {
            // permanent condition; retrying the notification will not conjure the payment up
            warn!("🛒️ {e}. Acknowledging the notification without processing it.");
            JsonResponse::failure(e)
        },
        Err(OrderFlowError::GatewayError(e)) => {
            // 502 is deliberate: the gateway will redeliver once it is reachable again.
            warn!("🛒️ Could not verify payment {payment_id} with the gateway. {e}");
            return Err(ServerError::PaymentGatewayError(e.to_string()));
        },
        Err(e) => {
            warn!("🛒️ Payment notification for {payment_id} could not be processed. {e}");
            JsonResponse::failure(format!("Notification could not be processed. {e}"))
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

fn outcome_message(outcome: &ReconciliationOutcome) -> String {
    match outcome {
        ReconciliationOutcome::OrderPaid(order) => format!("Order #{} confirmed as paid.", order.id),
        ReconciliationOutcome::NoPendingIntent(_) => "No pending intent for this payment. Nothing to do.".to_string(),
        ReconciliationOutcome::Unmatched(_) => "Payment carries no external reference. Nothing to do.".to_string(),
        ReconciliationOutcome::Rejected { .. } => "Payment was rejected. The pending intent was discarded.".to_string(),
        ReconciliationOutcome::StillPending(_) => "Payment has not settled yet.".to_string(),
        ReconciliationOutcome::Ignored(status) => format!("Payment status '{status}' was ignored."),
    }
}

//----------------------------------------------   Manual fallback  -------------------------------------------

route!(process_order => Post "/payments/process-order" impl StorefrontStore, PaymentGatewayClient);
/// Manually confirms the pending intent for a reference. The fallback for when a webhook never arrived.
pub async fn process_order<TStorefrontStore, TPaymentGatewayClient>(
    query: web::Query<ProcessOrderParams>,
    api: web::Data<OrderFlowApi<TStorefrontStore, TPaymentGatewayClient>>,
) -> Result<HttpResponse, ServerError>
where
    TStorefrontStore: StorefrontStore,
    TPaymentGatewayClient: PaymentGatewayClient,
{
    let external_ref = ExternalRef::from(query.into_inner().external_reference);
    info!("💻️ Manual order processing requested for reference {external_ref}");
    let order = api.process_order_for_reference(&external_ref).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Order created successfully",
        "order_id": order.id,
    })))
}

//----------------------------------------------   Checkout redirects  ----------------------------------------

/// The query parameters the gateway appends when redirecting the customer back to us.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedirectParams {
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub preference_id: Option<String>,
}

#[get("/payments/success")]
pub async fn payment_success(query: web::Query<RedirectParams>) -> HttpResponse {
    redirect_ack(StatusCode::OK, "Payment completed. Your order is being confirmed.", query.into_inner())
}

#[get("/payments/failure")]
pub async fn payment_failure(query: web::Query<RedirectParams>) -> HttpResponse {
    redirect_ack(StatusCode::OK, "Payment failed or was cancelled.", query.into_inner())
}

#[get("/payments/pending")]
pub async fn payment_pending(query: web::Query<RedirectParams>) -> HttpResponse {
    redirect_ack(StatusCode::OK, "Payment is pending. Your order will be confirmed once it settles.", query.into_inner())
}

fn redirect_ack(status: StatusCode, message: &str, params: RedirectParams) -> HttpResponse {
    debug!(
        "💻️ Checkout redirect: payment={}, status={}, reference={}",
        params.payment_id.as_deref().unwrap_or("-"),
        params.status.as_deref().unwrap_or("-"),
        params.external_reference.as_deref().unwrap_or("-"),
    );
    HttpResponse::build(status).json(json!({
        "message": message,
        "payment_id": params.payment_id,
        "status": params.status,
        "external_reference": params.external_reference,
        "preference_id": params.preference_id,
    }))
}
