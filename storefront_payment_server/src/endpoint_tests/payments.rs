use actix_web::{
    http::StatusCode,
    test::{self, TestRequest},
    web,
    App,
};
use chrono::Duration;
use serde_json::json;
use storefront_payment_engine::{
    db_types::{ExternalRef, LineItem, OrderStatusType, PendingIntent},
    events::EventProducers,
    intent_cache::PendingIntentCache,
    test_utils::{prepare_env, MemoryStore, ScriptedGateway},
    traits::PaymentStatus,
    OrderFlowApi,
};

use crate::{
    config::WebhookOptions,
    data_objects::JsonResponse,
    helpers::calculate_hmac,
    routes::{health, payment_success, CreatePaymentRoute, PaymentInfoRoute, PaymentWebhookRoute, ProcessOrderRoute},
};

struct TestHarness {
    store: MemoryStore,
    gateway: ScriptedGateway,
    cache: PendingIntentCache,
}

impl TestHarness {
    fn new() -> Self {
        prepare_env();
        let store = MemoryStore::new();
        store.add_customer(1, "Alice", "alice@example.com");
        store.add_catalog_item("comic-1", "Issue #1", 1500);
        store.add_catalog_item("comic-2", "Issue #2", 2500);
        Self { store, gateway: ScriptedGateway::new(), cache: PendingIntentCache::new(Duration::hours(24)) }
    }

    fn cache_intent(&self, reference: &str) {
        let intent =
            PendingIntent::new(ExternalRef::from(reference), 1, vec![LineItem::new("comic-1", 2), LineItem::new("comic-2", 1)]);
        self.cache.put(intent);
    }

    /// Returns the app configuration for `App::new().configure(...)`, with the harness's backends plugged into
    /// the full routing table.
    fn configure(&self, webhook_options: WebhookOptions) -> impl FnOnce(&mut web::ServiceConfig) {
        let api = OrderFlowApi::new(
            self.store.clone(),
            self.gateway.clone(),
            self.cache.clone(),
            EventProducers::default(),
        );
        move |config: &mut web::ServiceConfig| {
            config
                .app_data(web::Data::new(api))
                .app_data(web::Data::new(webhook_options))
                .service(health)
                .service(payment_success)
                .service(CreatePaymentRoute::<MemoryStore, ScriptedGateway>::new())
                .service(PaymentWebhookRoute::<MemoryStore, ScriptedGateway>::new())
                .service(ProcessOrderRoute::<MemoryStore, ScriptedGateway>::new())
                .service(PaymentInfoRoute::<MemoryStore, ScriptedGateway>::new());
        }
    }
}

fn webhook_body(payment_id: &str) -> serde_json::Value {
    json!({ "type": "payment", "action": "payment.updated", "data": { "id": payment_id } })
}

#[actix_web::test]
async fn health_check() {
    let harness = TestHarness::new();
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let req = TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn create_payment_returns_the_checkout_link_and_caches_the_intent() {
    let harness = TestHarness::new();
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let body = json!({
        "customer_id": 1,
        "items": [ { "item_id": "comic-1", "quantity": 2 } ],
        "title": "ComicVerse order",
        "price": "3000",
    });
    let req = TestRequest::post().uri("/payments/create").set_json(&body).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let response: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(response["id"], "pref-1");
    assert_eq!(response["init_point"], "https://gateway.test/checkout/1");
    assert_eq!(harness.cache.len(), 1);
    let prefs = harness.gateway.preferences();
    assert_eq!(prefs.len(), 1);
    assert_eq!(prefs[0].unit_price.value(), 3000);
}

#[actix_web::test]
async fn create_payment_rejects_a_garbled_price() {
    let harness = TestHarness::new();
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let body = json!({
        "customer_id": 1,
        "items": [ { "item_id": "comic-1", "quantity": 1 } ],
        "title": "ComicVerse order",
        "price": "lots",
    });
    let req = TestRequest::post().uri("/payments/create").set_json(&body).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(harness.cache.is_empty());
}

#[actix_web::test]
async fn create_payment_rejects_an_empty_basket() {
    let harness = TestHarness::new();
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let body = json!({
        "customer_id": 1,
        "items": [],
        "title": "ComicVerse order",
        "price": "3000",
    });
    let req = TestRequest::post().uri("/payments/create").set_json(&body).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn an_approved_webhook_creates_a_paid_order() {
    let harness = TestHarness::new();
    harness.cache_intent("sps-web");
    harness.gateway.script_payment(ScriptedGateway::payment("pay-1", PaymentStatus::Approved, Some("sps-web")));
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let req = TestRequest::post().uri("/payments/webhook").set_json(webhook_body("pay-1")).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let ack: JsonResponse = test::read_body_json(res).await;
    assert!(ack.success);
    let orders = harness.store.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatusType::Paid);
    assert!(harness.cache.is_empty());
}

#[actix_web::test]
async fn duplicate_webhooks_are_acknowledged_without_a_second_order() {
    let harness = TestHarness::new();
    harness.cache_intent("sps-dup");
    harness.gateway.script_payment(ScriptedGateway::payment("pay-1", PaymentStatus::Approved, Some("sps-dup")));
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    for _ in 0..2 {
        let req = TestRequest::post().uri("/payments/webhook").set_json(webhook_body("pay-1")).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let ack: JsonResponse = test::read_body_json(res).await;
        assert!(ack.success);
    }
    assert_eq!(harness.store.order_count(), 1);
}

#[actix_web::test]
async fn a_malformed_webhook_payload_is_a_server_error() {
    let harness = TestHarness::new();
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("content-type", "application/json"))
        .set_payload("{this is not json")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn non_payment_webhooks_are_acknowledged_and_ignored() {
    let harness = TestHarness::new();
    harness.cache_intent("sps-x");
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let body = json!({ "type": "merchant_order", "data": { "id": "mo-1" } });
    let req = TestRequest::post().uri("/payments/webhook").set_json(&body).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let ack: JsonResponse = test::read_body_json(res).await;
    assert!(ack.success);
    assert_eq!(harness.store.order_count(), 0);
    assert_eq!(harness.cache.len(), 1);
}

#[actix_web::test]
async fn the_notification_type_can_come_from_the_query_string() {
    let harness = TestHarness::new();
    harness.cache_intent("sps-q");
    harness.gateway.script_payment(ScriptedGateway::payment("pay-1", PaymentStatus::Approved, Some("sps-q")));
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let body = json!({ "data": { "id": "pay-1" } });
    let req = TestRequest::post().uri("/payments/webhook?type=payment").set_json(&body).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(harness.store.order_count(), 1);
}

#[actix_web::test]
async fn webhooks_for_unknown_payments_are_acknowledged_as_failures() {
    let harness = TestHarness::new();
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let req = TestRequest::post().uri("/payments/webhook").set_json(webhook_body("pay-missing")).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let ack: JsonResponse = test::read_body_json(res).await;
    assert!(!ack.success);
    assert_eq!(harness.store.order_count(), 0);
}

#[actix_web::test]
async fn webhook_signatures_are_enforced_when_configured() {
    let harness = TestHarness::new();
    harness.cache_intent("sps-sig");
    harness.gateway.script_payment(ScriptedGateway::payment("pay-1", PaymentStatus::Approved, Some("sps-sig")));
    let secret = "whsec-test";
    let options = WebhookOptions { secret: Some(sps_common::Secret::new(secret.to_string())), verify_signatures: true };
    let app = test::init_service(App::new().configure(harness.configure(options))).await;

    // unsigned requests are acknowledged but not processed
    let req = TestRequest::post().uri("/payments/webhook").set_json(webhook_body("pay-1")).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let ack: JsonResponse = test::read_body_json(res).await;
    assert!(!ack.success);
    assert_eq!(harness.store.order_count(), 0);

    // a correctly signed request goes through
    let v1 = calculate_hmac(secret, b"id:pay-1;request-id:req-1;ts:1704908010;");
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("x-signature", format!("ts=1704908010,v1={v1}")))
        .insert_header(("x-request-id", "req-1"))
        .set_json(webhook_body("pay-1"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let ack: JsonResponse = test::read_body_json(res).await;
    assert!(ack.success);
    assert_eq!(harness.store.order_count(), 1);
}

#[actix_web::test]
async fn process_order_confirms_a_cached_intent() {
    let harness = TestHarness::new();
    harness.cache_intent("sps-manual");
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let req = TestRequest::post().uri("/payments/process-order?externalReference=sps-manual").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let response: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(response["success"], true);
    let orders = harness.store.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(response["order_id"], orders[0].id);
    assert_eq!(orders[0].status, OrderStatusType::Paid);
}

#[actix_web::test]
async fn process_order_without_an_intent_is_not_found() {
    let harness = TestHarness::new();
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let req = TestRequest::post().uri("/payments/process-order?externalReference=sps-ghost").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn payment_info_returns_the_gateway_record() {
    let harness = TestHarness::new();
    harness.gateway.script_payment(ScriptedGateway::payment("pay-7", PaymentStatus::Pending, Some("sps-p")));
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let req = TestRequest::get().uri("/payments/pay-7").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let info: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(info["id"], "pay-7");
    assert_eq!(info["status"], "pending");
    assert_eq!(info["external_reference"], "sps-p");
}

#[actix_web::test]
async fn payment_info_for_an_unknown_payment_is_not_found() {
    let harness = TestHarness::new();
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let req = TestRequest::get().uri("/payments/pay-nope").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn redirect_landings_win_over_the_payment_id_resource() {
    let harness = TestHarness::new();
    let app = test::init_service(App::new().configure(harness.configure(WebhookOptions::disabled()))).await;
    let req = TestRequest::get().uri("/payments/success?payment_id=pay-1&status=approved").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["payment_id"], "pay-1");
}
