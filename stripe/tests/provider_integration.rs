//! Resource lifecycles against the in-memory billing API

use futures::future::join_all;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use stripe::api::memory::MemoryBillingApi;
use stripe::StripeProvider;
use tfmap::resource::{
    CreateResourceRequest, CreateResourceResponse, DeleteResourceRequest,
    ImportResourceStateRequest, ModifyPlanRequest, ReadResourceRequest, UpdateResourceRequest,
    UpdateResourceResponse,
};
use tfmap::{AttributePath, Dynamic, DynamicValue, Resource, ResourceWithImportState};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn setup() -> (Arc<MemoryBillingApi>, StripeProvider) {
    init_tracing();
    let api = Arc::new(MemoryBillingApi::new());
    let mut provider = StripeProvider::new();
    provider.configure(api.clone());
    (api, provider)
}

fn tree(value: Value) -> DynamicValue {
    DynamicValue::decode_json(value.to_string().as_bytes()).unwrap()
}

fn id_of(state: &DynamicValue) -> String {
    state.get_string(&AttributePath::new("id")).unwrap()
}

async fn create(resource: &dyn ResourceWithImportState, config: Value) -> CreateResourceResponse {
    let config = tree(config);
    resource
        .create(CreateResourceRequest {
            type_name: resource.type_name().to_string(),
            planned_state: config.clone(),
            config,
        })
        .await
}

async fn update(
    resource: &dyn ResourceWithImportState,
    prior_state: &DynamicValue,
    planned_state: DynamicValue,
) -> UpdateResourceResponse {
    resource
        .update(UpdateResourceRequest {
            type_name: resource.type_name().to_string(),
            prior_state: prior_state.clone(),
            config: planned_state.clone(),
            planned_state,
        })
        .await
}

async fn read(resource: &dyn ResourceWithImportState, state: &DynamicValue) -> Option<DynamicValue> {
    let response = resource
        .read(ReadResourceRequest {
            type_name: resource.type_name().to_string(),
            current_state: state.clone(),
        })
        .await;
    assert!(response.diagnostics.is_empty(), "{}", response.diagnostics);
    response.new_state
}

async fn last_body(api: &MemoryBillingApi) -> Value {
    let requests = api.requests().await;
    let last = requests.last().unwrap();
    assert_eq!(last.method, "POST");
    last.body.clone().unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn product_lifecycle() {
    let (api, provider) = setup();
    let product = provider.create_resource("stripe_product").unwrap();

    let created = create(
        product.as_ref(),
        json!({"name": "Gold", "type": "service", "metadata": {"tier": "gold"}}),
    )
    .await;
    assert!(created.diagnostics.is_empty(), "{}", created.diagnostics);
    let state = created.new_state;
    let id = id_of(&state);
    assert!(id.starts_with("prod_"));
    assert_eq!(state.get_bool(&AttributePath::new("active")).unwrap(), true);
    assert_eq!(
        state.get_number(&AttributePath::new("created")).unwrap(),
        1_700_000_000.0
    );

    let sent = api.requests().await[0].body.clone().unwrap();
    assert_eq!(
        sent,
        json!({"name": "Gold", "type": "service", "active": true, "metadata": {"tier": "gold"}})
    );

    let mut planned = state.clone();
    planned
        .set_string(&AttributePath::new("name"), "Platinum".to_string())
        .unwrap();
    let updated = update(product.as_ref(), &state, planned).await;
    assert!(updated.diagnostics.is_empty(), "{}", updated.diagnostics);
    assert_eq!(last_body(&api).await, json!({"name": "Platinum"}));
    assert_eq!(
        updated
            .new_state
            .get_string(&AttributePath::new("name"))
            .unwrap(),
        "Platinum"
    );

    let refreshed = read(product.as_ref(), &updated.new_state).await.unwrap();
    assert_eq!(refreshed, updated.new_state);

    let deleted = product
        .delete(DeleteResourceRequest {
            type_name: "stripe_product".to_string(),
            prior_state: refreshed.clone(),
        })
        .await;
    assert!(deleted.diagnostics.is_empty());
    assert!(api.object(&format!("/v1/products/{}", id)).await.is_none());

    assert!(read(product.as_ref(), &refreshed).await.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn update_removes_dropped_metadata_keys() {
    let (api, provider) = setup();
    let product = provider.create_resource("stripe_product").unwrap();
    let state = create(
        product.as_ref(),
        json!({"name": "Gold", "type": "good", "metadata": {"a": "1", "b": "2"}}),
    )
    .await
    .new_state;

    let mut planned = state.clone();
    planned
        .set_value(
            &AttributePath::new("metadata"),
            tree(json!({"a": "1"})).value,
        )
        .unwrap();
    let updated = update(product.as_ref(), &state, planned).await;

    assert!(updated.diagnostics.is_empty(), "{}", updated.diagnostics);
    assert_eq!(last_body(&api).await, json!({"metadata": {"a": "1", "b": ""}}));
    assert_eq!(
        updated
            .new_state
            .get_map(&AttributePath::new("metadata"))
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn update_without_changes_only_reads() {
    let (api, provider) = setup();
    let plan = provider.create_resource("stripe_plan").unwrap();
    let state = create(
        plan.as_ref(),
        json!({"amount": 1500, "currency": "usd", "interval": "month", "product": "prod_1"}),
    )
    .await
    .new_state;

    let updated = update(plan.as_ref(), &state, state.clone()).await;
    assert!(updated.diagnostics.is_empty(), "{}", updated.diagnostics);
    assert_eq!(updated.new_state, state);
    assert_eq!(api.requests().await.last().unwrap().method, "GET");
}

#[tokio::test(flavor = "multi_thread")]
async fn cleared_string_is_sent_empty() {
    let (api, provider) = setup();
    let tax_rate = provider.create_resource("stripe_tax_rate").unwrap();
    let state = create(
        tax_rate.as_ref(),
        json!({
            "display_name": "VAT",
            "description": "Standard rate",
            "inclusive": false,
            "percentage": 20.0
        }),
    )
    .await
    .new_state;
    assert!(id_of(&state).starts_with("txr_"));

    let mut planned = state.clone();
    planned
        .set_value(&AttributePath::new("description"), Dynamic::Null)
        .unwrap();
    let updated = update(tax_rate.as_ref(), &state, planned).await;

    assert!(updated.diagnostics.is_empty(), "{}", updated.diagnostics);
    assert_eq!(last_body(&api).await, json!({"description": ""}));
    assert!(updated
        .new_state
        .get_ok(&AttributePath::new("description"))
        .is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_price_is_refused() {
    let (api, provider) = setup();
    let price = provider.create_resource("stripe_price").unwrap();
    let state = create(
        price.as_ref(),
        json!({"product": "prod_1", "currency": "usd", "unit_amount": 1000}),
    )
    .await
    .new_state;
    let id = id_of(&state);

    let response = price
        .delete(DeleteResourceRequest {
            type_name: "stripe_price".to_string(),
            prior_state: state,
        })
        .await;

    assert_eq!(response.diagnostics.errors.len(), 1);
    assert!(response.diagnostics.errors[0]
        .summary
        .contains("doesn't allow deleting a price"));
    assert!(response.diagnostics.errors[0].detail.contains(&id));
    assert!(api.object(&format!("/v1/prices/{}", id)).await.is_some());
    assert!(api.requests().await.iter().all(|r| r.method != "DELETE"));
}

#[tokio::test(flavor = "multi_thread")]
async fn tiered_price_keeps_its_tiers() {
    let (api, provider) = setup();
    let price = provider.create_resource("stripe_price").unwrap();
    let tiers = json!([
        {"up_to": 100, "unit_amount": 500},
        {"up_to_inf": true, "unit_amount_decimal": 0.0125}
    ]);
    let created = create(
        price.as_ref(),
        json!({
            "product": "prod_1",
            "currency": "usd",
            "billing_scheme": "tiered",
            "tiers_mode": "graduated",
            "recurring": {"interval": "month", "interval_count": "1"},
            "tier": tiers
        }),
    )
    .await;
    assert!(created.diagnostics.is_empty(), "{}", created.diagnostics);

    let sent = api.requests().await[0].body.clone().unwrap();
    assert_eq!(
        sent["tiers"],
        json!([
            {"up_to": 100, "unit_amount": 500},
            {"up_to_inf": true, "unit_amount_decimal": "0.0125"}
        ])
    );
    assert_eq!(sent["recurring"]["interval_count"], json!(1));

    let refreshed = read(price.as_ref(), &created.new_state).await.unwrap();
    assert_eq!(
        refreshed.get(&AttributePath::new("tier")),
        Some(&tree(tiers).value)
    );
    assert_eq!(
        refreshed
            .get_string(&AttributePath::new("recurring").attribute("interval_count"))
            .unwrap(),
        "1"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn coupon_code_becomes_id() {
    let (_api, provider) = setup();
    let coupon = provider.create_resource("stripe_coupon").unwrap();
    let created = create(
        coupon.as_ref(),
        json!({
            "code": "SUMMER25",
            "duration": "once",
            "percent_off": 25,
            "redeem_by": "2030-01-01T00:00:00Z"
        }),
    )
    .await;

    assert!(created.diagnostics.is_empty(), "{}", created.diagnostics);
    let state = created.new_state;
    assert_eq!(id_of(&state), "SUMMER25");
    assert_eq!(state.get_string(&AttributePath::new("code")).unwrap(), "SUMMER25");
    assert_eq!(
        state.get_string(&AttributePath::new("redeem_by")).unwrap(),
        "2030-01-01T00:00:00Z"
    );
    assert_eq!(state.get_bool(&AttributePath::new("valid")).unwrap(), true);
    assert_eq!(
        state.get_number(&AttributePath::new("times_redeemed")).unwrap(),
        0.0
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_config_never_reaches_the_api() {
    let (api, provider) = setup();
    let coupon = provider.create_resource("stripe_coupon").unwrap();
    let created = create(
        coupon.as_ref(),
        json!({"code": "BROKEN", "percent_off": 120}),
    )
    .await;

    let errors = &created.diagnostics.errors;
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .any(|d| d.attribute == Some(AttributePath::new("duration"))));
    assert!(errors
        .iter()
        .any(|d| d.attribute == Some(AttributePath::new("percent_off"))));
    assert!(api.requests().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn webhook_secret_survives_refresh() {
    let (_api, provider) = setup();
    let webhook = provider.create_resource("stripe_webhook_endpoint").unwrap();
    let created = create(
        webhook.as_ref(),
        json!({
            "url": "https://example.com/hooks",
            "enabled_events": ["invoice.paid", "customer.created"],
            "connect": false
        }),
    )
    .await;
    assert!(created.diagnostics.is_empty(), "{}", created.diagnostics);

    let secret_path = AttributePath::new("secret");
    let secret = created.new_state.get_string(&secret_path).unwrap();
    assert!(secret.starts_with("whsec_"));

    let refreshed = read(webhook.as_ref(), &created.new_state).await.unwrap();
    assert_eq!(refreshed.get_string(&secret_path).unwrap(), secret);
    assert_eq!(
        refreshed.get_bool(&AttributePath::new("connect")).unwrap(),
        false
    );
    assert_eq!(
        refreshed.get_string(&AttributePath::new("status")).unwrap(),
        "enabled"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn customer_portal_resends_changed_features() {
    let (api, provider) = setup();
    let portal = provider.create_resource("stripe_customer_portal").unwrap();
    let created = create(
        portal.as_ref(),
        json!({
            "business_profile": [{
                "headline": "Acme billing",
                "privacy_policy_url": "https://example.com/privacy",
                "terms_of_service_url": "https://example.com/terms"
            }],
            "features": [{
                "invoice_history": [{"enabled": true}],
                "customer_update": [{"enabled": true, "allowed_updates": ["email", "address"]}]
            }]
        }),
    )
    .await;
    assert!(created.diagnostics.is_empty(), "{}", created.diagnostics);
    let state = created.new_state;
    assert!(id_of(&state).starts_with("bpc_"));
    assert_eq!(
        state
            .get_bool(
                &AttributePath::new("features")
                    .index(0)
                    .attribute("invoice_history")
                    .index(0)
                    .attribute("enabled")
            )
            .unwrap(),
        true
    );

    let mut planned = state.clone();
    planned
        .set_value(
            &AttributePath::new("features"),
            tree(json!([{
                "invoice_history": [{"enabled": false}],
                "customer_update": [{"enabled": true, "allowed_updates": ["email", "address"]}]
            }]))
            .value,
        )
        .unwrap();
    let updated = update(portal.as_ref(), &state, planned).await;
    assert!(updated.diagnostics.is_empty(), "{}", updated.diagnostics);

    let body = last_body(&api).await;
    assert_eq!(
        body,
        json!({
            "features": {
                "invoice_history": {"enabled": false},
                "customer_update": {"enabled": true, "allowed_updates": ["email", "address"]}
            }
        })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn api_errors_become_diagnostics() {
    let (api, provider) = setup();
    let product = provider.create_resource("stripe_product").unwrap();
    api.fail_next(402, "account is not activated").await;

    let created = create(product.as_ref(), json!({"name": "Gold", "type": "good"})).await;

    assert_eq!(created.diagnostics.errors.len(), 1);
    let error = &created.diagnostics.errors[0];
    assert_eq!(error.summary, "Failed to create product");
    assert!(error.detail.contains("HTTP 402"));
    assert!(error.detail.contains("account is not activated"));
    assert_eq!(
        created.new_state,
        tree(json!({"name": "Gold", "type": "good"}))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn import_then_read_restores_state() {
    let (_api, provider) = setup();
    let tax_rate = provider.create_resource("stripe_tax_rate").unwrap();
    let state = create(
        tax_rate.as_ref(),
        json!({"display_name": "GST", "inclusive": true, "percentage": 5.0, "jurisdiction": "AU"}),
    )
    .await
    .new_state;

    let imported = tax_rate
        .import_state(ImportResourceStateRequest {
            type_name: "stripe_tax_rate".to_string(),
            id: id_of(&state),
        })
        .await;
    assert!(imported.diagnostics.is_empty());
    assert_eq!(imported.imported_resources.len(), 1);

    let refreshed = read(tax_rate.as_ref(), &imported.imported_resources[0].state)
        .await
        .unwrap();
    assert_eq!(
        refreshed.get_string(&AttributePath::new("jurisdiction")).unwrap(),
        "AU"
    );
    assert_eq!(
        refreshed.get_number(&AttributePath::new("percentage")).unwrap(),
        5.0
    );
    assert_eq!(refreshed.get_bool(&AttributePath::new("inclusive")).unwrap(), true);
}

#[tokio::test(flavor = "multi_thread")]
async fn plan_reports_replacement_for_force_new_changes() {
    let (_api, provider) = setup();
    let product = provider.create_resource("stripe_product").unwrap();
    let state = create(product.as_ref(), json!({"name": "Gold", "type": "good"}))
        .await
        .new_state;

    let mut proposed = state.clone();
    proposed
        .set_string(&AttributePath::new("type"), "service".to_string())
        .unwrap();
    proposed
        .set_string(&AttributePath::new("name"), "Gold+".to_string())
        .unwrap();

    let response = product
        .modify_plan(ModifyPlanRequest {
            type_name: "stripe_product".to_string(),
            config: proposed.clone(),
            prior_state: state,
            proposed_new_state: proposed,
        })
        .await;

    assert!(response.diagnostics.is_empty());
    assert_eq!(response.requires_replace, vec![AttributePath::new("type")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_creates_share_one_provider() {
    let (api, provider) = setup();

    let creates = (0..10).map(|i| {
        let product = provider.create_resource("stripe_product").unwrap();
        async move {
            create(
                product.as_ref(),
                json!({"name": format!("Product {}", i), "type": "good"}),
            )
            .await
        }
    });
    let responses = join_all(creates).await;

    let ids: HashSet<String> = responses
        .iter()
        .map(|r| {
            assert!(r.diagnostics.is_empty(), "{}", r.diagnostics);
            id_of(&r.new_state)
        })
        .collect();
    assert_eq!(ids.len(), 10);
    assert_eq!(api.len().await, 10);
}
