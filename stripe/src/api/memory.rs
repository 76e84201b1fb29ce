//! In-memory billing API
//!
//! Stores objects by path and applies the same merge rules the hosted API
//! does for updates: metadata is merged per key, an empty string clears a
//! key or field. Used by the test suites and for dry runs.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::client::BillingApi;
use super::error::ApiError;

const CREATED: i64 = 1_700_000_000;

/// Collection paths and the id prefix of objects created under them
const COLLECTIONS: &[(&str, &str, &str)] = &[
    ("/v1/coupons", "", "coupon"),
    ("/v1/plans", "plan_", "plan"),
    ("/v1/prices", "price_", "price"),
    ("/v1/products", "prod_", "product"),
    ("/v1/tax_rates", "txr_", "tax_rate"),
    ("/v1/webhook_endpoints", "we_", "webhook_endpoint"),
    (
        "/v1/billing_portal/configurations",
        "bpc_",
        "billing_portal.configuration",
    ),
];

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct MemoryBillingApi {
    objects: RwLock<HashMap<String, Value>>,
    requests: RwLock<Vec<RecordedRequest>>,
    failure: RwLock<Option<(u16, String)>>,
}

impl MemoryBillingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request received so far, in order
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    pub async fn object(&self, path: &str) -> Option<Value> {
        self.objects.read().await.get(path).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Make the next request fail with the given status and message
    pub async fn fail_next(&self, status: u16, message: &str) {
        *self.failure.write().await = Some((status, message.to_string()));
    }

    async fn record(&self, method: &'static str, path: &str, body: Option<&Value>) -> Result<(), ApiError> {
        self.requests.write().await.push(RecordedRequest {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
        match self.failure.write().await.take() {
            Some((status, message)) => Err(ApiError::ApiError { status, message }),
            None => Ok(()),
        }
    }

    async fn create(&self, collection: &str, prefix: &str, kind: &str, body: Value) -> Result<Value, ApiError> {
        let Value::Object(mut fields) = body else {
            return Err(bad_request("request body must be an object"));
        };
        let id = match fields.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => format!("{}{}", prefix, uuid::Uuid::new_v4().simple()),
        };
        let path = format!("{}/{}", collection, id);

        let mut objects = self.objects.write().await;
        if objects.contains_key(&path) {
            return Err(bad_request(&format!("{} already exists", id)));
        }

        if let Some(Value::Object(metadata)) = fields.get_mut("metadata") {
            metadata.retain(|_, v| v.as_str() != Some(""));
        }
        fields.insert("id".to_string(), json!(id));
        fields.insert("object".to_string(), json!(kind));
        fields.insert("created".to_string(), json!(CREATED));
        fields.insert("livemode".to_string(), json!(false));
        fields.entry("metadata").or_insert_with(|| json!({}));
        for (key, value) in computed_fields(kind) {
            fields.entry(key).or_insert(value);
        }

        let mut stored = fields.clone();
        // Returned once on creation, never again
        if kind == "webhook_endpoint" {
            stored.remove("secret");
            fields.insert(
                "secret".to_string(),
                json!(format!("whsec_{}", uuid::Uuid::new_v4().simple())),
            );
        }
        objects.insert(path, Value::Object(stored));
        Ok(Value::Object(fields))
    }

    async fn update(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        let Value::Object(changes) = body else {
            return Err(bad_request("request body must be an object"));
        };
        let mut objects = self.objects.write().await;
        let Some(Value::Object(current)) = objects.get_mut(path) else {
            return Err(ApiError::NotFound(path.to_string()));
        };

        for (key, value) in changes {
            match (key.as_str(), value) {
                ("metadata", Value::Object(entries)) => {
                    let metadata = current
                        .entry("metadata")
                        .or_insert_with(|| json!({}));
                    if let Value::Object(existing) = metadata {
                        merge_metadata(existing, entries);
                    }
                }
                (_, Value::String(s)) if s.is_empty() => {
                    current.insert(key, Value::Null);
                }
                (_, value) => {
                    current.insert(key, value);
                }
            }
        }
        if current.contains_key("updated") {
            current.insert("updated".to_string(), json!(CREATED + 1));
        }
        Ok(Value::Object(current.clone()))
    }
}

#[async_trait]
impl BillingApi for MemoryBillingApi {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.record("GET", path, None).await?;
        self.objects
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(path.to_string()))
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.record("POST", path, Some(&body)).await?;
        if let Some((collection, prefix, kind)) = COLLECTIONS.iter().find(|(c, _, _)| *c == path) {
            return self.create(collection, prefix, kind, body).await;
        }
        self.update(path, body).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.record("DELETE", path, None).await?;
        match self.objects.write().await.remove(path) {
            Some(object) => Ok(json!({
                "id": object.get("id").cloned().unwrap_or(Value::Null),
                "deleted": true,
            })),
            None => Err(ApiError::NotFound(path.to_string())),
        }
    }
}

fn merge_metadata(existing: &mut Map<String, Value>, changes: Map<String, Value>) {
    for (key, value) in changes {
        if value.as_str() == Some("") {
            existing.remove(&key);
        } else {
            existing.insert(key, value);
        }
    }
}

fn computed_fields(kind: &str) -> Vec<(&'static str, Value)> {
    match kind {
        "coupon" => vec![("valid", json!(true)), ("times_redeemed", json!(0))],
        "price" | "plan" | "product" | "tax_rate" => vec![("active", json!(true))],
        "webhook_endpoint" => vec![("status", json!("enabled"))],
        "billing_portal.configuration" => vec![
            ("active", json!(true)),
            ("is_default", json!(false)),
            ("updated", json!(CREATED)),
        ],
        _ => Vec::new(),
    }
}

fn bad_request(message: &str) -> ApiError {
    ApiError::ApiError {
        status: 400,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_assigns_id_and_computed_fields() {
        let api = MemoryBillingApi::new();
        let object = api
            .post("/v1/products", json!({"name": "Gold"}))
            .await
            .unwrap();

        let id = object["id"].as_str().unwrap();
        assert!(id.starts_with("prod_"));
        assert_eq!(object["active"], json!(true));
        assert_eq!(object["created"], json!(CREATED));
        assert!(api.object(&format!("/v1/products/{}", id)).await.is_some());
    }

    #[tokio::test]
    async fn create_keeps_caller_supplied_id() {
        let api = MemoryBillingApi::new();
        api.post("/v1/coupons", json!({"id": "SAVE10", "duration": "once"}))
            .await
            .unwrap();

        let again = api
            .post("/v1/coupons", json!({"id": "SAVE10", "duration": "once"}))
            .await;
        assert!(matches!(again, Err(ApiError::ApiError { status: 400, .. })));
    }

    #[tokio::test]
    async fn update_merges_metadata_and_clears_empty_strings() {
        let api = MemoryBillingApi::new();
        api.post(
            "/v1/coupons",
            json!({"id": "SAVE10", "name": "Ten", "metadata": {"a": "1", "b": "2"}}),
        )
        .await
        .unwrap();

        let updated = api
            .post(
                "/v1/coupons/SAVE10",
                json!({"name": "", "metadata": {"b": "", "c": "3"}}),
            )
            .await
            .unwrap();

        assert_eq!(updated["name"], Value::Null);
        assert_eq!(updated["metadata"], json!({"a": "1", "c": "3"}));
    }

    #[tokio::test]
    async fn webhook_secret_is_only_returned_on_create() {
        let api = MemoryBillingApi::new();
        let created = api
            .post("/v1/webhook_endpoints", json!({"url": "https://example.com/hook"}))
            .await
            .unwrap();
        assert!(created["secret"].as_str().unwrap().starts_with("whsec_"));

        let path = format!("/v1/webhook_endpoints/{}", created["id"].as_str().unwrap());
        let fetched = api.get(&path).await.unwrap();
        assert!(fetched.get("secret").is_none());
    }

    #[tokio::test]
    async fn missing_objects_are_not_found() {
        let api = MemoryBillingApi::new();
        assert!(matches!(api.get("/v1/plans/plan_x").await, Err(ApiError::NotFound(_))));
        assert!(matches!(api.delete("/v1/plans/plan_x").await, Err(ApiError::NotFound(_))));
        assert!(matches!(
            api.post("/v1/plans/plan_x", json!({"nickname": "x"})).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn fail_next_applies_once() {
        let api = MemoryBillingApi::new();
        api.fail_next(402, "card_declined").await;

        let first = api.post("/v1/products", json!({"name": "Gold"})).await;
        assert!(matches!(first, Err(ApiError::ApiError { status: 402, .. })));
        assert!(api.post("/v1/products", json!({"name": "Gold"})).await.is_ok());
        assert_eq!(api.requests().await.len(), 2);
    }
}
