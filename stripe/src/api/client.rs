use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::common::{DeletedObject, StripeApiResource};
use super::error::ApiError;

/// Transport to the billing API. Bodies are JSON; errors are passed through
/// to the caller untouched.
#[async_trait]
pub trait BillingApi: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value, ApiError>;
    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError>;
    async fn delete(&self, path: &str) -> Result<Value, ApiError>;
}

/// Typed client over a `BillingApi`
#[derive(Clone)]
pub struct Client {
    inner: Arc<dyn BillingApi>,
}

impl Client {
    pub fn new(api: Arc<dyn BillingApi>) -> Self {
        Self { inner: api }
    }

    /// Execute a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        tracing::debug!("GET request to: {}", path);
        let value = self.inner.get(path).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Execute a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        tracing::debug!("POST request to: {}", path);
        let body = serde_json::to_value(body)?;
        let value = self.inner.post(path, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Execute a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        tracing::debug!("DELETE request to: {}", path);
        let value = self.inner.delete(path).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn create<R: StripeApiResource>(&self, request: &R::CreateRequest) -> Result<R, ApiError> {
        self.post(R::api_path(), request).await
    }

    pub async fn retrieve<R: StripeApiResource>(&self, id: &str) -> Result<R, ApiError> {
        self.get(&R::resource_path(id)).await
    }

    pub async fn update<R: StripeApiResource>(
        &self,
        id: &str,
        request: &R::UpdateRequest,
    ) -> Result<R, ApiError> {
        self.post(&R::resource_path(id), request).await
    }

    pub async fn remove<R: StripeApiResource>(&self, id: &str) -> Result<DeletedObject, ApiError> {
        self.delete(&R::resource_path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryBillingApi;
    use crate::api::product::{Product, ProductCreateRequest};

    fn client() -> Client {
        Client::new(Arc::new(MemoryBillingApi::new()))
    }

    #[tokio::test]
    async fn client_creates_and_retrieves_typed_objects() {
        let client = client();
        let request = ProductCreateRequest {
            name: Some("Gold".to_string()),
            product_type: Some("service".to_string()),
            ..Default::default()
        };

        let created: Product = client.create(&request).await.unwrap();
        assert!(created.id.starts_with("prod_"));
        assert_eq!(created.name, "Gold");

        let fetched: Product = client.retrieve(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn client_surfaces_not_found() {
        let result = client().retrieve::<Product>("prod_missing").await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn client_reports_unparseable_responses() {
        let result = client()
            .post::<Product, _>("/v1/products", &serde_json::json!({"name": 5}))
            .await;
        assert!(matches!(result, Err(ApiError::ParseError(_))));
    }
}
