//! CRUD over the mapper, shared by every billing object kind

use async_trait::async_trait;
use std::marker::PhantomData;
use thiserror::Error;
use tfmap::resource::{
    CreateResourceRequest, CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceWithImportState, UpdateResourceRequest,
    UpdateResourceResponse,
};
use tfmap::{
    apply_defaults, expand, expand_update, flatten, import_state_passthrough_id, AttributePath,
    Diagnostic, Diagnostics, Diff, DynamicValue, FieldSpec, RemoteObject, TfmapError,
};

use crate::api::{ApiError, Client, StripeApiResource};

/// Static description of one billing object kind
pub trait ResourceKind: Send + Sync + 'static {
    /// Terraform type name, e.g. "stripe_coupon"
    const TYPE_NAME: &'static str;
    /// Name used in messages, e.g. "coupon"
    const NOUN: &'static str;

    type Object: StripeApiResource;

    fn spec() -> &'static FieldSpec;

    /// Some objects can only be archived, never deleted through the API
    fn deletable() -> bool {
        true
    }
}

#[derive(Debug, Error)]
enum ResourceError {
    #[error("{0}")]
    Mapping(#[from] TfmapError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("State does not contain an id")]
    MissingId,
}

impl ResourceError {
    /// Validation failures keep their per-attribute diagnostics; anything
    /// else becomes one error under `summary`
    fn into_diagnostics(self, summary: String) -> Diagnostics {
        match self {
            ResourceError::Mapping(TfmapError::Validation(diagnostics)) => diagnostics,
            other => {
                let mut diagnostics = Diagnostics::new();
                diagnostics.push(Diagnostic::error(summary, other.to_string()));
                diagnostics
            }
        }
    }
}

pub struct StripeResource<K: ResourceKind> {
    client: Client,
    kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> StripeResource<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            kind: PhantomData,
        }
    }

    fn object_id(state: &DynamicValue) -> Result<String, ResourceError> {
        state
            .get_string(&AttributePath::new("id"))
            .map_err(|_| ResourceError::MissingId)
    }

    fn reflect(object: &K::Object, prior: &DynamicValue) -> Result<DynamicValue, ResourceError> {
        let remote = RemoteObject::from_typed(object)?;
        Ok(flatten(&remote, K::spec(), prior)?)
    }

    async fn create_object(&self, planned: &DynamicValue) -> Result<DynamicValue, ResourceError> {
        let planned = apply_defaults(planned, K::spec())?;
        let request: <K::Object as StripeApiResource>::CreateRequest =
            expand(&planned, K::spec())?.into_typed()?;
        let object = self.client.create::<K::Object>(&request).await?;
        let state = Self::reflect(&object, &planned)?;
        tracing::info!(
            "Created {} {}",
            K::NOUN,
            Self::object_id(&state).unwrap_or_default()
        );
        Ok(state)
    }

    async fn read_object(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, ResourceError> {
        let id = Self::object_id(current)?;
        match self.client.retrieve::<K::Object>(&id).await {
            Ok(object) => Ok(Some(Self::reflect(&object, current)?)),
            Err(e) if e.is_not_found() => {
                tracing::warn!("{} {} no longer exists, removing from state", K::NOUN, id);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_object(
        &self,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, ResourceError> {
        let id = Self::object_id(prior)?;
        let planned = apply_defaults(planned, K::spec())?;
        let params = expand_update(&Diff::new(prior.clone(), planned.clone()), K::spec())?;

        let object = if params.is_empty() {
            tracing::debug!("No updatable changes for {} {}", K::NOUN, id);
            self.client.retrieve::<K::Object>(&id).await?
        } else {
            tracing::debug!(
                "Updating {} {} with {:?}",
                K::NOUN,
                id,
                params.fields().keys().collect::<Vec<_>>()
            );
            let request: <K::Object as StripeApiResource>::UpdateRequest = params.into_typed()?;
            self.client.update::<K::Object>(&id, &request).await?
        };
        Self::reflect(&object, &planned)
    }

    async fn delete_object(&self, prior: &DynamicValue) -> Result<(), ResourceError> {
        let id = Self::object_id(prior)?;
        match self.client.remove::<K::Object>(&id).await {
            Ok(_) => {
                tracing::info!("Deleted {} {}", K::NOUN, id);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("{} {} was already deleted", K::NOUN, id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<K: ResourceKind> Resource for StripeResource<K> {
    fn type_name(&self) -> &str {
        K::TYPE_NAME
    }

    fn spec(&self) -> &FieldSpec {
        K::spec()
    }

    async fn create(&self, request: CreateResourceRequest) -> CreateResourceResponse {
        tracing::debug!("Creating {}", K::TYPE_NAME);
        match self.create_object(&request.planned_state).await {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: Diagnostics::new(),
            },
            Err(e) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: e.into_diagnostics(format!("Failed to create {}", K::NOUN)),
            },
        }
    }

    async fn read(&self, request: ReadResourceRequest) -> ReadResourceResponse {
        tracing::debug!("Reading {}", K::TYPE_NAME);
        match self.read_object(&request.current_state).await {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: Diagnostics::new(),
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: e.into_diagnostics(format!("Failed to read {}", K::NOUN)),
            },
        }
    }

    async fn update(&self, request: UpdateResourceRequest) -> UpdateResourceResponse {
        tracing::debug!("Updating {}", K::TYPE_NAME);
        match self
            .update_object(&request.prior_state, &request.planned_state)
            .await
        {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: Diagnostics::new(),
            },
            Err(e) => UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics: e.into_diagnostics(format!("Failed to update {}", K::NOUN)),
            },
        }
    }

    async fn delete(&self, request: DeleteResourceRequest) -> DeleteResourceResponse {
        tracing::debug!("Deleting {}", K::TYPE_NAME);
        let mut diagnostics = Diagnostics::new();

        if !K::deletable() {
            let id = Self::object_id(&request.prior_state).unwrap_or_default();
            tracing::warn!("Refusing to delete {} {}", K::NOUN, id);
            diagnostics.push(Diagnostic::error(
                format!("The API doesn't allow deleting a {}", K::NOUN),
                format!(
                    "Your state contains \"{}\" which needs deletion. Please archive or remove it manually.",
                    id
                ),
            ));
            return DeleteResourceResponse { diagnostics };
        }

        if let Err(e) = self.delete_object(&request.prior_state).await {
            diagnostics.extend(e.into_diagnostics(format!("Failed to delete {}", K::NOUN)));
        }
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl<K: ResourceKind> ResourceWithImportState for StripeResource<K> {
    async fn import_state(&self, request: ImportResourceStateRequest) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: Diagnostics::new(),
        };
        import_state_passthrough_id(AttributePath::new("id"), &request, &mut response);
        response
    }
}
