//! Resource trait and related types
//!
//! Resources implement CRUD on top of a `FieldSpec`. Validation and planning
//! have default implementations driven entirely by the resource's `FieldSpec`.

use crate::defaults::apply_defaults;
use crate::diff::Diff;
use crate::expand;
use crate::schema::FieldSpec;
use crate::types::{AttributePath, Diagnostic, Diagnostics, DynamicValue};
use async_trait::async_trait;

/// Base trait for resources - implement CRUD operations
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name should be constant (e.g., "stripe_coupon")
    fn type_name(&self) -> &str;

    /// Static spec for this resource kind - build it once and cache it
    fn spec(&self) -> &FieldSpec;

    /// Called during plan to validate configuration
    async fn validate(&self, request: ValidateResourceConfigRequest) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: expand::validate(&request.config, self.spec()),
        }
    }

    /// Fills defaults into the proposed state and reports which force-new
    /// attributes changed
    async fn modify_plan(&self, request: ModifyPlanRequest) -> ModifyPlanResponse {
        let mut diagnostics = Diagnostics::new();
        let planned_state = match apply_defaults(&request.proposed_new_state, self.spec()) {
            Ok(planned) => planned,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to apply defaults", e.to_string()));
                request.proposed_new_state.clone()
            }
        };
        let requires_replace =
            Diff::new(request.prior_state, planned_state.clone()).requires_replace(self.spec());
        ModifyPlanResponse {
            planned_state,
            requires_replace,
            diagnostics,
        }
    }

    /// Called to create a new resource
    /// MUST populate all attributes in response.new_state (including computed)
    async fn create(&self, request: CreateResourceRequest) -> CreateResourceResponse;

    /// Called to read current state - used for refresh and after import
    /// Returns None if the resource no longer exists
    async fn read(&self, request: ReadResourceRequest) -> ReadResourceResponse;

    /// Called to update an existing resource in place
    async fn update(&self, request: UpdateResourceRequest) -> UpdateResourceResponse;

    /// Called to delete a resource
    async fn delete(&self, request: DeleteResourceRequest) -> DeleteResourceResponse;
}

/// Optional interface for importing existing resources by ID
#[async_trait]
pub trait ResourceWithImportState: Resource {
    async fn import_state(&self, request: ImportResourceStateRequest) -> ImportResourceStateResponse;
}

// Request/Response types for Resource trait

pub struct ValidateResourceConfigRequest {
    pub type_name: String,
    pub config: DynamicValue,
}

pub struct ValidateResourceConfigResponse {
    pub diagnostics: Diagnostics,
}

pub struct ModifyPlanRequest {
    pub type_name: String,
    pub config: DynamicValue,
    pub prior_state: DynamicValue,
    pub proposed_new_state: DynamicValue,
}

pub struct ModifyPlanResponse {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Diagnostics,
}

pub struct CreateResourceRequest {
    pub type_name: String,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
}

pub struct CreateResourceResponse {
    pub new_state: DynamicValue,
    pub diagnostics: Diagnostics,
}

pub struct ReadResourceRequest {
    pub type_name: String,
    pub current_state: DynamicValue,
}

pub struct ReadResourceResponse {
    pub new_state: Option<DynamicValue>,
    pub diagnostics: Diagnostics,
}

pub struct UpdateResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
}

pub struct UpdateResourceResponse {
    pub new_state: DynamicValue,
    pub diagnostics: Diagnostics,
}

pub struct DeleteResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
}

pub struct DeleteResourceResponse {
    pub diagnostics: Diagnostics,
}

pub struct ImportResourceStateRequest {
    pub type_name: String,
    pub id: String,
}

pub struct ImportResourceStateResponse {
    pub imported_resources: Vec<ImportedResource>,
    pub diagnostics: Diagnostics,
}

pub struct ImportedResource {
    pub type_name: String,
    pub state: DynamicValue,
}
