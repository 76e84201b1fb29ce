//! tfmap - attribute mapping for Terraform providers in Rust
//!
//! Translates between the untyped attribute tree Terraform hands a provider
//! and the remote-named parameters and objects of a REST API. Each resource
//! kind declares a `FieldSpec`; `expand` and `flatten` do the rest.

// Core modules
pub mod error;
pub mod schema;
pub mod types;

// Mapping
pub mod coerce;
pub mod constraint;
pub mod diff;
pub mod expand;
pub mod flatten;
pub mod remote;

// Resource API modules
pub mod resource;

// Helper modules
pub mod defaults;
pub mod import;
pub mod validator;

// Re-exports for convenience
pub use constraint::{Constraint, OmitWhen};
pub use defaults::apply_defaults;
pub use diff::Diff;
pub use error::{Result, TfmapError};
pub use expand::{expand, expand_metadata, expand_update, validate};
pub use flatten::flatten;
pub use import::import_state_passthrough_id;
pub use remote::{RemoteObject, RemoteParams};
pub use resource::{Resource, ResourceWithImportState};
pub use schema::{
    Field, FieldBuilder, FieldSpec, FieldSpecBuilder, FieldType, NestedBlockBuilder, NestingMode,
    NumberKind,
};
pub use types::{AttributePath, Diagnostic, Diagnostics, Dynamic, DynamicValue};
