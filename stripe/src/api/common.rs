//! Common types and utilities for the Stripe API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Free-form key/value pairs attached to every billing object
pub type Metadata = HashMap<String, String>;

/// Response body of a DELETE call
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeletedObject {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
}

/// A billing object reachable under a collection path
pub trait StripeApiResource: Serialize + DeserializeOwned + Send + Sync + Sized {
    type CreateRequest: Serialize + DeserializeOwned + Send + Sync;
    type UpdateRequest: Serialize + DeserializeOwned + Send + Sync;

    fn api_path() -> &'static str;
    fn resource_path(id: &str) -> String {
        format!("{}/{}", Self::api_path(), id)
    }
}
