//! Remote-side values: request params produced by expand and API objects
//! consumed by flatten. Both are plain JSON objects keyed by remote field
//! names; typed API structs convert through serde.

use crate::error::{Result, TfmapError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters for a create or update call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RemoteParams {
    fields: Map<String, Value>,
}

impl RemoteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, remote_name: &str) -> Option<&Value> {
        self.fields.get(remote_name)
    }

    pub fn contains_key(&self, remote_name: &str) -> bool {
        self.fields.contains_key(remote_name)
    }

    pub fn insert(&mut self, remote_name: impl Into<String>, value: Value) {
        self.fields.insert(remote_name.into(), value);
    }

    pub fn remove(&mut self, remote_name: &str) -> Option<Value> {
        self.fields.remove(remote_name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Convert into a typed params struct
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.into_value())
            .map_err(|e| TfmapError::DecodingError(format!("invalid remote params: {}", e)))
    }
}

impl From<Map<String, Value>> for RemoteParams {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// An object as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteObject {
    fields: Map<String, Value>,
}

impl RemoteObject {
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(TfmapError::TypeMismatch {
                path: "<root>".to_string(),
                expected: "object".to_string(),
                actual: crate::coerce::json_type_name(&other).to_string(),
            }),
        }
    }

    /// Convert from a typed API object
    pub fn from_typed<T: Serialize>(object: &T) -> Result<Self> {
        let value = serde_json::to_value(object)
            .map_err(|e| TfmapError::EncodingError(format!("invalid remote object: {}", e)))?;
        Self::from_value(value)
    }

    pub fn get(&self, remote_name: &str) -> Option<&Value> {
        self.fields.get(remote_name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The remote identifier, when the object carries one
    pub fn id(&self) -> Option<&str> {
        self.fields.get("id").and_then(Value::as_str)
    }
}

/// An echo of the params, as an API that stores them verbatim would return
impl From<RemoteParams> for RemoteObject {
    fn from(params: RemoteParams) -> Self {
        Self {
            fields: params.fields,
        }
    }
}
