use crate::{schema::Values, value::Value};
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error as ThisError;

///
/// Backend
///
/// Session with the document database. Transport, authentication and retry
/// policy live behind this boundary; the table only issues flat query text
/// against a container link and id-addressed document writes.
///

pub trait Backend {
    fn query(&self, container: &str, query: &str) -> Result<Vec<Document>, BackendError>;

    fn create(&self, container: &str, document: Document) -> Result<(), BackendError>;

    fn replace(&self, container: &str, document: Document) -> Result<(), BackendError>;

    fn delete(&self, container: &str, id: &str) -> Result<(), BackendError>;
}

///
/// BackendError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum BackendError {
    #[error("document '{id}' not found")]
    NotFound { id: String },

    #[error("document '{id}' already exists")]
    Conflict { id: String },

    #[error("document has no '{}' field", Document::ID_FIELD)]
    MissingId,

    #[error("query rejected: {message}")]
    Rejected { message: String },

    #[error("backend unavailable: {message}")]
    Unavailable { message: String },
}

///
/// Document
///
/// One stored JSON object with named-field lookup.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document(Map<String, JsonValue>);

impl Document {
    pub const ID_FIELD: &'static str = "id";

    #[must_use]
    pub const fn new(fields: Map<String, JsonValue>) -> Self {
        Self(fields)
    }

    /// Build a document from an attribute map. A non-null `id` attribute is
    /// kept as the document id; otherwise `fresh_id` supplies one.
    #[must_use]
    pub fn from_values(values: &Values, fresh_id: impl FnOnce() -> String) -> Self {
        let mut fields: Map<String, JsonValue> = values
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();

        let has_id = fields
            .get(Self::ID_FIELD)
            .is_some_and(|id| !id.is_null());
        if !has_id {
            fields.insert(Self::ID_FIELD.to_string(), JsonValue::String(fresh_id()));
        }

        Self(fields)
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get(Self::ID_FIELD).and_then(JsonValue::as_str)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: &str, value: &Value) {
        self.0.insert(name.to_string(), value.to_json());
    }

    #[must_use]
    pub fn into_inner(self) -> Map<String, JsonValue> {
        self.0
    }
}

impl From<Map<String, JsonValue>> for Document {
    fn from(fields: Map<String, JsonValue>) -> Self {
        Self(fields)
    }
}
