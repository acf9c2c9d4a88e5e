//! Documents, queries and partial updates.

use fiches_core::{Collection, FichesResult, StorageError};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

// ============================================================================
// DOCUMENT
// ============================================================================

/// A stored document: its id and its raw field data.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub collection: Collection,
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(collection: Collection, id: impl Into<String>, data: Value) -> Self {
        Self {
            collection,
            id: id.into(),
            data,
        }
    }

    /// Decode the document into a typed record.
    ///
    /// The document id is written into the record's `id` field when the data
    /// does not carry one, so records that store their id only as the
    /// document key still come back with it.
    pub fn decode<T: DeserializeOwned>(&self) -> FichesResult<T> {
        let mut data = self.data.clone();
        if let Value::Object(fields) = &mut data {
            let has_id = fields.get("id").is_some_and(|id| !id.is_null());
            if !has_id {
                fields.insert("id".to_string(), Value::String(self.id.clone()));
            }
        }

        serde_json::from_value(data).map_err(|e| {
            StorageError::Decode {
                collection: self.collection,
                id: self.id.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Raw value of a top-level field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

// ============================================================================
// QUERY
// ============================================================================

/// Single-field filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field == value`
    Equals { field: String, value: Value },
    /// `field` is an array holding `value`
    ArrayContains { field: String, value: Value },
    /// `field` is one of `values`
    In { field: String, values: Vec<Value> },
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Filter::Equals { field, .. }
            | Filter::ArrayContains { field, .. }
            | Filter::In { field, .. } => field,
        }
    }

    /// Whether a document's data satisfies the filter.
    pub fn matches(&self, data: &Value) -> bool {
        match self {
            Filter::Equals { field, value } => data.get(field) == Some(value),
            Filter::ArrayContains { field, value } => data
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
            Filter::In { field, values } => data
                .get(field)
                .is_some_and(|actual| values.contains(actual)),
        }
    }
}

/// A filter plus an optional result limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub limit: Option<usize>,
}

impl Query {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter: Filter::Equals {
                field: field.into(),
                value: value.into(),
            },
            limit: None,
        }
    }

    pub fn array_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter: Filter::ArrayContains {
                field: field.into(),
                value: value.into(),
            },
            limit: None,
        }
    }

    pub fn one_of<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            filter: Filter::In {
                field: field.into(),
                values: values.into_iter().map(Into::into).collect(),
            },
            limit: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Reject queries no backend can answer meaningfully.
    pub fn validate(&self, collection: Collection) -> FichesResult<()> {
        if self.filter.field().is_empty() {
            return Err(StorageError::QueryFailed {
                collection,
                reason: "filter field is empty".to_string(),
            }
            .into());
        }
        if let Filter::In { values, .. } = &self.filter {
            if values.is_empty() {
                return Err(StorageError::QueryFailed {
                    collection,
                    reason: "'in' filter requires at least one value".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

// ============================================================================
// FIELD UPDATE
// ============================================================================

/// Top-level fields to overwrite on one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdate {
    fields: Map<String, Value>,
}

impl FieldUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// The update as a JSON object, used as a merge patch.
    pub fn to_patch(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Merge the update into a document's data.
    pub fn apply_to(&self, data: &mut Value) {
        if !data.is_object() {
            *data = Value::Object(Map::new());
        }
        if let Value::Object(target) = data {
            for (field, value) in &self.fields {
                target.insert(field.clone(), value.clone());
            }
        }
    }
}

impl From<Map<String, Value>> for FieldUpdate {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
