// ==================== DOCUMENT STORE ====================
// Seam over the hosted document database. Every document lives in one of
// three collections and is keyed by the owner's uid.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Recommendations,
    UserData,
    Feedback,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Recommendations => "recommendations",
            Collection::UserData => "userData",
            Collection::Feedback => "feedback",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Combine the fields into the existing document instead of replacing it.
    pub merge: bool,
}

impl SetOptions {
    pub fn merge() -> Self {
        Self { merge: true }
    }

    #[cfg(test)]
    pub fn replace() -> Self {
        Self { merge: false }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Backend(String),

    #[error("malformed document {collection}/{key}: {source}")]
    Decode {
        collection: Collection,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("fields must serialize to an object: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads `collection/key`; an absent document is `Ok(None)`.
    async fn get_document(&self, collection: Collection, key: &str) -> Result<Option<Fields>, StoreError>;

    /// Writes `collection/key`, creating the document when it does not exist.
    async fn set_document(
        &self,
        collection: Collection,
        key: &str,
        fields: Fields,
        options: SetOptions,
    ) -> Result<(), StoreError>;
}

/// Converts a serializable record into top-level document fields.
pub fn to_fields<T: serde::Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!(
            "expected an object document, got {}",
            other
        ))),
    }
}

/// Decodes stored fields into a typed record.
pub fn from_fields<T: serde::de::DeserializeOwned>(
    collection: Collection,
    key: &str,
    fields: Fields,
) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(fields)).map_err(|source| StoreError::Decode {
        collection,
        key: key.to_string(),
        source,
    })
}

/// Process-local store used for development runs and tests.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<(Collection, String), Fields>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents held in `collection`.
    #[cfg(test)]
    pub fn count(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .map(|docs| docs.keys().filter(|(c, _)| *c == collection).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_document(&self, collection: Collection, key: &str) -> Result<Option<Fields>, StoreError> {
        let docs = self
            .documents
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))?;
        Ok(docs.get(&(collection, key.to_string())).cloned())
    }

    async fn set_document(
        &self,
        collection: Collection,
        key: &str,
        fields: Fields,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        let mut docs = self
            .documents
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))?;
        let slot = docs.entry((collection, key.to_string())).or_default();
        if !options.merge {
            slot.clear();
        }
        slot.extend(fields);
        Ok(())
    }
}
