use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::services::document_store::{Collection, DocumentStore, Fields, SetOptions, StoreError};
use crate::services::identity_service::FirebaseTokens;

/// Cloud Firestore over its REST API. This is the store the hosted
/// recommendation engine reads profiles from and writes course lists to.
///
/// Requests are authorized with the ID token of the document's owner; every
/// document is keyed by its owner's uid, so the key selects the token.
pub struct Firestore {
    client: reqwest::Client,
    documents_url: String,
    api_key: String,
    tokens: Arc<FirebaseTokens>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl Firestore {
    pub fn new(
        base_url: &str,
        project_id: &str,
        api_key: impl Into<String>,
        tokens: Arc<FirebaseTokens>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                base_url.trim_end_matches('/'),
                project_id
            ),
            api_key: api_key.into(),
            tokens,
        }
    }

    async fn request(&self, method: Method, collection: Collection, key: &str) -> Result<RequestBuilder, StoreError> {
        let url = format!("{}/{}/{}", self.documents_url, collection, urlencoding::encode(key));
        let request = self
            .client
            .request(method, url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(Duration::from_secs(10));

        match self.tokens.id_token(key).await {
            Ok(Some(token)) => Ok(request.bearer_auth(token)),
            Ok(None) => {
                log::debug!("No ID token for {}; sending {}/{} unauthenticated", key, collection, key);
                Ok(request)
            }
            Err(e) => Err(StoreError::Backend(format!("could not refresh ID token: {}", e))),
        }
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

async fn rejected(response: reqwest::Response) -> StoreError {
    let status = response.status();
    let message = response
        .json::<ErrorEnvelope>()
        .await
        .map(|e| e.error.message)
        .unwrap_or_else(|_| status.to_string());
    StoreError::Backend(format!("Firestore returned {}: {}", status, message))
}

/// Field path for `updateMask`; names outside `[A-Za-z_][A-Za-z0-9_]*` are
/// backtick-quoted.
fn field_path(name: &str) -> String {
    let simple = name.chars().next().map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn encode_fields(fields: Fields) -> Map<String, Value> {
    fields.into_iter().map(|(name, value)| (name, encode_value(value))).collect()
}

fn encode_value(value: Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.into_iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn decode_fields(fields: Map<String, Value>) -> Fields {
    fields.into_iter().map(|(name, value)| (name, decode_value(value))).collect()
}

fn decode_value(value: Value) -> Value {
    let Value::Object(typed) = value else {
        return Value::Null;
    };
    let Some((kind, inner)) = typed.into_iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "integerValue" => match inner {
            Value::String(text) => text.parse::<i64>().map(Value::from).unwrap_or(Value::String(text)),
            other => other,
        },
        "booleanValue" | "doubleValue" | "stringValue" | "timestampValue" | "referenceValue" | "bytesValue"
        | "geoPointValue" => inner,
        "arrayValue" => match inner.get("values") {
            Some(Value::Array(items)) => Value::Array(items.iter().cloned().map(decode_value).collect()),
            _ => Value::Array(Vec::new()),
        },
        "mapValue" => match inner {
            Value::Object(mut map) => match map.remove("fields") {
                Some(Value::Object(fields)) => Value::Object(decode_fields(fields)),
                _ => Value::Object(Map::new()),
            },
            _ => Value::Object(Map::new()),
        },
        _ => Value::Null,
    }
}

#[async_trait]
impl DocumentStore for Firestore {
    async fn get_document(&self, collection: Collection, key: &str) -> Result<Option<Fields>, StoreError> {
        let response = self
            .request(Method::GET, collection, key)
            .await?
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let document: FirestoreDocument = response.json().await.map_err(transport)?;
        Ok(Some(decode_fields(document.fields)))
    }

    async fn set_document(
        &self,
        collection: Collection,
        key: &str,
        fields: Fields,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        let mut request = self.request(Method::PATCH, collection, key).await?;

        if options.merge {
            // without a mask PATCH replaces the whole document
            if fields.is_empty() && self.get_document(collection, key).await?.is_some() {
                return Ok(());
            }
            let mask: Vec<(&str, String)> = fields
                .keys()
                .map(|name| ("updateMask.fieldPaths", field_path(name)))
                .collect();
            request = request.query(&mask);
        }

        let response = request
            .json(&json!({ "fields": encode_fields(fields) }))
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        log::debug!("Stored {}/{} in Firestore (merge: {})", collection, key, options.merge);
        Ok(())
    }
}
