//! Firestore over its REST API.
//!
//! JSON values are mapped to Firestore's typed values on the way in and
//! flattened back to plain JSON on the way out. Timestamps, references and
//! bytes come back as strings.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::{Document, DocumentStore, DocumentWrite};
use crate::config::GcpConfig;

const PAGE_SIZE: &str = "300";

/// A Firestore database reached through `firestore.googleapis.com` or the emulator.
pub struct Firestore {
    client: reqwest::Client,
    base_url: String,
    database: String,
    access_token: Option<String>,
}

impl Firestore {
    pub fn new(config: &GcpConfig) -> Self {
        Self::with_base_url(&config.firestore_base(), config)
    }

    pub fn with_base_url(base: &str, config: &GcpConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base.trim_end_matches('/').to_string(),
            database: format!("projects/{}/databases/(default)", config.project_id),
            access_token: config.access_token.clone(),
        }
    }

    /// Full resource name of a document.
    pub fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{}/{}", self.database, collection.trim_matches('/'), id)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn encode_write(&self, write: &DocumentWrite) -> Value {
        let mut encoded = json!({
            "update": {
                "name": self.document_name(&write.collection, &write.id),
                "fields": encode_fields(&write.data),
            }
        });
        if write.merge {
            let paths: Vec<String> = write.data.keys().map(|k| quote_field_path(k)).collect();
            encoded["updateMask"] = json!({ "fieldPaths": paths });
        }
        if !write.server_timestamps.is_empty() {
            let transforms: Vec<Value> = write
                .server_timestamps
                .iter()
                .map(|field| {
                    json!({
                        "fieldPath": quote_field_path(field),
                        "setToServerValue": "REQUEST_TIME",
                    })
                })
                .collect();
            encoded["updateTransforms"] = Value::Array(transforms);
        }
        encoded
    }
}

#[async_trait]
impl DocumentStore for Firestore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let url = format!(
            "{}/v1/{}/documents/{}",
            self.base_url,
            self.database,
            collection.trim_matches('/')
        );
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }
            let page_url = reqwest::Url::parse_with_params(&url, &params)
                .with_context(|| format!("invalid collection URL: {url}"))?;

            let resp = self.authorize(self.client.get(page_url)).send().await?;
            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                bail!("Firestore list {collection} failed ({status}): {text}");
            }

            let page: ListResponse = resp.json().await?;
            debug!(collection, count = page.documents.len(), "listed page");
            for doc in page.documents {
                documents.push(Document {
                    id: doc.name.rsplit('/').next().unwrap_or_default().to_string(),
                    data: decode_fields(&doc.fields),
                });
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    async fn commit(&self, writes: &[DocumentWrite]) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        let url = format!("{}/v1/{}/documents:commit", self.base_url, self.database);
        let body = json!({
            "writes": writes.iter().map(|w| self.encode_write(w)).collect::<Vec<_>>(),
        });

        let resp = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Firestore commit of {} writes failed ({status}): {text}", writes.len());
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Encode a plain JSON object as Firestore `fields`.
pub fn encode_fields(data: &Map<String, Value>) -> Value {
    Value::Object(
        data.iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

/// Encode one JSON value as a Firestore typed value.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Decode Firestore `fields` into a plain JSON object.
pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}

/// Decode one Firestore typed value. Unknown shapes decode to `null`.
pub fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => match inner {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            Value::Number(n) => Value::Number(n.clone()),
            _ => Value::Null,
        },
        "doubleValue" => inner
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" | "geoPointValue" => {
            inner.clone()
        }
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

/// Quote a field name for use in a field path when it is not a plain identifier.
pub fn quote_field_path(field: &str) -> String {
    let mut chars = field.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        return field.to_string();
    }
    let escaped = field.replace('\\', "\\\\").replace('`', "\\`");
    format!("`{escaped}`")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GcpConfig {
        GcpConfig {
            project_id: "shadow".to_string(),
            access_token: Some("tok".to_string()),
            emulator_host: None,
        }
    }

    #[test]
    fn document_name_is_fully_qualified() {
        let fs = Firestore::new(&config());
        assert_eq!(
            fs.document_name("schools/Obu-high/materials", "L1_A_x"),
            "projects/shadow/databases/(default)/documents/schools/Obu-high/materials/L1_A_x"
        );
    }

    #[test]
    fn encode_scalars() {
        assert_eq!(encode_value(&json!("a")), json!({"stringValue": "a"}));
        assert_eq!(encode_value(&json!(true)), json!({"booleanValue": true}));
        assert_eq!(encode_value(&json!(7)), json!({"integerValue": "7"}));
        assert_eq!(encode_value(&json!(1.5)), json!({"doubleValue": 1.5}));
        assert_eq!(encode_value(&Value::Null), json!({"nullValue": null}));
    }

    #[test]
    fn encode_nested() {
        let encoded = encode_value(&json!({"paths": {"audio": "a.wav"}, "tags": ["x"]}));
        assert_eq!(
            encoded,
            json!({"mapValue": {"fields": {
                "paths": {"mapValue": {"fields": {"audio": {"stringValue": "a.wav"}}}},
                "tags": {"arrayValue": {"values": [{"stringValue": "x"}]}}
            }}})
        );
    }

    #[test]
    fn decode_typed_values() {
        let fields = json!({
            "id": {"stringValue": "L1"},
            "count": {"integerValue": "12"},
            "ratio": {"doubleValue": 0.5},
            "visible": {"booleanValue": true},
            "copiedAt": {"timestampValue": "2025-01-01T00:00:00Z"},
            "empty": {"arrayValue": {}},
            "nested": {"mapValue": {"fields": {"n": {"nullValue": null}}}}
        });
        let decoded = decode_fields(fields.as_object().unwrap());
        assert_eq!(
            Value::Object(decoded),
            json!({
                "id": "L1",
                "count": 12,
                "ratio": 0.5,
                "visible": true,
                "copiedAt": "2025-01-01T00:00:00Z",
                "empty": [],
                "nested": {"n": null}
            })
        );
    }

    #[test]
    fn decode_unknown_is_null() {
        assert_eq!(decode_value(&json!({"weirdValue": 1})), Value::Null);
        assert_eq!(decode_value(&json!("bare")), Value::Null);
    }

    #[test]
    fn quote_plain_and_special_fields() {
        assert_eq!(quote_field_path("copiedAt"), "copiedAt");
        assert_eq!(quote_field_path("_x1"), "_x1");
        assert_eq!(quote_field_path("1abc"), "`1abc`");
        assert_eq!(quote_field_path("a-b"), "`a-b`");
        assert_eq!(quote_field_path("a`b"), "`a\\`b`");
    }

    #[test]
    fn merge_write_has_mask_and_transform() {
        let fs = Firestore::new(&config());
        let data = json!({"enabled": true}).as_object().cloned().unwrap();
        let write = DocumentWrite::set("materials", "m1", data)
            .merge()
            .server_timestamp("copiedAt");
        let encoded = fs.encode_write(&write);
        assert_eq!(encoded["updateMask"], json!({"fieldPaths": ["enabled"]}));
        assert_eq!(
            encoded["updateTransforms"],
            json!([{"fieldPath": "copiedAt", "setToServerValue": "REQUEST_TIME"}])
        );
        assert_eq!(
            encoded["update"]["fields"],
            json!({"enabled": {"booleanValue": true}})
        );
    }

    #[test]
    fn plain_write_has_no_mask() {
        let fs = Firestore::new(&config());
        let encoded = fs.encode_write(&DocumentWrite::set("c", "d", Map::new()));
        assert!(encoded.get("updateMask").is_none());
        assert!(encoded.get("updateTransforms").is_none());
    }
}
