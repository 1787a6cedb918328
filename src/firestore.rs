//! Minimal Firestore REST client.
//!
//! Only what the event log needs: a commit that creates a document with
//! server-assigned timestamps, a document read, and a masked patch. Plain JSON
//! is converted to and from Firestore's typed value representation at this
//! boundary so the rest of the crate works with `serde_json::Value`.

use crate::credentials::TokenSource;
use crate::error::StoreError;
use crate::event::EventType;
use crate::store::{StatsDocument, Store};
use async_trait::async_trait;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::{json, Map, Value};

const API_ROOT: &str = "https://firestore.googleapis.com/v1";
const AUTO_ID_LENGTH: usize = 20;

pub const EVENTS_COLLECTION: &str = "discordEvents";
pub const STATS_COLLECTION: &str = "discordStats";
pub const STATS_DOCUMENT: &str = "current";

pub struct Firestore {
    http: reqwest::Client,
    tokens: TokenSource,
    root: String,
    database: String,
}

impl Firestore {
    pub fn new(
        http: reqwest::Client,
        tokens: TokenSource,
        project_id: &str,
        emulator_host: Option<&str>,
    ) -> Self {
        let root = match emulator_host {
            Some(host) => format!("http://{}/v1", host),
            None => API_ROOT.to_string(),
        };

        Self {
            http,
            tokens,
            root,
            database: format!("projects/{}/databases/(default)", project_id),
        }
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{}/{}", self.database, collection, id)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.root, path)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StoreError> {
        let token = self.tokens.token().await?;
        let response = request.bearer_auth(token).send().await?;
        Ok(response)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status { status, body })
}

#[async_trait]
impl Store for Firestore {
    async fn append_event(&self, event_type: EventType, data: Value) -> Result<(), StoreError> {
        let name = self.document_name(EVENTS_COLLECTION, &auto_id());
        let body = create_with_server_timestamps(&name, event_type, &data);

        let request = self
            .http
            .post(self.url(&format!("{}/documents:commit", self.database)))
            .json(&body);
        check(self.send(request).await?).await?;

        tracing::debug!(document = %name, "appended event");
        Ok(())
    }

    async fn load_stats(&self) -> Result<Option<StatsDocument>, StoreError> {
        let name = self.document_name(STATS_COLLECTION, STATS_DOCUMENT);
        let response = self.send(self.http.get(self.url(&name))).await?;

        let status = response.status();
        let body = response.text().await?;
        parse_stats(status, &body)
    }

    async fn merge_stats(&self, stats: &StatsDocument) -> Result<(), StoreError> {
        let name = self.document_name(STATS_COLLECTION, STATS_DOCUMENT);
        let (mask, body) = merge_request(stats)?;

        let query: Vec<(&str, &str)> = mask
            .iter()
            .map(|field| ("updateMask.fieldPaths", field.as_str()))
            .collect();

        let request = self.http.patch(self.url(&name)).query(&query).json(&body);
        check(self.send(request).await?).await?;

        Ok(())
    }
}

/// Maps the stats document read to `None` when it was never written.
fn parse_stats(
    status: reqwest::StatusCode,
    body: &str,
) -> Result<Option<StatsDocument>, StoreError> {
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(StoreError::Status {
            status,
            body: body.to_string(),
        });
    }

    let document: Value = serde_json::from_str(body)?;
    let fields = match document.get("fields") {
        Some(Value::Object(fields)) => decode_fields(fields)?,
        Some(_) => return Err(StoreError::Malformed("`fields` is not a map".to_string())),
        None => Value::Object(Map::new()),
    };

    Ok(Some(serde_json::from_value(fields)?))
}

/// Update mask and PATCH body for a merge-write. The mask names exactly the
/// serialized fields, so an absent `botStatus` is left alone on the server.
fn merge_request(stats: &StatsDocument) -> Result<(Vec<String>, Value), StoreError> {
    let fields = match serde_json::to_value(stats)? {
        Value::Object(fields) => fields,
        _ => return Err(StoreError::Malformed("stats must serialize to a map".to_string())),
    };

    let mask = fields.keys().cloned().collect();
    Ok((mask, json!({ "fields": encode_fields(&fields) })))
}

/// Commit body creating `name` with `eventType`/`data`; `timestamp` and
/// `createdAt` are filled in with the commit time by the server.
fn create_with_server_timestamps(name: &str, event_type: EventType, data: &Value) -> Value {
    json!({
        "writes": [{
            "update": {
                "name": name,
                "fields": {
                    "eventType": encode_value(&json!(event_type.as_str())),
                    "data": encode_value(data),
                },
            },
            "currentDocument": { "exists": false },
            "updateTransforms": [
                { "fieldPath": "timestamp", "setToServerValue": "REQUEST_TIME" },
                { "fieldPath": "createdAt", "setToServerValue": "REQUEST_TIME" },
            ],
        }]
    })
}

/// Random document id in the same shape Firestore client libraries generate.
fn auto_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LENGTH)
        .map(char::from)
        .collect()
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(map: &Map<String, Value>) -> Value {
    Value::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

pub fn decode_fields(fields: &Map<String, Value>) -> Result<Value, StoreError> {
    let mut out = Map::with_capacity(fields.len());
    for (key, value) in fields {
        out.insert(key.clone(), decode_value(value)?);
    }
    Ok(Value::Object(out))
}

pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let (kind, inner) = value
        .as_object()
        .and_then(|map| map.iter().next())
        .ok_or_else(|| StoreError::Malformed(format!("not a typed value: {}", value)))?;

    match (kind.as_str(), inner) {
        ("nullValue", _) => Ok(Value::Null),
        ("booleanValue", Value::Bool(b)) => Ok(Value::Bool(*b)),
        ("integerValue", Value::String(s)) => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| StoreError::Malformed(format!("bad integerValue `{}`", s))),
        ("integerValue", Value::Number(n)) => Ok(Value::Number(n.clone())),
        ("doubleValue", Value::Number(n)) => Ok(Value::Number(n.clone())),
        ("stringValue", Value::String(s))
        | ("timestampValue", Value::String(s))
        | ("referenceValue", Value::String(s))
        | ("bytesValue", Value::String(s)) => Ok(Value::String(s.clone())),
        ("geoPointValue", point) => Ok(point.clone()),
        ("arrayValue", array) => match array.get("values") {
            Some(Value::Array(values)) => values
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => Ok(Value::Array(Vec::new())),
        },
        ("mapValue", map) => match map.get("fields") {
            Some(Value::Object(fields)) => decode_fields(fields),
            _ => Ok(Value::Object(Map::new())),
        },
        (kind, _) => Err(StoreError::Malformed(format!("unsupported value `{}`", kind))),
    }
}
