use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::skip_serializing_none;
use tracing::debug;

use crate::{config::FirebaseConfig, error::StoreError};

const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

/// Firestore's typed value encoding, e.g. `{"timestampValue": "2025-06-01T00:00:00Z"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: Fields,
}

pub type Fields = BTreeMap<String, Value>;

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::StringValue(value.into())
    }

    pub fn timestamp(at: DateTime<Utc>) -> Self {
        Value::TimestampValue(at.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    /// Calendar dates are stored as UTC midnight.
    pub fn date(date: NaiveDate) -> Self {
        Value::timestamp(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::StringValue(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::BooleanValue(value) => Some(*value),
            _ => None,
        }
    }

    /// Numbers written by JavaScript clients come back as integers when
    /// they have no fractional part.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::DoubleValue(value) => Some(*value),
            Value::IntegerValue(raw) => raw.parse::<i64>().ok().map(|v| v as f64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::TimestampValue(raw) => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|at| at.with_timezone(&Utc)),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        self.as_timestamp().map(|at| at.date_naive())
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::ArrayValue(array) => Some(&array.values),
            _ => None,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Fields,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

impl Document {
    /// Last path segment of the resource name.
    pub fn id(&self) -> Option<&str> {
        self.name
            .as_deref()
            .and_then(|name| name.rsplit('/').next())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<Document>,
}

/// Thin REST client for one Firestore database.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    documents_url: Arc<String>,
    api_key: Arc<String>,
    bearer_token: Option<Arc<String>>,
}

impl FirestoreClient {
    pub fn new(http: Client, config: &FirebaseConfig) -> Self {
        let documents_url = format!(
            "{FIRESTORE_ENDPOINT}/projects/{}/databases/(default)/documents",
            config.project_id
        );
        Self {
            http,
            documents_url: Arc::new(documents_url),
            api_key: Arc::new(config.api_key.clone()),
            bearer_token: config.bearer_token.clone().map(Arc::new),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.documents_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.query(&[("key", self.api_key.as_str())]);
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }

    /// `Ok(None)` when the document does not exist.
    pub async fn get_document(&self, path: &str) -> Result<Option<Document>, StoreError> {
        debug!(path, "firestore get");
        let response = self
            .authorize(self.http.get(self.url(path)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document = check(response).await?.json::<Document>().await?;
        Ok(Some(document))
    }

    pub async fn list_ordered(
        &self,
        collection: &str,
        order_by: &str,
        descending: bool,
    ) -> Result<Vec<Document>, StoreError> {
        debug!(collection, order_by, "firestore runQuery");
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "orderBy": [{
                    "field": { "fieldPath": order_by },
                    "direction": if descending { "DESCENDING" } else { "ASCENDING" },
                }],
            }
        });
        let response = self
            .authorize(self.http.post(format!("{}:runQuery", self.documents_url)))
            .json(&body)
            .send()
            .await?;
        let items = check(response).await?.json::<Vec<RunQueryItem>>().await?;
        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }

    /// Returns the identifier the store assigned.
    pub async fn create_document(
        &self,
        collection: &str,
        fields: Fields,
    ) -> Result<String, StoreError> {
        debug!(collection, "firestore create");
        let document = Document {
            fields,
            ..Document::default()
        };
        let response = self
            .authorize(self.http.post(self.url(collection)))
            .json(&document)
            .send()
            .await?;
        let created = check(response).await?.json::<Document>().await?;
        created
            .id()
            .map(str::to_string)
            .ok_or_else(|| StoreError::Decode("created document has no name".into()))
    }

    /// Writes only the given fields; fails when the document does not exist.
    pub async fn patch_document(&self, path: &str, fields: Fields) -> Result<(), StoreError> {
        debug!(path, fields = fields.len(), "firestore patch");
        let mut query: Vec<(&str, String)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.clone()))
            .collect();
        query.push(("currentDocument.exists", "true".to_string()));
        let document = Document {
            fields,
            ..Document::default()
        };
        let response = self
            .authorize(self.http.patch(self.url(path)))
            .query(&query)
            .json(&document)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn delete_document(&self, path: &str) -> Result<(), StoreError> {
        debug!(path, "firestore delete");
        let response = self
            .authorize(self.http.delete(self.url(path)))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}
