//! Firestore REST (v1) backend.
//!
//! Mutations go through `documents:commit` so the server can stamp
//! timestamps with `REQUEST_TIME` and enforce preconditions. `set_flagged`
//! is an optimistic read-then-write guarded by the document's `updateTime`.
//! Requests carry a fixed access token when one is configured, otherwise one
//! issued for the service account in the credentials file.

use super::token::ServiceAccountAuth;
use super::{RecordStore, FLAG_ATTEMPTS};
use crate::config::{Config, Credentials};
use crate::document::{bool_value, fields, string_value, Document, FieldValue};
use crate::error::{DeskError, Result};
use crate::types::Disposition;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PAGE_SIZE: &str = "300";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RestDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default, rename = "updateTime")]
    update_time: Option<String>,
}

impl RestDocument {
    fn into_document(self) -> Document {
        let id = self.name.rsplit('/').next().unwrap_or_default().to_string();
        Document {
            id,
            fields: self.fields,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RestDocument>,
    #[serde(default, rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

/// How a single REST call failed.
#[derive(Debug)]
enum CallError {
    NotFound,
    Precondition(String),
    Unavailable(String),
}

impl CallError {
    fn into_desk(self, id: &str) -> DeskError {
        match self {
            CallError::NotFound => DeskError::RecordNotFound(id.to_string()),
            CallError::Precondition(msg) | CallError::Unavailable(msg) => {
                DeskError::StoreUnavailable(msg)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

struct Connection {
    http: Client,
    /// `{endpoint}/v1/projects/{project}/databases/(default)`
    database_url: Url,
    /// `projects/{project}/databases/(default)/documents`
    documents_name: String,
    api_key: Option<String>,
    /// Fixed bearer token; wins over the service account.
    access_token: Option<String>,
    service_account: Option<ServiceAccountAuth>,
    collection: String,
}

impl Connection {
    fn open(config: &Config) -> Result<Self> {
        let creds = Credentials::load(&config.credentials_path)?;
        let service_account = match &config.access_token {
            Some(_) => None,
            None => ServiceAccountAuth::from_credentials(&creds).map_err(|e| {
                DeskError::StoreUnavailable(format!(
                    "credentials file '{}': {e}",
                    config.credentials_path.display()
                ))
            })?,
        };

        let mut database_url = Url::parse(config.endpoint()).map_err(|e| {
            DeskError::StoreUnavailable(format!("invalid endpoint '{}': {e}", config.endpoint()))
        })?;
        database_url
            .path_segments_mut()
            .map_err(|_| {
                DeskError::StoreUnavailable(format!(
                    "endpoint '{}' cannot carry a path",
                    config.endpoint()
                ))
            })?
            .pop_if_empty()
            .extend(["v1", "projects", creds.project_id.as_str(), "databases", "(default)"]);

        let mut builder = Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        let http = builder
            .build()
            .map_err(|e| DeskError::StoreUnavailable(format!("cannot build HTTP client: {e}")))?;

        tracing::debug!(
            project = %creds.project_id,
            collection = %config.collection,
            endpoint = %config.endpoint(),
            account = service_account.as_ref().map(|a| a.client_email()).unwrap_or("-"),
            "firestore connection ready"
        );

        Ok(Self {
            http,
            documents_name: format!("projects/{}/databases/(default)/documents", creds.project_id),
            database_url,
            api_key: creds.api_key.filter(|k| !k.trim().is_empty()),
            access_token: config.access_token.clone(),
            service_account,
            collection: config.collection.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.database_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        url
    }

    fn document_url(&self, id: &str) -> Url {
        self.url(&["documents", self.collection.as_str(), id])
    }

    fn document_name(&self, id: &str) -> String {
        format!("{}/{}/{}", self.documents_name, self.collection, id)
    }

    fn request(
        &self,
        method: Method,
        url: Url,
    ) -> std::result::Result<RequestBuilder, CallError> {
        let req = self.http.request(method, url);
        if let Some(token) = &self.access_token {
            return Ok(req.bearer_auth(token));
        }
        match &self.service_account {
            Some(auth) => {
                let token = auth
                    .token(&self.http)
                    .map_err(|e| CallError::Unavailable(format!("authenticate: {e}")))?;
                Ok(req.bearer_auth(token))
            }
            None => Ok(req),
        }
    }

    fn send(&self, req: RequestBuilder, what: &str) -> std::result::Result<Value, CallError> {
        let resp = req
            .send()
            .map_err(|e| CallError::Unavailable(format!("{what}: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| CallError::Unavailable(format!("{what}: reading response: {e}")))?;

        if status.is_success() {
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&body)
                .map_err(|e| CallError::Unavailable(format!("{what}: malformed response: {e}")));
        }

        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(env) => (env.error.status, env.error.message),
            Err(_) => (String::new(), body.trim().to_string()),
        };
        tracing::debug!(%status, code = %code, "{what} failed: {message}");

        if status == StatusCode::NOT_FOUND || code == "NOT_FOUND" {
            return Err(CallError::NotFound);
        }
        if matches!(status, StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED)
            || code == "FAILED_PRECONDITION"
            || code == "ABORTED"
        {
            return Err(CallError::Precondition(format!("{what}: {message}")));
        }
        Err(CallError::Unavailable(format!(
            "{what}: HTTP {status}: {message}"
        )))
    }

    fn get(&self, id: &str) -> std::result::Result<RestDocument, CallError> {
        let value = self.send(
            self.request(Method::GET, self.document_url(id))?,
            "read document",
        )?;
        serde_json::from_value(value)
            .map_err(|e| CallError::Unavailable(format!("read document: {e}")))
    }

    /// One update write through `documents:commit`.
    fn commit_update(
        &self,
        id: &str,
        update: Map<String, Value>,
        server_stamped: &[&str],
        precondition: Value,
    ) -> std::result::Result<(), CallError> {
        let mut mask: Vec<String> = update.keys().map(|k| field_path(k)).collect();
        mask.sort();
        let transforms: Vec<Value> = server_stamped
            .iter()
            .map(|f| json!({ "fieldPath": field_path(f), "setToServerValue": "REQUEST_TIME" }))
            .collect();

        let body = json!({
            "writes": [{
                "update": { "name": self.document_name(id), "fields": update },
                "updateMask": { "fieldPaths": mask },
                "updateTransforms": transforms,
                "currentDocument": precondition,
            }]
        });

        let url = self.url(&["documents:commit"]);
        self.send(self.request(Method::POST, url)?.json(&body), "commit")?;
        Ok(())
    }
}

/// Quote a field name for use in a field path when it is not a plain
/// identifier (`last flagged` → `` `last flagged` ``).
fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

// ---------------------------------------------------------------------------
// FirestoreStore
// ---------------------------------------------------------------------------

/// Connects lazily: credential and endpoint problems surface as
/// `StoreUnavailable` from the first call, and are retried on the next one.
pub struct FirestoreStore {
    config: Config,
    conn: Mutex<Option<Arc<Connection>>>,
}

impl FirestoreStore {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            conn: Mutex::new(None),
        }
    }

    fn connection(&self) -> Result<Arc<Connection>> {
        let mut slot = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        let conn = Arc::new(Connection::open(&self.config)?);
        *slot = Some(conn.clone());
        Ok(conn)
    }
}

impl RecordStore for FirestoreStore {
    fn describe(&self) -> String {
        format!("firestore:{}", self.config.collection)
    }

    fn list_documents(&self) -> Result<Vec<Document>> {
        let conn = self.connection()?;
        let mut docs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = conn.url(&["documents", conn.collection.as_str()]);
            {
                let mut q = url.query_pairs_mut();
                q.append_pair("pageSize", PAGE_SIZE);
                if let Some(token) = &page_token {
                    q.append_pair("pageToken", token);
                }
            }
            let value = conn
                .request(Method::GET, url)
                .and_then(|req| conn.send(req, "list documents"))
                .map_err(|e| match e {
                    // Empty collections list fine; 404 means the database itself is missing.
                    CallError::NotFound => DeskError::StoreUnavailable(format!(
                        "database for collection '{}' not found",
                        conn.collection
                    )),
                    other => other.into_desk(&conn.collection),
                })?;
            let page: ListResponse = serde_json::from_value(value)
                .map_err(|e| DeskError::StoreUnavailable(format!("list documents: {e}")))?;

            docs.extend(page.documents.into_iter().map(RestDocument::into_document));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) if page_token.as_deref() != Some(next.as_str()) => {
                    page_token = Some(next)
                }
                _ => break,
            }
        }

        tracing::debug!(count = docs.len(), collection = %conn.collection, "listed documents");
        Ok(docs)
    }

    fn get_document(&self, id: &str) -> Result<Document> {
        let conn = self.connection()?;
        conn.get(id)
            .map(RestDocument::into_document)
            .map_err(|e| e.into_desk(id))
    }

    fn put_document(&self, doc: &Document) -> Result<()> {
        let conn = self.connection()?;
        let body = json!({ "fields": doc.fields });
        conn.request(Method::PATCH, conn.document_url(&doc.id))
            .and_then(|req| conn.send(req.json(&body), "write document"))
            .map_err(|e| e.into_desk(&doc.id))?;
        tracing::info!(record = %doc.id, "document written");
        Ok(())
    }

    fn apply_action(&self, id: &str, action: Disposition) -> Result<()> {
        let conn = self.connection()?;
        let mut update = Map::new();
        update.insert(fields::ACTION_FIELD.into(), string_value(action.as_str()));
        update.insert(fields::FLAG_FIELD.into(), bool_value(false));

        conn.commit_update(
            id,
            update,
            &[fields::ACTION_TIMESTAMP_FIELD],
            json!({ "exists": true }),
        )
        .map_err(|e| match e {
            // The only precondition here is `exists`.
            CallError::Precondition(_) => DeskError::RecordNotFound(id.to_string()),
            other => other.into_desk(id),
        })?;
        tracing::info!(record = %id, %action, "action recorded");
        Ok(())
    }

    fn set_flagged(&self, id: &str) -> Result<()> {
        let conn = self.connection()?;

        for attempt in 1..=FLAG_ATTEMPTS {
            let current = conn.get(id).map_err(|e| e.into_desk(id))?;

            let mut update = Map::new();
            update.insert(fields::FLAG_FIELD.into(), bool_value(true));
            let action_ts = current
                .fields
                .get(fields::ACTION_TIMESTAMP_FIELD)
                .filter(|v| FieldValue::decode(v) != FieldValue::Null)
                .cloned();
            let server_stamped: &[&str] = match action_ts {
                Some(ts) => {
                    update.insert(fields::LAST_FLAGGED_FIELD.into(), ts);
                    &[]
                }
                None => &[fields::LAST_FLAGGED_FIELD, fields::ACTION_TIMESTAMP_FIELD],
            };
            let precondition = match &current.update_time {
                Some(t) => json!({ "updateTime": t }),
                None => json!({ "exists": true }),
            };

            match conn.commit_update(id, update, server_stamped, precondition) {
                Ok(()) => {
                    tracing::info!(record = %id, attempt, "flag raised");
                    return Ok(());
                }
                Err(CallError::Precondition(msg)) => {
                    tracing::warn!(record = %id, attempt, "record changed during flag update: {msg}");
                }
                Err(other) => return Err(other.into_desk(id)),
            }
        }

        Err(DeskError::FlagConflict(id.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
