//! Firestore REST adapter.
//!
//! # Endpoints
//!
//! All paths are relative to `{origin}/v1/projects/{project}/databases/{db}`:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list      | `GET documents/{collection}?pageSize=300&pageToken=…` |
//! | get       | `GET documents/{collection}/{id}` |
//! | create    | `POST documents/{collection}` |
//! | update    | `PATCH documents/{collection}/{id}?updateMask.fieldPaths=…&currentDocument.exists=true` |
//! | delete    | `DELETE documents/{collection}/{id}` |
//! | commit    | `POST documents:commit` |
//!
//! The REST surface has no push channel, so [`watch`](DocumentStore::watch)
//! is served by a background poller per subscription. Writes made through
//! this adapter wake the pollers early so a writer sees its own change without
//! waiting for the next tick.
//!
//! # Authentication
//!
//! Requests carry `Authorization: Bearer <idToken>` from [`IdentityClient`].
//! Against the emulator (`FIRESTORE_EMULATOR_HOST`) the adapter uses plain
//! HTTP and the emulator's `owner` token instead.

mod auth;
pub mod value;
mod wire;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use tokio::sync::{Notify, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};
use url::Url;

pub use auth::{
    AuthError, IDENTITY_TOOLKIT_URL, IdentityClient, IdentityEndpoints, SECURE_TOKEN_URL,
    SignInMethod,
};

use crate::config::FirestoreConfig;
use crate::document::{Document, Fields, Precondition, Snapshot, Write};
use crate::error::StoreError;
use crate::port::DocumentStore;
use value::encode_fields;
use wire::{
    CommitRequest, DocumentBody, DocumentMask, ErrorBody, ListResponse, NamedDocument,
    WireDocument, WirePrecondition, WireWrite,
};

/// Production Firestore origin.
pub const FIRESTORE_ORIGIN: &str = "https://firestore.googleapis.com";

/// Documents requested per list page.
const PAGE_SIZE: &str = "300";

/// Client-side timeout for every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Firestore-backed [`DocumentStore`].
#[derive(Clone)]
pub struct FirestoreStore {
    inner: Arc<FirestoreStoreInner>,
}

struct FirestoreStoreInner {
    client: reqwest::Client,
    origin: Url,
    project_id: String,
    database_id: String,
    credentials: Credentials,
    poll_interval: Duration,
    writes: Notify,
}

enum Credentials {
    Emulator,
    Identity(IdentityClient),
}

impl FirestoreStore {
    /// Create an adapter from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the HTTP client cannot be built, or
    /// [`StoreError::Unavailable`] if the emulator host is not a valid origin.
    pub fn new(config: &FirestoreConfig, poll_interval: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let (origin, credentials) = if let Some(host) = &config.emulator_host {
            (format!("http://{host}"), Credentials::Emulator)
        } else {
            let method = config
                .initial_auth_token
                .clone()
                .map_or(SignInMethod::Anonymous, SignInMethod::CustomToken);
            let identity = IdentityClient::new(
                client.clone(),
                config.api_key.clone(),
                method,
                IdentityEndpoints::default(),
            );
            (FIRESTORE_ORIGIN.to_string(), Credentials::Identity(identity))
        };

        let origin = Url::parse(&origin)
            .map_err(|e| StoreError::Unavailable(format!("invalid origin {origin}: {e}")))?;

        Ok(Self::from_parts(
            client,
            origin,
            config,
            credentials,
            poll_interval,
        ))
    }

    fn from_parts(
        client: reqwest::Client,
        origin: Url,
        config: &FirestoreConfig,
        credentials: Credentials,
        poll_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(FirestoreStoreInner {
                client,
                origin,
                project_id: config.project_id.clone(),
                database_id: config.database_id.clone(),
                credentials,
                poll_interval,
                writes: Notify::new(),
            }),
        }
    }

    /// Sign in now instead of on the first request.
    ///
    /// Lets a binary report a bad API key or custom token at startup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Auth`] if sign-in fails.
    pub async fn sign_in(&self) -> Result<(), StoreError> {
        if let Credentials::Identity(identity) = &self.inner.credentials {
            identity.id_token().await?;
        }
        Ok(())
    }

    /// `projects/{p}/databases/{d}/documents/{path}`, the resource name used
    /// inside commit bodies.
    fn resource_name(&self, collection: &str, id: &str) -> String {
        format!(
            "projects/{}/databases/{}/documents/{collection}/{id}",
            self.inner.project_id, self.inner.database_id
        )
    }

    /// REST URL under the database root.
    ///
    /// `last` is appended verbatim as the final segment (`documents` or
    /// `documents:commit`), followed by the slash-separated `path`.
    fn url(&self, last: &str, path: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.inner.origin.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Unavailable("origin cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.inner.project_id.as_str(),
                "databases",
                self.inner.database_id.as_str(),
                last,
            ])
            .extend(path.iter().flat_map(|p| p.split('/')));
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let request = match &self.inner.credentials {
            Credentials::Emulator => request.bearer_auth("owner"),
            Credentials::Identity(identity) => {
                let token = identity.id_token().await?;
                request.bearer_auth(token.expose_secret())
            }
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED
            && let Credentials::Identity(identity) = &self.inner.credentials
        {
            identity.invalidate().await;
        }

        let body = response.text().await.unwrap_or_default();
        let err = status_error(status, &body);
        if matches!(err, StoreError::Status { .. } | StoreError::Unavailable(_)) {
            error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Firestore returned non-success status"
            );
        }
        Err(err)
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse Firestore response"
            );
            StoreError::Parse(e)
        })
    }

    fn wrote(&self) {
        self.inner.writes.notify_waiters();
    }

    async fn poll(self, collection: String, sender: watch::Sender<Snapshot>) {
        let mut ticker = tokio::time::interval(self.inner.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                () = sender.closed() => break,
                _ = ticker.tick() => {}
                () = self.inner.writes.notified() => {}
            }

            match self.list(&collection).await {
                Ok(documents) => {
                    let changed = sender.send_if_modified(|snapshot| {
                        if *snapshot.documents == documents {
                            return false;
                        }
                        *snapshot = Snapshot::new(snapshot.sequence + 1, documents);
                        true
                    });
                    if changed {
                        debug!(collection = %collection, "Published new snapshot");
                    }
                }
                Err(e) => warn!(collection = %collection, error = %e, "Snapshot poll failed"),
            }
        }

        debug!(collection = %collection, "Snapshot poller stopped");
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url("documents", &[collection])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", PAGE_SIZE);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self.send(self.inner.client.get(url)).await?;
            let page: ListResponse = Self::parse(response).await?;

            for wire in page.documents {
                match wire.into_document() {
                    Ok(document) => documents.push(document),
                    Err(e) => warn!(collection = %collection, error = %e, "Skipping document"),
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.url("documents", &[collection, id])?;
        match self.send(self.inner.client.get(url)).await {
            Ok(response) => {
                let wire: WireDocument = Self::parse(response).await?;
                wire.into_document().map(Some)
            }
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError> {
        let url = self.url("documents", &[collection])?;
        let body = DocumentBody {
            fields: encode_fields(&fields),
        };
        let response = self.send(self.inner.client.post(url).json(&body)).await?;
        let wire: WireDocument = Self::parse(response).await?;
        self.wrote();
        wire.into_document()
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut url = self.url("documents", &[collection, id])?;
        {
            let mut query = url.query_pairs_mut();
            for field in fields.keys() {
                query.append_pair("updateMask.fieldPaths", field);
            }
            query.append_pair("currentDocument.exists", "true");
        }
        let body = DocumentBody {
            fields: encode_fields(&fields),
        };
        self.send(self.inner.client.patch(url).json(&body)).await?;
        self.wrote();
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.url("documents", &[collection, id])?;
        match self.send(self.inner.client.delete(url)).await {
            Ok(_) | Err(StoreError::NotFound(_)) => {
                self.wrote();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        let request = CommitRequest {
            writes: writes.iter().map(|w| self.wire_write(w)).collect(),
        };
        let url = self.url("documents:commit", &[])?;

        match self.send(self.inner.client.post(url).json(&request)).await {
            Ok(_) => {
                self.wrote();
                Ok(())
            }
            // `exists: true` on a missing document is reported as NOT_FOUND.
            Err(StoreError::NotFound(message)) => Err(StoreError::Conflict(message)),
            Err(e) => Err(e),
        }
    }

    async fn watch(&self, collection: &str) -> Result<watch::Receiver<Snapshot>, StoreError> {
        let initial = self.list(collection).await?;
        let (sender, receiver) = watch::channel(Snapshot::new(1, initial));
        tokio::spawn(self.clone().poll(collection.to_owned(), sender));
        Ok(receiver)
    }
}

impl FirestoreStore {
    fn wire_write(&self, write: &Write) -> WireWrite {
        match write {
            Write::Create {
                collection,
                id,
                fields,
            } => WireWrite {
                update: Some(NamedDocument {
                    name: self.resource_name(collection, id),
                    fields: encode_fields(fields),
                }),
                current_document: Some(WirePrecondition {
                    exists: Some(false),
                    ..WirePrecondition::default()
                }),
                ..WireWrite::default()
            },
            Write::Update {
                collection,
                id,
                fields,
                precondition,
            } => WireWrite {
                update: Some(NamedDocument {
                    name: self.resource_name(collection, id),
                    fields: encode_fields(fields),
                }),
                update_mask: Some(DocumentMask {
                    field_paths: fields.keys().cloned().collect(),
                }),
                current_document: Some(match precondition {
                    Precondition::Exists => WirePrecondition {
                        exists: Some(true),
                        ..WirePrecondition::default()
                    },
                    Precondition::Revision(revision) => WirePrecondition {
                        update_time: Some(revision.as_str().to_owned()),
                        ..WirePrecondition::default()
                    },
                }),
                ..WireWrite::default()
            },
            Write::Delete { collection, id } => WireWrite {
                delete: Some(self.resource_name(collection, id)),
                ..WireWrite::default()
            },
        }
    }
}

impl std::fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("origin", &self.inner.origin.as_str())
            .field("project_id", &self.inner.project_id)
            .field("database_id", &self.inner.database_id)
            .field(
                "emulator",
                &matches!(self.inner.credentials, Credentials::Emulator),
            )
            .finish_non_exhaustive()
    }
}

/// Map an error response to a [`StoreError`] using the canonical status in
/// the body where there is one.
fn status_error(status: StatusCode, body: &str) -> StoreError {
    let detail = serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.error);
    let canonical = detail.as_ref().map_or("", |d| d.status.as_str());
    let message = detail.as_ref().map_or_else(
        || body.chars().take(200).collect(),
        |d| d.message.clone(),
    );

    match (status, canonical) {
        (_, "FAILED_PRECONDITION" | "ABORTED" | "ALREADY_EXISTS") | (StatusCode::CONFLICT, _) => {
            StoreError::Conflict(message)
        }
        (StatusCode::NOT_FOUND, _) => StoreError::NotFound(message),
        (StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE, _) => {
            StoreError::Unavailable(message)
        }
        _ => StoreError::Status {
            code: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;
    use crate::document::{Revision, Value};

    const ROOT: &str = "/v1/projects/demo/databases/(default)";
    const PRODUCTS: &str = "artifacts/app/public/data/products";

    fn config(emulator_host: Option<String>) -> FirestoreConfig {
        FirestoreConfig {
            project_id: "demo".to_string(),
            database_id: "(default)".to_string(),
            api_key: Some(SecretString::from("key")),
            initial_auth_token: None,
            emulator_host,
        }
    }

    fn emulator(server: &MockServer) -> FirestoreStore {
        FirestoreStore::new(
            &config(Some(server.address().to_string())),
            Duration::from_millis(20),
        )
        .unwrap()
    }

    fn doc_json(id: &str, name: &str, update_time: &str) -> serde_json::Value {
        json!({
            "name": format!("projects/demo/databases/(default)/documents/{PRODUCTS}/{id}"),
            "fields": {
                "name": { "stringValue": name },
                "stock": { "integerValue": "3" }
            },
            "updateTime": update_time
        })
    }

    #[test]
    fn test_status_error_mapping() {
        let body = r#"{"error":{"code":400,"message":"stale","status":"FAILED_PRECONDITION"}}"#;
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, body),
            StoreError::Conflict(m) if m == "stale"
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "{}"),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            StoreError::Status { code: 500, .. }
        ));
    }

    #[tokio::test]
    async fn test_list_follows_page_tokens() {
        let server = MockServer::start_async().await;
        let second = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(format!("{ROOT}/documents/{PRODUCTS}"))
                    .query_param("pageToken", "page-2");
                then.status(200).json_body(json!({
                    "documents": [doc_json("b", "Banana", "t2")]
                }));
            })
            .await;

        let first = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(format!("{ROOT}/documents/{PRODUCTS}"))
                    .query_param("pageSize", "300")
                    .header("authorization", "Bearer owner");
                then.status(200).json_body(json!({
                    "documents": [doc_json("a", "Apple", "t1")],
                    "nextPageToken": "page-2"
                }));
            })
            .await;
        let documents = emulator(&server).list(PRODUCTS).await.unwrap();

        let ids: Vec<_> = documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(documents[1].revision, Revision::new("t2"));
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{ROOT}/documents/{PRODUCTS}/gone"));
                then.status(404).json_body(json!({
                    "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" }
                }));
            })
            .await;

        assert!(emulator(&server).get(PRODUCTS, "gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_posts_typed_fields() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("{ROOT}/documents/{PRODUCTS}"))
                    .json_body(json!({ "fields": {
                        "name": { "stringValue": "Mug" },
                        "stock": { "integerValue": "3" }
                    } }));
                then.status(200).json_body(doc_json("new-id", "Mug", "t1"));
            })
            .await;

        let fields = Fields::from([
            ("name".to_string(), Value::from("Mug")),
            ("stock".to_string(), Value::Integer(3)),
        ]);
        let doc = emulator(&server).create(PRODUCTS, fields).await.unwrap();

        assert_eq!(doc.id, "new-id");
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_sends_mask_and_exists_precondition() {
        let server = MockServer::start_async().await;
        let patch = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path(format!("{ROOT}/documents/{PRODUCTS}/p1"))
                    .query_param("updateMask.fieldPaths", "stock")
                    .query_param("currentDocument.exists", "true");
                then.status(200).json_body(doc_json("p1", "Mug", "t2"));
            })
            .await;

        emulator(&server)
            .update(
                PRODUCTS,
                "p1",
                Fields::from([("stock".to_string(), Value::Integer(0))]),
            )
            .await
            .unwrap();
        patch.assert_async().await;
    }

    #[tokio::test]
    async fn test_commit_failed_precondition_is_conflict() {
        let server = MockServer::start_async().await;
        let commit = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("{ROOT}/documents:commit"))
                    .body_contains(r#""currentDocument":{"exists":false}"#)
                    .body_contains(r#""currentDocument":{"updateTime":"t1"}"#)
                    .body_contains(r#""updateMask":{"fieldPaths":["stock"]}"#);
                then.status(400).json_body(json!({
                    "error": { "code": 400, "message": "update time mismatch", "status": "FAILED_PRECONDITION" }
                }));
            })
            .await;

        let err = emulator(&server)
            .commit(vec![
                Write::Create {
                    collection: "orders".to_string(),
                    id: "o1".to_string(),
                    fields: Fields::new(),
                },
                Write::Update {
                    collection: PRODUCTS.to_string(),
                    id: "p1".to_string(),
                    fields: Fields::from([("stock".to_string(), Value::Integer(2))]),
                    precondition: Precondition::Revision(Revision::new("t1")),
                },
            ])
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        commit.assert_async().await;
    }

    #[tokio::test]
    async fn test_watch_publishes_initial_snapshot() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{ROOT}/documents/{PRODUCTS}"));
                then.status(200).json_body(json!({
                    "documents": [doc_json("a", "Apple", "t1")]
                }));
            })
            .await;

        let rx = emulator(&server).watch(PRODUCTS).await.unwrap();
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.sequence, 1);
        assert_eq!(snapshot.documents.len(), 1);
    }

    #[tokio::test]
    async fn test_identity_token_is_sent_as_bearer() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/identity/accounts:signUp");
                then.status(200).json_body(json!({
                    "idToken": "id-123",
                    "refreshToken": "r",
                    "expiresIn": "3600",
                    "localId": "anon"
                }));
            })
            .await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(format!("{ROOT}/documents/{PRODUCTS}"))
                    .header("authorization", "Bearer id-123");
                then.status(200).json_body(json!({}));
            })
            .await;

        let client = reqwest::Client::new();
        let identity = IdentityClient::new(
            client.clone(),
            Some(SecretString::from("key")),
            SignInMethod::Anonymous,
            IdentityEndpoints {
                identity_toolkit: server.url("/identity"),
                secure_token: server.url("/securetoken"),
            },
        );
        let store = FirestoreStore::from_parts(
            client,
            Url::parse(&server.base_url()).unwrap(),
            &config(None),
            Credentials::Identity(identity),
            Duration::from_secs(60),
        );

        assert!(store.list(PRODUCTS).await.unwrap().is_empty());
        list.assert_async().await;
    }
}
