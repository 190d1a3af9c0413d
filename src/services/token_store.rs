// src/services/token_store.rs
use async_trait::async_trait;
use firebase_rs::{Firebase, RequestError};
use futures::{Stream, TryStreamExt, stream};
use serde::Deserialize;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};

use crate::{
    errors::{NotifyError as AppError, NotifyResult},
    models::recipient::RecipientRecord,
    services::access_token::AccessTokenProvider,
};

/// Unfiltered read of every stored recipient record.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn fetch_records(&self) -> NotifyResult<Vec<RecipientRecord>>;
}

#[derive(Clone)]
pub struct FirestoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub collection: String,
    /// `None` talks to the emulator without credentials
    pub auth: Option<Arc<dyn AccessTokenProvider>>,
    pub page_size: u32,
}

/// Cloud Firestore REST `documents.list`, following `nextPageToken` to the end.
pub struct FirestoreTokenStore {
    config: FirestoreConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsPage {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: HashMap<String, FirestoreValue>,
}

// Only the string variant carries a token; other value kinds are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirestoreValue {
    string_value: Option<String>,
}

impl FirestoreDocument {
    fn into_record(mut self) -> RecipientRecord {
        RecipientRecord {
            token: self.fields.remove("token").and_then(|value| value.string_value),
        }
    }
}

impl ListDocumentsPage {
    /// Records on this page and the cursor for the next one, if any
    fn into_parts(self) -> (Vec<RecipientRecord>, Option<String>) {
        let records = self
            .documents
            .into_iter()
            .map(FirestoreDocument::into_record)
            .collect();
        let next = self.next_page_token.filter(|token| !token.is_empty());
        (records, next)
    }
}

impl FirestoreTokenStore {
    pub fn new(config: FirestoreConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.project_id,
            self.config.collection
        )
    }

    async fn fetch_page(&self, page_token: Option<&str>) -> NotifyResult<ListDocumentsPage> {
        let mut request = self
            .client
            .get(self.collection_url())
            .query(&[("pageSize", self.config.page_size.to_string())]);

        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }
        if let Some(auth) = &self.config.auth {
            request = request.bearer_auth(auth.access_token().await?);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Firestore list request failed: {} {}", status, error_text);
            return Err(AppError::FirestoreQuery(format!("{}: {}", status, error_text)));
        }

        Ok(response.json::<ListDocumentsPage>().await?)
    }

    /// One item per page, in the order Firestore hands them out
    fn pages(&self) -> impl Stream<Item = NotifyResult<Vec<RecipientRecord>>> + '_ {
        // `None` once the last page has been read; `Some(None)` is the first request
        stream::try_unfold(Some(None::<String>), move |cursor| async move {
            let Some(page_token) = cursor else {
                return Ok::<_, AppError>(None);
            };

            let page = self.fetch_page(page_token.as_deref()).await?;
            let (records, next) = page.into_parts();
            tracing::debug!("Fetched {} token documents", records.len());

            Ok::<_, AppError>(Some((records, next.map(Some))))
        })
    }
}

#[async_trait]
impl TokenStore for FirestoreTokenStore {
    async fn fetch_records(&self) -> NotifyResult<Vec<RecipientRecord>> {
        self.pages().try_concat().await
    }
}

/// Firebase Realtime Database node holding one child per device
pub struct RealtimeDbTokenStore {
    root: Firebase,
    collection: String,
}

impl RealtimeDbTokenStore {
    pub fn new(database_url: &str, auth_key: Option<&str>, collection: String) -> NotifyResult<Self> {
        let root = match auth_key {
            Some(key) => Firebase::auth(database_url, key),
            None => Firebase::new(database_url),
        }
        .map_err(|e| AppError::ConfigurationError(format!("Invalid Firebase database URL: {:?}", e)))?;

        Ok(Self { root, collection })
    }
}

#[async_trait]
impl TokenStore for RealtimeDbTokenStore {
    async fn fetch_records(&self) -> NotifyResult<Vec<RecipientRecord>> {
        match self.root.at(&self.collection).get::<Value>().await {
            Ok(node) => Ok(records_from_node(node)),
            // An empty node reads back as null
            Err(RequestError::NotFoundOrNullBody) => Ok(Vec::new()),
            Err(err) => Err(AppError::FirebaseDatabase(format!("{:?}", err))),
        }
    }
}

fn records_from_node(node: Value) -> Vec<RecipientRecord> {
    let children: Vec<Value> = match node {
        Value::Object(map) => map.into_iter().map(|(_, child)| child).collect(),
        Value::Array(items) => items,
        _ => Vec::new(),
    };

    children.into_iter().map(record_from_child).collect()
}

fn record_from_child(child: Value) -> RecipientRecord {
    let token = match child {
        Value::String(token) => Some(token),
        Value::Object(mut fields) => match fields.remove("token") {
            Some(Value::String(token)) => Some(token),
            _ => None,
        },
        _ => None,
    };

    RecipientRecord { token }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{cargo::CargoRequest, dispatch::DispatchKind},
        services::{
            access_token::StaticAccessToken,
            dispatcher::{NotificationDispatcher, tests::RecordingPushSender},
        },
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const COLLECTION_PATH: &str = "/v1/projects/demo/databases/(default)/documents/userFcmTokens";

    fn store_for(server: &MockServer, auth: Option<Arc<dyn AccessTokenProvider>>) -> FirestoreTokenStore {
        FirestoreTokenStore::new(FirestoreConfig {
            base_url: server.uri(),
            project_id: "demo".to_string(),
            collection: "userFcmTokens".to_string(),
            auth,
            page_size: 1,
        })
    }

    fn token_doc(id: &str, token: Option<&str>) -> serde_json::Value {
        let fields = match token {
            Some(token) => json!({ "token": { "stringValue": token } }),
            None => json!({ "uid": { "stringValue": id } }),
        };
        json!({
            "name": format!("projects/demo/databases/(default)/documents/userFcmTokens/{}", id),
            "fields": fields
        })
    }

    // Hands out a new token on every call, like a provider across an expiry
    struct RotatingToken {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AccessTokenProvider for RotatingToken {
        async fn access_token(&self) -> NotifyResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("token-{}", n))
        }
    }

    #[tokio::test]
    async fn test_firestore_follows_page_tokens() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(COLLECTION_PATH))
            .and(query_param("pageSize", "1"))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [token_doc("a", Some("tokA"))],
                "nextPageToken": "cursor-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(COLLECTION_PATH))
            .and(query_param("pageToken", "cursor-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [token_doc("b", None), token_doc("c", Some("tokB"))]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = store_for(&server, None).fetch_records().await.unwrap();

        assert_eq!(
            records,
            vec![
                RecipientRecord::new("tokA"),
                RecipientRecord::without_token(),
                RecipientRecord::new("tokB"),
            ]
        );

        // No credentials configured, no Authorization header
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.headers.get("authorization").is_none()));
    }

    #[tokio::test]
    async fn test_firestore_sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(COLLECTION_PATH))
            .and(header("authorization", "Bearer ya29.local"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [token_doc("a", Some("tokA"))]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth: Arc<dyn AccessTokenProvider> = Arc::new(StaticAccessToken("ya29.local".to_string()));
        let records = store_for(&server, Some(auth)).fetch_records().await.unwrap();

        assert_eq!(records, vec![RecipientRecord::new("tokA")]);
    }

    #[tokio::test]
    async fn test_firestore_asks_for_a_token_on_every_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(COLLECTION_PATH))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [token_doc("a", Some("tokA"))],
                "nextPageToken": "cursor-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(COLLECTION_PATH))
            .and(header("authorization", "Bearer token-2"))
            .and(query_param("pageToken", "cursor-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [token_doc("b", Some("tokB"))]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = Arc::new(RotatingToken {
            calls: AtomicUsize::new(0),
        });
        let provider: Arc<dyn AccessTokenProvider> = auth.clone();
        let store = store_for(&server, Some(provider));
        let records = store.fetch_records().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(auth.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_firestore_error_status_reaches_dispatch_result() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(COLLECTION_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
            .mount(&server)
            .await;

        let sender = Arc::new(RecordingPushSender::default());
        let dispatcher = NotificationDispatcher::new(Arc::new(store_for(&server, None)), sender.clone());

        let result = dispatcher.dispatch(&CargoRequest::default()).await;

        assert!(!result.success);
        assert_eq!(result.kind, DispatchKind::UpstreamFailure);
        assert_eq!(result.message, "Firestore query error: 403 Forbidden: PERMISSION_DENIED");
        assert!(sender.calls().is_empty());
    }

    #[tokio::test]
    async fn test_firestore_unknown_collection_is_a_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = store_for(&server, None).fetch_records().await.unwrap_err();
        assert_eq!(err.to_string(), "Firestore query error: 404 Not Found: ");
    }

    #[test]
    fn test_firestore_page_parsing() {
        let page: ListDocumentsPage = serde_json::from_value(json!({
            "documents": [
                {
                    "name": "projects/p/databases/(default)/documents/userFcmTokens/a",
                    "fields": { "token": { "stringValue": "tokA" } }
                },
                {
                    "name": "projects/p/databases/(default)/documents/userFcmTokens/b",
                    "fields": { "token": { "nullValue": null } }
                },
                {
                    "name": "projects/p/databases/(default)/documents/userFcmTokens/c",
                    "fields": { "uid": { "stringValue": "u3" } }
                },
                {
                    "name": "projects/p/databases/(default)/documents/userFcmTokens/d"
                }
            ],
            "nextPageToken": "cursor-2"
        }))
        .unwrap();

        let (records, next) = page.into_parts();
        assert_eq!(
            records,
            vec![
                RecipientRecord::new("tokA"),
                RecipientRecord::without_token(),
                RecipientRecord::without_token(),
                RecipientRecord::without_token(),
            ]
        );
        assert_eq!(next.as_deref(), Some("cursor-2"));
    }

    #[test]
    fn test_firestore_empty_collection() {
        let page: ListDocumentsPage = serde_json::from_value(json!({})).unwrap();
        let (records, next) = page.into_parts();

        assert!(records.is_empty());
        assert!(next.is_none());
    }

    #[test]
    fn test_firestore_blank_cursor_ends_paging() {
        let page: ListDocumentsPage =
            serde_json::from_value(json!({ "documents": [], "nextPageToken": "" })).unwrap();
        assert!(page.into_parts().1.is_none());
    }

    #[test]
    fn test_collection_url() {
        let store = FirestoreTokenStore::new(FirestoreConfig {
            base_url: "http://localhost:8080/".to_string(),
            project_id: "cargo-app".to_string(),
            collection: "userFcmTokens".to_string(),
            auth: None,
            page_size: 300,
        });

        assert_eq!(
            store.collection_url(),
            "http://localhost:8080/v1/projects/cargo-app/databases/(default)/documents/userFcmTokens"
        );
    }

    #[test]
    fn test_realtime_object_node() {
        let records = records_from_node(json!({
            "-Nabc1": { "token": "tokA", "uid": "u1" },
            "-Nabc2": { "uid": "u2" },
            "-Nabc3": "tokB",
            "-Nabc4": { "token": 17 }
        }));

        assert_eq!(
            records,
            vec![
                RecipientRecord::new("tokA"),
                RecipientRecord::without_token(),
                RecipientRecord::new("tokB"),
                RecipientRecord::without_token(),
            ]
        );
    }

    #[test]
    fn test_realtime_array_and_scalar_nodes() {
        let records = records_from_node(json!([null, { "token": "tokA" }]));
        assert_eq!(records, vec![RecipientRecord::without_token(), RecipientRecord::new("tokA")]);

        assert!(records_from_node(json!(null)).is_empty());
        assert!(records_from_node(json!(true)).is_empty());
    }
}
