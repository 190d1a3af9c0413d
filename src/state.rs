// src/state.rs
use std::sync::Arc;

use crate::{
    errors::{NotifyError, NotifyResult},
    services::{
        access_token::{AccessTokenProvider, ApplicationDefaultCredentials, StaticAccessToken},
        dispatcher::NotificationDispatcher,
        messaging_service::{FcmPushSender, MockPushSender, PushSender},
        token_store::{FirestoreConfig, FirestoreTokenStore, RealtimeDbTokenStore, TokenStore},
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_COLLECTION: &str = "userFcmTokens";
const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";
const DEFAULT_PAGE_SIZE: u32 = 300;

pub struct AppState {
    pub dispatcher: Arc<NotificationDispatcher>,
    pub config: AppConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenBackend {
    Firestore(FirestoreSettings),
    Realtime(RealtimeSettings),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FirestoreSettings {
    pub base_url: String,
    pub project_id: String,
    pub auth: FirestoreAuth,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FirestoreAuth {
    /// Emulator, no credentials
    None,
    /// `GOOGLE_ACCESS_TOKEN`, never refreshed
    StaticToken(String),
    /// Application Default Credentials, refreshed on expiry
    ApplicationDefault,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeSettings {
    pub database_url: String,
    pub auth_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub log_level: tracing::Level,
    pub token_collection: String,
    pub token_backend: TokenBackend,
    pub fcm_server_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> NotifyResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> NotifyResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| NotifyError::missing_env(key));

        let log_level = match get("LOG_LEVEL") {
            Some(level) => level
                .parse::<tracing::Level>()
                .map_err(|_| NotifyError::invalid_config(format!("LOG_LEVEL '{}' is not a level", level)))?,
            None => tracing::Level::INFO,
        };

        let backend = get("TOKEN_STORE_BACKEND").unwrap_or_else(|| "firestore".to_string());
        let token_backend = match backend.to_lowercase().as_str() {
            "firestore" => {
                let base_url = match get("FIRESTORE_EMULATOR_HOST") {
                    Some(host) => format!("http://{}", host),
                    None => get("FIRESTORE_BASE_URL").unwrap_or_else(|| DEFAULT_FIRESTORE_URL.to_string()),
                };
                let auth = match (get("GOOGLE_ACCESS_TOKEN"), get("FIRESTORE_EMULATOR_HOST")) {
                    (Some(token), _) => FirestoreAuth::StaticToken(token),
                    (None, Some(_)) => FirestoreAuth::None,
                    (None, None) => FirestoreAuth::ApplicationDefault,
                };
                let page_size = match get("FIRESTORE_PAGE_SIZE") {
                    Some(size) => size
                        .parse::<u32>()
                        .ok()
                        .filter(|size| *size > 0)
                        .ok_or_else(|| {
                            NotifyError::invalid_config(format!("FIRESTORE_PAGE_SIZE '{}' is not a positive integer", size))
                        })?,
                    None => DEFAULT_PAGE_SIZE,
                };

                TokenBackend::Firestore(FirestoreSettings {
                    base_url,
                    project_id: require("FIREBASE_PROJECT_ID")?,
                    auth,
                    page_size,
                })
            }
            "realtime" => TokenBackend::Realtime(RealtimeSettings {
                database_url: require("FIREBASE_DATABASE_URL")?,
                auth_key: get("FIREBASE_AUTH_KEY"),
            }),
            other => {
                return Err(NotifyError::invalid_config(format!(
                    "TOKEN_STORE_BACKEND must be 'firestore' or 'realtime', got '{}'",
                    other
                )));
            }
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            log_level,
            token_collection: get("TOKEN_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            token_backend,
            fcm_server_key: get("FCM_SERVER_KEY"),
        })
    }
}

impl AppState {
    /// Creates the shared clients once for the life of the process.
    pub fn new(config: AppConfig) -> NotifyResult<Self> {
        let token_store: Arc<dyn TokenStore> = match &config.token_backend {
            TokenBackend::Firestore(settings) => {
                tracing::info!("Reading tokens from Firestore project {}", settings.project_id);
                let auth: Option<Arc<dyn AccessTokenProvider>> = match &settings.auth {
                    FirestoreAuth::None => None,
                    FirestoreAuth::StaticToken(token) => {
                        tracing::warn!("Using GOOGLE_ACCESS_TOKEN as is; it will not be refreshed");
                        Some(Arc::new(StaticAccessToken(token.clone())))
                    }
                    FirestoreAuth::ApplicationDefault => Some(Arc::new(ApplicationDefaultCredentials::new())),
                };
                Arc::new(FirestoreTokenStore::new(FirestoreConfig {
                    base_url: settings.base_url.clone(),
                    project_id: settings.project_id.clone(),
                    collection: config.token_collection.clone(),
                    auth,
                    page_size: settings.page_size,
                }))
            }
            TokenBackend::Realtime(settings) => {
                tracing::info!("Reading tokens from Realtime Database {}", settings.database_url);
                Arc::new(RealtimeDbTokenStore::new(
                    &settings.database_url,
                    settings.auth_key.as_deref(),
                    config.token_collection.clone(),
                )?)
            }
        };

        let push_sender: Arc<dyn PushSender> = match &config.fcm_server_key {
            Some(server_key) => Arc::new(FcmPushSender::with_server_key(server_key.clone())),
            None => {
                tracing::warn!("FCM_SERVER_KEY not set, using mock notification service");
                Arc::new(MockPushSender)
            }
        };

        let dispatcher = Arc::new(NotificationDispatcher::new(token_store, push_sender));
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    pub fn with_dispatcher(config: AppConfig, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { dispatcher, config }
    }
}
