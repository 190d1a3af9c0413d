// src/services/access_token.rs
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::errors::{NotifyError as AppError, NotifyResult};

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Bearer token source for Firestore, asked once per request.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> NotifyResult<String>;
}

/// Fixed token, for tests and short-lived local runs
#[derive(Debug, Clone)]
pub struct StaticAccessToken(pub String);

#[async_trait]
impl AccessTokenProvider for StaticAccessToken {
    async fn access_token(&self) -> NotifyResult<String> {
        Ok(self.0.clone())
    }
}

/// Application Default Credentials through `gcp_auth`, which caches tokens
/// and refreshes them before they expire.
#[derive(Default)]
pub struct ApplicationDefaultCredentials {
    provider: OnceCell<Arc<dyn gcp_auth::TokenProvider>>,
}

impl ApplicationDefaultCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    // Credential discovery is async, so it runs on the first request
    async fn provider(&self) -> NotifyResult<&Arc<dyn gcp_auth::TokenProvider>> {
        self.provider
            .get_or_try_init(|| async {
                tracing::info!("Loading Google application default credentials");
                gcp_auth::provider()
                    .await
                    .map_err(|e| AppError::FirestoreAuth(e.to_string()))
            })
            .await
    }
}

#[async_trait]
impl AccessTokenProvider for ApplicationDefaultCredentials {
    async fn access_token(&self) -> NotifyResult<String> {
        let token = self
            .provider()
            .await?
            .token(&[DATASTORE_SCOPE])
            .await
            .map_err(|e| AppError::FirestoreAuth(e.to_string()))?;
        Ok(token.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_is_returned_as_is() {
        let provider = StaticAccessToken("ya29.local".to_string());
        assert_eq!(provider.access_token().await.unwrap(), "ya29.local");
    }
}
