use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Access tokens this close to expiry are treated as expired.
const EXPIRY_LEEWAY_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("unable to read credentials file: {0}")]
    CredentialsFile(String),
    #[error("unable to parse credentials: {0}")]
    InvalidCredentials(String),
    #[error("token file error: {0}")]
    TokenFile(String),
    #[error("no authorization code entered")]
    NoAuthorizationCode,
    #[error("unable to retrieve token: {0}")]
    Exchange(String),
    #[error("token refresh failed: {0}")]
    Refresh(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    /// A missing expiry, or Go's zero time (`0001-01-01T00:00:00Z`), never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) if expiry.year() > 1 => {
                expiry - Duration::seconds(EXPIRY_LEEWAY_SECS) <= now
            }
            _ => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Source of OAuth2 tokens for the spreadsheet API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// The previously stored token, if any.
    async fn load_cached(&self) -> Result<Option<Token>, CredentialError>;

    /// Runs the human-in-the-loop consent flow.
    async fn obtain_interactive(&self) -> Result<Token, CredentialError>;

    async fn refresh(&self, token: &Token) -> Result<Token, CredentialError>;

    async fn store(&self, token: &Token) -> Result<(), CredentialError>;
}

/// Resolve a usable token: cached, refreshed, or freshly obtained.
pub async fn authorize(provider: &dyn CredentialProvider) -> Result<Token, CredentialError> {
    let cached = match provider.load_cached().await {
        Ok(cached) => cached,
        Err(e) => {
            tracing::warn!("Ignoring unreadable cached token: {e}");
            None
        }
    };

    if let Some(token) = cached {
        if !token.is_expired(Utc::now()) {
            tracing::debug!("Using cached token");
            return Ok(token);
        }
        if token.can_refresh() {
            match provider.refresh(&token).await {
                Ok(refreshed) => {
                    store_or_warn(provider, &refreshed).await;
                    return Ok(refreshed);
                }
                Err(e) => tracing::warn!("{e}, falling back to interactive authorization"),
            }
        }
    }

    let token = provider.obtain_interactive().await?;
    store_or_warn(provider, &token).await;
    Ok(token)
}

async fn store_or_warn(provider: &dyn CredentialProvider, token: &Token) {
    if let Err(e) = provider.store(token).await {
        tracing::warn!("Unable to cache token: {e}");
    }
}

/// Hands out access tokens, refreshing the held token when it expires.
pub struct Authenticator {
    provider: Arc<dyn CredentialProvider>,
    token: Mutex<Token>,
}

impl Authenticator {
    pub fn new(provider: Arc<dyn CredentialProvider>, token: Token) -> Self {
        Self { provider, token: Mutex::new(token) }
    }

    pub async fn access_token(&self) -> Result<String, CredentialError> {
        let mut token = self.token.lock().await;
        if token.is_expired(Utc::now()) {
            if !token.can_refresh() {
                return Err(CredentialError::Refresh(
                    "token expired and no refresh token is available".to_string(),
                ));
            }
            let refreshed = self.provider.refresh(&token).await?;
            store_or_warn(self.provider.as_ref(), &refreshed).await;
            *token = refreshed;
            tracing::debug!("Refreshed access token");
        }
        Ok(token.access_token.clone())
    }
}
