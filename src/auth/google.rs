//! Google installed-application OAuth2 flow backed by `credentials.json` and
//! `token.json` in the application directory.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::provider::{CredentialError, CredentialProvider, Token};

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_REDIRECT_URI: &str = "http://localhost";
const AUTH_STATE: &str = "state-token";

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ClientSecret {
    pub fn parse(json: &str) -> Result<Self, CredentialError> {
        let file: CredentialsFile = serde_json::from_str(json)
            .map_err(|e| CredentialError::InvalidCredentials(e.to_string()))?;
        file.installed
            .or(file.web)
            .ok_or_else(|| {
                CredentialError::InvalidCredentials(
                    "expected an \"installed\" or \"web\" client".to_string(),
                )
            })
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }

    /// Consent page URL requesting offline access to spreadsheets.
    pub fn auth_url(&self) -> Result<Url, CredentialError> {
        Url::parse_with_params(
            &self.auth_uri,
            [
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri()),
                ("response_type", "code"),
                ("scope", SPREADSHEETS_SCOPE),
                ("access_type", "offline"),
                ("state", AUTH_STATE),
            ],
        )
        .map_err(|e| CredentialError::InvalidCredentials(e.to_string()))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_token(self, previous_refresh: Option<&str>) -> Token {
        Token {
            access_token: self.access_token,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            expiry: self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }
}

/// Accepts either the bare authorization code or the full redirect URL the
/// browser landed on after consent.
pub fn extract_auth_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input.contains("code=") {
        let query = input.split_once('?').map(|(_, q)| q).unwrap_or(input);
        return query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "code")
            .map(|(_, value)| {
                urlencoding::decode(value)
                    .map(|code| code.into_owned())
                    .unwrap_or_else(|_| value.to_string())
            })
            .filter(|code| !code.is_empty());
    }
    Some(input.to_string())
}

pub struct GoogleCredentials {
    credentials_path: PathBuf,
    token_path: PathBuf,
    client: Client,
}

impl GoogleCredentials {
    pub fn new(app_dir: &Path) -> Self {
        Self {
            credentials_path: app_dir.join("credentials.json"),
            token_path: app_dir.join("token.json"),
            client: Client::new(),
        }
    }

    fn client_secret(&self) -> Result<ClientSecret, CredentialError> {
        let json = fs::read_to_string(&self.credentials_path).map_err(|e| {
            CredentialError::CredentialsFile(format!("{}: {}", self.credentials_path.display(), e))
        })?;
        ClientSecret::parse(&json)
    }

    async fn request_token(
        &self,
        secret: &ClientSecret,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, String> {
        let response = self
            .client
            .post(&secret.token_uri)
            .form(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("{} - {}", status, body));
        }

        response.json::<TokenResponse>().await.map_err(|e| e.to_string())
    }
}

fn read_code_from_stdin() -> Result<String, CredentialError> {
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(|_| CredentialError::NoAuthorizationCode)?;
    extract_auth_code(&line).ok_or(CredentialError::NoAuthorizationCode)
}

#[async_trait]
impl CredentialProvider for GoogleCredentials {
    async fn load_cached(&self) -> Result<Option<Token>, CredentialError> {
        let json = match fs::read_to_string(&self.token_path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CredentialError::TokenFile(e.to_string())),
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| CredentialError::TokenFile(e.to_string()))
    }

    async fn obtain_interactive(&self) -> Result<Token, CredentialError> {
        let secret = self.client_secret()?;
        let auth_url = secret.auth_url()?;

        println!("Go to the following link in your browser:\n\n{}\n", auth_url);
        println!("Enter authorization code (or paste the URL you were redirected to):");
        let _ = io::stdout().flush();
        if let Err(e) = open::that(auth_url.as_str()) {
            tracing::debug!("Could not open browser: {e}");
        }

        let code = tokio::task::spawn_blocking(read_code_from_stdin)
            .await
            .map_err(|e| CredentialError::Exchange(e.to_string()))??;

        let response = self
            .request_token(
                &secret,
                &[
                    ("code", code.as_str()),
                    ("client_id", secret.client_id.as_str()),
                    ("client_secret", secret.client_secret.as_str()),
                    ("redirect_uri", secret.redirect_uri()),
                    ("grant_type", "authorization_code"),
                ],
            )
            .await
            .map_err(CredentialError::Exchange)?;

        tracing::info!("Obtained new OAuth token");
        Ok(response.into_token(None))
    }

    async fn refresh(&self, token: &Token) -> Result<Token, CredentialError> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| CredentialError::Refresh("no refresh token".to_string()))?;
        let secret = self.client_secret()?;

        let response = self
            .request_token(
                &secret,
                &[
                    ("client_id", secret.client_id.as_str()),
                    ("client_secret", secret.client_secret.as_str()),
                    ("refresh_token", refresh_token),
                    ("grant_type", "refresh_token"),
                ],
            )
            .await
            .map_err(CredentialError::Refresh)?;

        Ok(response.into_token(Some(refresh_token)))
    }

    async fn store(&self, token: &Token) -> Result<(), CredentialError> {
        let json = serde_json::to_string_pretty(token)
            .map_err(|e| CredentialError::TokenFile(e.to_string()))?;
        if let Some(parent) = self.token_path.parent() {
            fs::create_dir_all(parent).map_err(|e| CredentialError::TokenFile(e.to_string()))?;
        }
        write_private(&self.token_path, json.as_bytes())
            .map_err(|e| CredentialError::TokenFile(e.to_string()))
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INSTALLED: &str = r#"{
        "installed": {
            "client_id": "id.apps.googleusercontent.com",
            "project_id": "time-tracker",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_secret": "secret",
            "redirect_uris": ["http://localhost"]
        }
    }"#;

    #[test]
    fn test_parse_installed_client() {
        let secret = ClientSecret::parse(INSTALLED).unwrap();
        assert_eq!(secret.client_id, "id.apps.googleusercontent.com");
        assert_eq!(secret.client_secret, "secret");
        assert_eq!(secret.redirect_uri(), "http://localhost");
    }

    #[test]
    fn test_parse_web_client_with_defaults() {
        let secret =
            ClientSecret::parse(r#"{"web": {"client_id": "a", "client_secret": "b"}}"#).unwrap();
        assert_eq!(secret.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(secret.auth_uri, DEFAULT_AUTH_URI);
        assert_eq!(secret.redirect_uri(), DEFAULT_REDIRECT_URI);
    }

    #[test]
    fn test_parse_rejects_unknown_client_type() {
        assert!(matches!(
            ClientSecret::parse(r#"{"other": {}}"#),
            Err(CredentialError::InvalidCredentials(_))
        ));
        assert!(ClientSecret::parse("nope").is_err());
    }

    #[test]
    fn test_auth_url_requests_offline_spreadsheet_access() {
        let url = ClientSecret::parse(INSTALLED).unwrap().auth_url().unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["client_id"], "id.apps.googleusercontent.com");
        assert_eq!(params["scope"], SPREADSHEETS_SCOPE);
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["state"], "state-token");
    }

    #[test]
    fn test_extract_auth_code() {
        assert_eq!(extract_auth_code("4/0Abc\n").as_deref(), Some("4/0Abc"));
        assert_eq!(
            extract_auth_code("http://localhost/?state=state-token&code=4%2F0Abc&scope=x").as_deref(),
            Some("4/0Abc")
        );
        assert_eq!(extract_auth_code("   "), None);
        assert_eq!(extract_auth_code("http://localhost/?code=&state=x"), None);
    }

    #[test]
    fn test_refresh_keeps_previous_refresh_token() {
        let response = TokenResponse {
            access_token: "new".to_string(),
            token_type: None,
            refresh_token: None,
            expires_in: Some(3599),
        };
        let token = response.into_token(Some("keep-me"));
        assert_eq!(token.refresh_token.as_deref(), Some("keep-me"));
        assert_eq!(token.token_type, "Bearer");
        assert!(!token.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn test_token_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let provider = GoogleCredentials::new(dir.path());
        assert_eq!(provider.load_cached().await.unwrap(), None);

        let token = Token {
            access_token: "abc".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: Some("r".to_string()),
            expiry: None,
        };
        provider.store(&token).await.unwrap();
        assert_eq!(provider.load_cached().await.unwrap(), Some(token));
    }

    #[tokio::test]
    async fn test_missing_credentials_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let provider = GoogleCredentials::new(dir.path());
        assert!(matches!(
            provider.obtain_interactive().await,
            Err(CredentialError::CredentialsFile(_))
        ));
    }
}
