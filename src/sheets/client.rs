use reqwest::{header, Client};
use thiserror::Error;

use super::types::*;
use crate::auth::Authenticator;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Remote(String),
}

pub struct SheetsClient {
    client: Client,
    base_url: String,
    auth: Authenticator,
}

impl SheetsClient {
    pub fn new(auth: Authenticator) -> Self {
        Self::with_base_url(auth, SHEETS_API_BASE)
    }

    pub fn with_base_url(auth: Authenticator, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    /// Append one row to columns A:G of `sheet_name`, letting the sheet parse
    /// the values as if they were typed in. Never retried.
    pub async fn append_row(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        values: Vec<String>,
    ) -> Result<AppendResponse, SheetsError> {
        if spreadsheet_id.trim().is_empty() {
            return Err(SheetsError::InvalidArgument("spreadsheet ID is empty".to_string()));
        }

        let url = append_url(&self.base_url, spreadsheet_id.trim(), sheet_name);
        let access_token = self
            .auth
            .access_token()
            .await
            .map_err(|e| SheetsError::Remote(e.to_string()))?;

        let response = self.client
            .post(&url)
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/json")
            .json(&ValueRange::single_row(values))
            .send()
            .await
            .map_err(|e| SheetsError::Remote(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Remote(describe_failure(status, &body)));
        }

        let result = response
            .json::<AppendResponse>()
            .await
            .map_err(|e| SheetsError::Remote(e.to_string()))?;

        if let Some(range) = result.updates.as_ref().and_then(|u| u.updated_range.as_deref()) {
            tracing::debug!("Appended row to {}", range);
        }
        Ok(result)
    }
}

/// Range covering the seven entry columns of a sheet.
pub fn entry_range(sheet_name: &str) -> String {
    format!("{}!A:G", sheet_name)
}

fn append_url(base_url: &str, spreadsheet_id: &str, sheet_name: &str) -> String {
    format!(
        "{}/spreadsheets/{}/values/{}:append?valueInputOption=USER_ENTERED",
        base_url,
        urlencoding::encode(spreadsheet_id),
        urlencoding::encode(&entry_range(sheet_name)),
    )
}

fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => format!("{} - {}", status, parsed.error.message),
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => format!("{} - {}", status, body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MockCredentialProvider, Token};
    use crate::entry::EntryForm;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SCENARIO_ROW: [&str; 7] = ["01/02/2025", "3.5", "Fix bug", "repoA", "main", "abc123", "def456"];

    /// Client holding a token that never expires, so the provider is never asked.
    fn client_for(base_url: &str) -> SheetsClient {
        let provider = MockCredentialProvider::new();
        let token = Token {
            access_token: "test-token".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: None,
            expiry: None,
        };
        SheetsClient::with_base_url(Authenticator::new(Arc::new(provider), token), base_url)
    }

    fn offline_client() -> SheetsClient {
        client_for("http://127.0.0.1:9")
    }

    fn scenario_row() -> Vec<String> {
        SCENARIO_ROW.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_append_row_posts_entry_to_sheet() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/spreadsheets/sheet-123/values/Sheet1%21A%3AG:append"))
            .and(query_param("valueInputOption", "USER_ENTERED"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({
                "majorDimension": "ROWS",
                "values": [SCENARIO_ROW]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "spreadsheetId": "sheet-123",
                "tableRange": "Sheet1!A1:G4",
                "updates": {"updatedRange": "Sheet1!A5:G5", "updatedRows": 1, "updatedCells": 7}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server.uri())
            .append_row("sheet-123", "Sheet1", scenario_row())
            .await
            .unwrap();

        let updates = response.updates.unwrap();
        assert_eq!(updates.updated_range.as_deref(), Some("Sheet1!A5:G5"));
        assert_eq!(updates.updated_rows, Some(1));
    }

    #[tokio::test]
    async fn test_rejected_append_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {
                    "code": 403,
                    "message": "The caller does not have permission",
                    "status": "PERMISSION_DENIED"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server.uri())
            .append_row("sheet-123", "Sheet1", scenario_row())
            .await
            .unwrap_err();

        assert!(matches!(err, SheetsError::Remote(_)));
        assert_eq!(err.to_string(), "403 Forbidden - The caller does not have permission");
    }

    #[tokio::test]
    async fn test_empty_spreadsheet_id_fails_without_network() {
        let client = offline_client();
        for id in ["", "   "] {
            let err = client
                .append_row(id, "Sheet1", vec!["x".to_string(); 7])
                .await
                .unwrap_err();
            assert!(matches!(err, SheetsError::InvalidArgument(_)));
            assert_eq!(err.to_string(), "spreadsheet ID is empty");
        }
    }

    #[test]
    fn test_append_url_targets_entry_columns() {
        assert_eq!(entry_range("Sheet1"), "Sheet1!A:G");
        assert_eq!(
            append_url(SHEETS_API_BASE, "abc123", "Sheet1"),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Sheet1%21A%3AG:append?valueInputOption=USER_ENTERED"
        );
        assert_eq!(
            append_url("http://host", "id", "Time Log"),
            "http://host/spreadsheets/id/values/Time%20Log%21A%3AG:append?valueInputOption=USER_ENTERED"
        );
    }

    #[test]
    fn test_entry_becomes_single_row_body() {
        let form = EntryForm {
            date: "01/02/2025".to_string(),
            hours: "3.5".to_string(),
            description: "Fix bug".to_string(),
            project: "repoA".to_string(),
            branch: "main".to_string(),
            commit_start: "abc123".to_string(),
            commit_end: "def456".to_string(),
        };
        let body = ValueRange::single_row(form.validate().unwrap().to_row());

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "majorDimension": "ROWS",
                "values": [["01/02/2025", "3.5", "Fix bug", "repoA", "main", "abc123", "def456"]]
            })
        );
    }

    #[test]
    fn test_failure_message_uses_api_error() {
        let body = r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#;
        assert_eq!(
            describe_failure(reqwest::StatusCode::NOT_FOUND, body),
            "404 Not Found - Requested entity was not found."
        );
        assert_eq!(
            describe_failure(reqwest::StatusCode::BAD_GATEWAY, ""),
            "502 Bad Gateway"
        );
    }

    #[test]
    fn test_append_response_parses() {
        let json = r#"{
            "spreadsheetId": "abc",
            "tableRange": "Sheet1!A1:G4",
            "updates": {"updatedRange": "Sheet1!A5:G5", "updatedRows": 1, "updatedCells": 7}
        }"#;
        let parsed: AppendResponse = serde_json::from_str(json).unwrap();
        let updates = parsed.updates.unwrap();
        assert_eq!(updates.updated_range.as_deref(), Some("Sheet1!A5:G5"));
        assert_eq!(updates.updated_cells, Some(7));
    }
}
