use serde::{Deserialize, Serialize};

/// Request body of `spreadsheets.values.append`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(rename = "majorDimension")]
    pub major_dimension: String,
    pub values: Vec<Vec<String>>,
}

impl ValueRange {
    pub fn single_row(values: Vec<String>) -> Self {
        Self {
            major_dimension: "ROWS".to_string(),
            values: vec![values],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppendResponse {
    #[serde(rename = "spreadsheetId")]
    pub spreadsheet_id: Option<String>,
    #[serde(rename = "tableRange")]
    pub table_range: Option<String>,
    pub updates: Option<UpdateValuesResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateValuesResponse {
    #[serde(rename = "updatedRange")]
    pub updated_range: Option<String>,
    #[serde(rename = "updatedRows")]
    pub updated_rows: Option<i64>,
    #[serde(rename = "updatedCells")]
    pub updated_cells: Option<i64>,
}

/// Google's JSON error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub code: Option<i64>,
    pub message: String,
    pub status: Option<String>,
}
