use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::entities::table::Table;
use crate::infra::google::auth::TokenProvider;
use crate::usecase::ports::sheets::{SheetsError, SpreadsheetApi};

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const USER_ENTERED: &str = "USER_ENTERED";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [Vec<String>],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    #[serde(default)]
    updated_cells: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateBody {
    requests: Vec<BatchRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum BatchRequest {
    AutoResizeDimensions { dimensions: DimensionRange },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DimensionRange {
    sheet_id: i64,
    dimension: &'static str,
    start_index: usize,
    end_index: usize,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Sheets cells come back as JSON scalars; render them the way the sheet
/// shows them.
fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(v) => v.clone(),
        Value::Number(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_value_range(body: &str) -> Result<Table, SheetsError> {
    let range: ValueRange = serde_json::from_str(body)?;
    let rows = range
        .values
        .iter()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    Ok(Table::new(rows))
}

fn update_body<'a>(range: &'a str, table: &'a Table) -> ValueRangeBody<'a> {
    ValueRangeBody {
        range,
        major_dimension: "ROWS",
        values: &table.rows,
    }
}

fn auto_resize_body(sheet_id: i64, start_index: usize, end_index: usize) -> BatchUpdateBody {
    BatchUpdateBody {
        requests: vec![BatchRequest::AutoResizeDimensions {
            dimensions: DimensionRange {
                sheet_id,
                dimension: "COLUMNS",
                start_index,
                end_index,
            },
        }],
    }
}

fn api_error(status: StatusCode, body: &str) -> SheetsError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.to_string());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SheetsError::Auth(format!("{status}: {message}"))
        }
        _ => SheetsError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

pub struct GoogleSheetsClient {
    http: Client,
    base_url: Url,
    tokens: TokenProvider,
}

impl GoogleSheetsClient {
    pub fn new(http: Client, base_url: &str, tokens: TokenProvider) -> Result<Self, SheetsError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| SheetsError::Credentials(format!("invalid sheets base url: {err}")))?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::Credentials("sheets base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> Result<String, SheetsError> {
        let token = self.tokens.access_token()?;
        let response: Response = request.bearer_auth(token).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        Ok(body)
    }
}

impl SpreadsheetApi for GoogleSheetsClient {
    fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Table, SheetsError> {
        let url = self.endpoint(&[spreadsheet_id, "values", range])?;
        debug!(%url, "values.get");
        let body = self.send(self.http.get(url))?;
        parse_value_range(&body)
    }

    fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        table: &Table,
    ) -> Result<u64, SheetsError> {
        let url = self.endpoint(&[spreadsheet_id, "values", range])?;
        debug!(%url, rows = table.len(), "values.update");
        let request = self
            .http
            .put(url)
            .query(&[("valueInputOption", USER_ENTERED)])
            .json(&update_body(range, table));
        let body = self.send(request)?;
        let response: UpdateValuesResponse = serde_json::from_str(&body)?;
        Ok(response.updated_cells)
    }

    fn auto_resize_columns(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        start_index: usize,
        end_index: usize,
    ) -> Result<(), SheetsError> {
        let batch_path = format!("{spreadsheet_id}:batchUpdate");
        let url = self.endpoint(&[batch_path.as_str()])?;
        debug!(%url, sheet_id, end_index, "batchUpdate autoResizeDimensions");
        let request = self
            .http
            .post(url)
            .json(&auto_resize_body(sheet_id, start_index, end_index));
        self.send(request)?;
        Ok(())
    }
}
