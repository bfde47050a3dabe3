use thiserror::Error;

use crate::domain::entities::table::Table;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("credentials error: {0}")]
    Credentials(String),
    #[error("authorization failed: {0}")]
    Auth(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sheets api returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where a sync job reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTarget {
    pub spreadsheet_id: String,
    pub range: String,
    pub sheet_id: i64,
}

pub trait SpreadsheetApi: Send + Sync {
    /// Current values of the range; an empty range is an empty table.
    fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Table, SheetsError>;

    /// Overwrites the range with user-entered semantics and returns the
    /// updated cell count.
    fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        table: &Table,
    ) -> Result<u64, SheetsError>;

    fn auto_resize_columns(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        start_index: usize,
        end_index: usize,
    ) -> Result<(), SheetsError>;
}
