use std::fmt;

pub const REPORT_BANNER: &str = "Asset Inventory Update Alert: ";
pub const UNKNOWN_ROW_ID: &str = "Unknown";
pub const CHANGES_DETECTED: &str = "Changes detected in the data.";
pub const NO_CHANGES_DETECTED: &str = "No changes detected in the data.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChange {
    pub row_id: String,
    /// Zero-based; rendered one-based.
    pub col_idx: usize,
    pub old_value: String,
    pub new_value: String,
}

impl fmt::Display for CellChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Change in row with ID '{}': Column {} changed from '{}' to '{}'",
            self.row_id,
            self.col_idx + 1,
            self.old_value,
            self.new_value
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeReport {
    pub changes: Vec<CellChange>,
}

impl ChangeReport {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Banner followed by one newline-terminated line per change.
    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn summary_line(&self) -> &'static str {
        if self.has_changes() {
            CHANGES_DETECTED
        } else {
            NO_CHANGES_DETECTED
        }
    }
}

impl fmt::Display for ChangeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REPORT_BANNER)?;
        for change in &self.changes {
            writeln!(f, "{change}")?;
        }
        Ok(())
    }
}
