use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::domain::diff::diff_tables;
use crate::domain::entities::change::ChangeReport;
use crate::domain::entities::table::Table;
use crate::infra::import::csv::read_table;
use crate::usecase::ports::notifier::ChangeNotifier;
use crate::usecase::ports::sheets::{SheetTarget, SpreadsheetApi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncJob {
    pub csv_path: PathBuf,
    pub delimiter: u8,
    pub target: SheetTarget,
    pub resize_columns: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub report: ChangeReport,
    pub updated_cells: u64,
    pub columns_resized: bool,
}

impl SyncOutcome {
    pub fn changed(&self) -> bool {
        self.report.has_changes()
    }

    pub fn updated_line(&self) -> String {
        format!("{} cells updated.", self.updated_cells)
    }
}

pub struct SyncService {
    sheets: Arc<dyn SpreadsheetApi>,
    notifier: Option<Arc<dyn ChangeNotifier>>,
}

impl SyncService {
    pub fn new(sheets: Arc<dyn SpreadsheetApi>, notifier: Option<Arc<dyn ChangeNotifier>>) -> Self {
        Self { sheets, notifier }
    }

    /// Load, fetch, diff, notify, write, resize. The write happens whether or
    /// not the diff found anything; only notification failures are swallowed.
    ///
    /// Change lines and the summary go to `console` before the write, so they
    /// survive a failed write.
    pub fn run(&self, job: &SyncJob, console: &mut dyn Write) -> Result<SyncOutcome> {
        let new_data = read_table(&job.csv_path, job.delimiter)?;
        info!(
            path = %job.csv_path.display(),
            rows = new_data.len(),
            cells = new_data.cell_count(),
            "loaded local table"
        );
        if new_data.is_empty() {
            warn!(path = %job.csv_path.display(), "local table is empty");
        }

        let target = &job.target;
        let current_data = self
            .sheets
            .get_values(&target.spreadsheet_id, &target.range)
            .with_context(|| format!("failed to fetch current data for range: {}", target.range))?;
        info!(
            spreadsheet_id = %target.spreadsheet_id,
            range = %target.range,
            rows = current_data.len(),
            "fetched remote table"
        );

        let report = diff_tables(&current_data, &new_data);
        for change in &report.changes {
            writeln!(console, "{change}").context("failed to write change line")?;
        }
        if report.has_changes() {
            info!(changes = report.changes.len(), "differences found");
            self.notify(&report);
        } else {
            info!("no differences found");
        }
        writeln!(console, "{}", report.summary_line()).context("failed to write summary line")?;

        let updated_cells = self
            .sheets
            .update_values(&target.spreadsheet_id, &target.range, &new_data)
            .with_context(|| format!("failed to write range: {}", target.range))?;
        info!(updated_cells, "wrote local table to remote range");

        let columns_resized = if job.resize_columns {
            self.resize_columns(target, &new_data)?
        } else {
            false
        };

        Ok(SyncOutcome {
            report,
            updated_cells,
            columns_resized,
        })
    }

    fn notify(&self, report: &ChangeReport) {
        let Some(notifier) = &self.notifier else {
            info!(report = %report, "notifications disabled");
            return;
        };

        match notifier.notify(report) {
            Ok(()) => info!(sink = notifier.name(), "change report delivered"),
            Err(err) => error!(sink = notifier.name(), "Error sending message: {err}"),
        }
    }

    fn resize_columns(&self, target: &SheetTarget, new_data: &Table) -> Result<bool> {
        let width = match new_data.first_row_width() {
            Some(width) if width > 0 => width,
            _ => {
                warn!(sheet_id = target.sheet_id, "first row is empty, skipping column resize");
                return Ok(false);
            }
        };

        self.sheets
            .auto_resize_columns(&target.spreadsheet_id, target.sheet_id, 0, width)
            .with_context(|| format!("failed to resize columns of sheet: {}", target.sheet_id))?;
        info!(sheet_id = target.sheet_id, columns = width, "resized columns");
        Ok(true)
    }
}
