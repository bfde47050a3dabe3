use crate::domain::entities::change::{CellChange, ChangeReport, UNKNOWN_ROW_ID};
use crate::domain::entities::table::Table;

/// Compares `current` against `new` position by position.
///
/// Only the overlapping prefix is inspected: rows beyond the shorter table and
/// cells beyond the shorter row of each pair never show up in the report.
/// Cells compare by exact string equality.
pub fn diff_tables(current: &Table, new: &Table) -> ChangeReport {
    let mut changes = Vec::new();

    for (current_row, new_row) in current.rows.iter().zip(new.rows.iter()) {
        let row_id = current_row
            .first()
            .map(String::as_str)
            .unwrap_or(UNKNOWN_ROW_ID);

        for (col_idx, (old_value, new_value)) in current_row.iter().zip(new_row.iter()).enumerate()
        {
            if old_value != new_value {
                changes.push(CellChange {
                    row_id: row_id.to_string(),
                    col_idx,
                    old_value: old_value.clone(),
                    new_value: new_value.clone(),
                });
            }
        }
    }

    ChangeReport { changes }
}
