use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

use crate::domain::entities::table::Table;

/// Reads every record of a delimited file as a row. The first line is data,
/// and records of differing lengths are kept as-is.
pub fn read_table(csv_path: &Path, delimiter: u8) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| {
            format!(
                "failed to parse csv record {} in {}",
                row_idx + 1,
                csv_path.display()
            )
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::unique_test_dir;
    use std::fs;

    #[test]
    fn reads_ragged_rows_without_header() {
        let temp_dir = unique_test_dir("read-ragged");
        fs::create_dir_all(&temp_dir).expect("should create temp dir");
        let csv_path = temp_dir.join("inventory.csv");
        fs::write(&csv_path, "id,name\nid1,web-01,extra\nid2\n").expect("should write csv fixture");

        let table = read_table(&csv_path, b',').expect("read should succeed");

        assert_eq!(table.len(), 3, "header line is a data row");
        assert_eq!(table.rows[0], vec!["id", "name"]);
        assert_eq!(table.rows[1], vec!["id1", "web-01", "extra"]);
        assert_eq!(table.rows[2], vec!["id2"]);

        fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
    }

    #[test]
    fn honours_custom_delimiter_and_quotes() {
        let temp_dir = unique_test_dir("read-delimiter");
        fs::create_dir_all(&temp_dir).expect("should create temp dir");
        let csv_path = temp_dir.join("inventory.tsv");
        fs::write(&csv_path, "id1\t\"a\tb\"\t=SUM(1,2)\n").expect("should write tsv fixture");

        let table = read_table(&csv_path, b'\t').expect("read should succeed");

        assert_eq!(table.rows, vec![vec!["id1", "a\tb", "=SUM(1,2)"]]);

        fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
    }

    #[test]
    fn empty_file_is_empty_table() {
        let temp_dir = unique_test_dir("read-empty");
        fs::create_dir_all(&temp_dir).expect("should create temp dir");
        let csv_path = temp_dir.join("empty.csv");
        fs::write(&csv_path, "").expect("should write csv fixture");

        let table = read_table(&csv_path, b',').expect("read should succeed");

        assert!(table.is_empty());

        fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
    }

    #[test]
    fn missing_file_reports_path() {
        let temp_dir = unique_test_dir("read-missing");
        let csv_path = temp_dir.join("nope.csv");

        let err = read_table(&csv_path, b',').expect_err("missing file should fail");

        assert!(format!("{err:#}").contains("nope.csv"));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let temp_dir = unique_test_dir("read-invalid");
        fs::create_dir_all(&temp_dir).expect("should create temp dir");
        let csv_path = temp_dir.join("bad.csv");
        fs::write(&csv_path, b"id1,\xff\xfe\n").expect("should write csv fixture");

        let err = read_table(&csv_path, b',').expect_err("invalid utf-8 should fail");

        assert!(format!("{err:#}").contains("failed to parse csv record 1"));

        fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
    }
}
