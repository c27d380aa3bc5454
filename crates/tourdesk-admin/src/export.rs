//! CSV export of loaded records

use chrono::NaiveDate;
use csv::{QuoteStyle, WriterBuilder};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tourdesk_core::{Error, Record, Resource, Result};
use tracing::info;

/// A rendered CSV file, not yet written anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// `<resource>_<YYYY-MM-DD>.csv`
    pub file_name: String,
    /// File contents
    pub contents: String,
    /// Number of data rows
    pub rows: usize,
}

/// Export file name for `resource` on `date`
#[must_use]
pub fn file_name(resource: Resource, date: NaiveDate) -> String {
    format!("{resource}_{}.csv", date.format("%Y-%m-%d"))
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(nested @ (Value::Array(_) | Value::Object(_))) => nested.to_string(),
    }
}

/// Render `records` as CSV
///
/// Headers are the first record's keys in backend order; later records are
/// projected onto them. Nested values are written as JSON text.
///
/// # Errors
///
/// Returns [`Error::NoData`] for an empty list, or a CSV error.
pub fn export_csv(resource: Resource, records: &[Record], date: NaiveDate) -> Result<CsvExport> {
    let Some(first) = records.first() else {
        return Err(Error::NoData { resource });
    };
    let headers: Vec<&String> = first.fields().keys().collect();

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new());
    writer.write_record(&headers)?;
    for record in records {
        let fields = record.fields();
        writer.write_record(headers.iter().map(|key| cell(fields.get(key.as_str()))))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    let contents = String::from_utf8(bytes)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    Ok(CsvExport {
        file_name: file_name(resource, date),
        contents,
        rows: records.len(),
    })
}

impl CsvExport {
    /// Write the file into `directory`, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be written.
    pub fn write_to(&self, directory: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(directory)?;
        let path = directory.join(&self.file_name);
        std::fs::write(&path, &self.contents)?;
        info!(path = %path.display(), rows = self.rows, "Export written");
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Resource::Tours, date()), "tours_2024-05-01.csv");
    }

    #[test]
    fn test_empty_list_is_no_data() {
        let error = export_csv(Resource::Users, &[], date()).unwrap_err();
        assert!(matches!(error, Error::NoData { resource: Resource::Users }));
    }

    #[test]
    fn test_headers_follow_first_record() {
        let records = vec![
            Record::from_value(json!({"id": "l1", "name": "Cafe, X", "tag_ids": ["t1"], "price_level": 2})).unwrap(),
            Record::from_value(json!({"name": "Museu", "extra": "ignored"})).unwrap(),
        ];

        let export = export_csv(Resource::Locations, &records, date()).unwrap();
        let lines: Vec<_> = export.contents.lines().collect();

        assert_eq!(export.rows, 2);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], r#""id","name","tag_ids","price_level""#);
        assert_eq!(lines[1], r#""l1","Cafe, X","[""t1""]",2"#);

        let mut reader = csv::Reader::from_reader(export.contents.as_bytes());
        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|row| row.unwrap().iter().map(ToString::to_string).collect())
            .collect();
        assert_eq!(rows[1], vec!["", "Museu", "", ""]);
    }

    #[test]
    fn test_dotted_keys_are_exported_verbatim() {
        let records = vec![
            Record::from_value(json!({"id": "u1", "address.city": "Lisbon", "address": {"city": "Porto"}}))
                .unwrap(),
        ];

        let export = export_csv(Resource::Users, &records, date()).unwrap();
        let lines: Vec<_> = export.contents.lines().collect();

        assert_eq!(lines[0], r#""id","address.city","address""#);
        assert_eq!(lines[1], r#""u1","Lisbon","{""city"":""Porto""}""#);
    }

    #[test]
    fn test_write_to_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        let records = vec![Record::from_value(json!({"id": 1})).unwrap()];

        let export = export_csv(Resource::Users, &records, date()).unwrap();
        let path = export.write_to(&target).unwrap();

        assert_eq!(path, target.join("users_2024-05-01.csv"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), export.contents);
    }
}
