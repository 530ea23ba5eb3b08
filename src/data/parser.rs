use std::io::Read;
use std::path::Path;

use crate::error::{Nem12Error, Result};

/// A NEM12 file as untyped rows. Column 0 of every row has already been
/// checked to be an integer record-type code.
#[derive(Debug, Clone)]
pub struct RawTable {
    rows: Vec<Vec<String>>,
    record_types: Vec<i64>,
}

impl RawTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        Self::from_csv(reader)
    }

    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(rdr);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Self::from_rows(rows)
    }

    /// Build a table from rows already split into cells.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Nem12Error::MalformedInput {
                row: 0,
                column: 0,
                reason: "file contains no rows".into(),
            });
        }

        let mut record_types = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let cell = row.first().map(|c| c.trim()).unwrap_or("");
            let code = cell.parse::<i64>().map_err(|_| Nem12Error::MalformedInput {
                row: i,
                column: 0,
                reason: format!("record type {cell:?} is not an integer"),
            })?;
            record_types.push(code);
        }

        tracing::debug!(rows = rows.len(), "Loaded NEM12 table");
        Ok(Self { rows, record_types })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn record_type(&self, row: usize) -> Option<i64> {
        self.record_types.get(row).copied()
    }

    pub fn row(&self, row: usize) -> Option<&[String]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Positions of every row whose record type equals `code`.
    pub fn rows_with_record(&self, code: i64) -> impl Iterator<Item = usize> + '_ {
        self.record_types
            .iter()
            .enumerate()
            .filter(move |(_, c)| **c == code)
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_ragged_rows_and_record_types() {
        let csv = "100,NEM12,200401011200\n200,NMI1,E1B1,1,E1\n300,20240101,0.1,0.2\n900\n";
        let table = RawTable::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.record_type(0), Some(100));
        assert_eq!(table.record_type(3), Some(900));
        assert_eq!(table.cell(1, 4), Some("E1"));
        assert_eq!(table.cell(3, 1), None);
        assert_eq!(table.rows_with_record(200).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn trims_cells() {
        let table = RawTable::from_reader(" 300 , 20240101 , 1.5 \n".as_bytes()).unwrap();
        assert_eq!(table.record_type(0), Some(300));
        assert_eq!(table.row(0).unwrap(), &["300", "20240101", "1.5"]);
    }

    #[test]
    fn non_integer_record_type_is_fatal() {
        let err = RawTable::from_reader("200,a\nxyz,b\n".as_bytes()).unwrap_err();
        match err {
            Nem12Error::MalformedInput { row, column, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_input_is_fatal() {
        let err = RawTable::from_reader("".as_bytes()).unwrap_err();
        assert!(matches!(err, Nem12Error::MalformedInput { .. }));
    }
}
