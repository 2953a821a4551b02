//! Static datasets served verbatim by the explorer endpoints.
//!
//! The experiment and geometry files are schema-less from the service's point
//! of view: every column is kept, in file order, and any cell may be absent
//! (empty, `NaN` or one of the usual NA markers in the CSV). Absent cells are
//! `None` and serialise as JSON `null`.

use anyhow::{Context, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Cell spellings read as missing data, matched exactly.
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "1.#IND", "1.#QNAN", "<NA>", "N/A",
    "NA", "NULL", "None", "n/a", "null",
];

/// A single present cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Interpret a raw CSV field; `None` for an absent value.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || MISSING_MARKERS.contains(&raw) {
            return None;
        }
        if let Ok(value) = raw.parse::<i64>() {
            return Some(CellValue::Integer(value));
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(CellValue::Float(value)),
            // NaN / inf have no JSON representation
            Ok(_) => None,
            Err(_) => Some(CellValue::Text(raw.to_string())),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Integer(value) => serializer.serialize_i64(*value),
            CellValue::Float(value) => serializer.serialize_f64(*value),
            CellValue::Text(value) => serializer.serialize_str(value),
        }
    }
}

/// One row, serialised as a JSON object with columns in file order.
#[derive(Debug, Clone)]
pub struct Record {
    columns: Arc<[String]>,
    cells: Vec<Option<CellValue>>,
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(&self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

/// The leading rows of a static dataset.
#[derive(Debug, Clone, Default)]
pub struct PassthroughDataset {
    records: Vec<Record>,
}

impl PassthroughDataset {
    /// Load at most `limit` rows from a CSV file.
    pub fn load<P: AsRef<Path>>(name: &str, path: P, limit: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open {} dataset {:?}", name, path))?;
        let dataset = Self::read(file, limit)
            .with_context(|| format!("Failed to read {} dataset {:?}", name, path))?;

        info!(
            dataset = %name,
            path = %path.display(),
            rows = dataset.len(),
            "Passthrough dataset loaded"
        );

        Ok(dataset)
    }

    /// Read at most `limit` rows from any CSV source.
    pub fn read<R: std::io::Read>(reader: R, limit: usize) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns: Arc<[String]> = csv
            .headers()
            .context("Missing header row")?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut records = Vec::new();
        for record in csv.records().take(limit) {
            let record = record?;
            // Short rows are padded with absent cells; long rows are truncated
            let cells = (0..columns.len())
                .map(|i| record.get(i).and_then(CellValue::parse))
                .collect();
            records.push(Record {
                columns: Arc::clone(&columns),
                cells,
            });
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The two explorer datasets.
#[derive(Debug, Clone, Default)]
pub struct PassthroughDatasets {
    pub experiment: PassthroughDataset,
    pub geometry: PassthroughDataset,
}
