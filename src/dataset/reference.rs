//! Reference tables of known propellers

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::types::propeller::ReferenceRow;

/// Immutable, non-empty, ordered collection of reference rows.
///
/// Row order is the order the rows were loaded in and is what the resolver
/// uses to break exact ties.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    name: String,
    rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    /// Build a table from rows, rejecting an empty set or any non-finite value.
    pub fn new(name: impl Into<String>, rows: Vec<ReferenceRow>) -> Result<Self> {
        let name = name.into();
        if rows.is_empty() {
            anyhow::bail!("Reference table '{}' has no rows", name);
        }
        for (index, row) in rows.iter().enumerate() {
            if let Some(field) = row.non_finite_field() {
                anyhow::bail!(
                    "Reference table '{}' row {} ({}) has a non-finite {}",
                    name,
                    index,
                    row.brand,
                    field
                );
            }
        }
        Ok(Self { name, rows })
    }

    /// Load a table from a CSV file.
    pub fn load<P: AsRef<Path>>(name: &str, path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open reference table {:?}", path))?;

        let rows = Self::read_rows(file)
            .with_context(|| format!("Failed to read reference table {:?}", path))?;
        let table = Self::new(name, rows)?;

        info!(
            table = %name,
            path = %path.display(),
            rows = table.len(),
            "Reference table loaded"
        );

        Ok(table)
    }

    /// Parse and validate rows from any CSV source.
    pub fn read_rows<R: std::io::Read>(reader: R) -> Result<Vec<ReferenceRow>> {
        let mut csv = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();

        for (index, record) in csv.deserialize::<ReferenceRow>().enumerate() {
            // +2: header line, then 1-based numbering
            let line = index + 2;
            let row = record.with_context(|| format!("Invalid row at line {}", line))?;
            if let Some(field) = row.non_finite_field() {
                anyhow::bail!("Row at line {} has a non-finite {}", line, field);
            }
            rows.push(row);
        }

        Ok(rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
