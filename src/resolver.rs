//! Nearest-match lookup of a reference propeller.
//!
//! A query is matched in three narrowing stages:
//!
//! 1. rows with the query's blade count (or the whole table when none exist),
//! 2. rows at the minimum absolute diameter difference,
//! 3. rows at the minimum absolute pitch difference among those.
//!
//! Any tie left after stage 3 goes to the row stored first. Differences are
//! compared exactly; two rows tie only when their differences are equal.

use crate::dataset::ReferenceTable;
use crate::types::propeller::ReferenceRow;

/// Outcome of resolving a query against a reference table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    /// The selected row
    pub row: &'a ReferenceRow,
    /// Position of the row in the table
    pub index: usize,
    /// |row.diameter - query diameter|
    pub diameter_diff: f64,
    /// |row.pitch - query pitch|
    pub pitch_diff: f64,
    /// No row had the query's blade count; the whole table was searched
    pub blade_fallback: bool,
}

/// Find the reference row closest to the given geometry.
pub fn resolve(table: &ReferenceTable, diameter: f64, pitch: f64, blade_count: i64) -> Match<'_> {
    let rows = table.rows();

    let mut pool: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.blade_count == blade_count)
        .map(|(i, _)| i)
        .collect();

    let blade_fallback = pool.is_empty();
    if blade_fallback {
        pool = (0..rows.len()).collect();
    }

    let diameter_diff = |i: usize| (rows[i].diameter - diameter).abs();
    let pitch_diff = |i: usize| (rows[i].pitch - pitch).abs();

    let min_diameter = min_over(&pool, diameter_diff);
    pool.retain(|&i| diameter_diff(i) == min_diameter);

    let min_pitch = min_over(&pool, pitch_diff);
    pool.retain(|&i| pitch_diff(i) == min_pitch);

    // The table is non-empty with finite rows and the query is finite, so the
    // pool keeps at least one row through every stage.
    let index = pool[0];

    Match {
        row: &rows[index],
        index,
        diameter_diff: min_diameter,
        pitch_diff: min_pitch,
        blade_fallback,
    }
}

fn min_over(pool: &[usize], diff: impl Fn(usize) -> f64) -> f64 {
    pool.iter()
        .map(|&i| diff(i))
        .fold(f64::INFINITY, f64::min)
}
