//! Fixture builders shared by unit tests.

use anyhow::Result;

use crate::dataset::ReferenceTable;
use crate::features::FeatureVector;
use crate::models::family::ModelFamily;
use crate::models::regressor::{LinearRegressor, Regressor};
use crate::predictor::{FamilyResources, PredictionContext};
use crate::types::propeller::ReferenceRow;

/// Reference row with unit-ish engineered features derived from the geometry.
pub fn reference_row(brand: &str, diameter: f64, pitch: f64, blade_count: i64) -> ReferenceRow {
    let disc_area = std::f64::consts::PI * (diameter / 2.0).powi(2);
    let blade_area = diameter * 0.1;
    let total_blade_area = blade_area * blade_count as f64;

    ReferenceRow {
        brand: brand.to_string(),
        diameter,
        pitch,
        blade_count,
        blade_area,
        disc_area,
        total_blade_area,
        solidity: total_blade_area / disc_area,
    }
}

pub fn reference_table(rows: Vec<ReferenceRow>) -> ReferenceTable {
    ReferenceTable::new("fixture", rows).unwrap()
}

/// A family of constant regressors.
pub fn family(thrust: f64, power: f64, efficiency: f64) -> ModelFamily {
    ModelFamily::new(
        Box::new(LinearRegressor::constant("ct", thrust)),
        Box::new(LinearRegressor::constant("cp", power)),
        Box::new(LinearRegressor::constant("ef", efficiency)),
    )
}

/// Context with family A predicting (0.1, 0.05, 0.6) and family B
/// predicting (0.2, 0.07, 0.5).
pub fn context(rows_a: Vec<ReferenceRow>, rows_b: Vec<ReferenceRow>) -> PredictionContext {
    PredictionContext::new(
        FamilyResources::new(family(0.1, 0.05, 0.6), reference_table(rows_a)),
        FamilyResources::new(family(0.2, 0.07, 0.5), reference_table(rows_b)),
    )
}

/// Regressor that always fails.
pub struct FailingRegressor;

impl Regressor for FailingRegressor {
    fn name(&self) -> &str {
        "failing"
    }

    fn predict(&self, _features: &FeatureVector) -> Result<f64> {
        anyhow::bail!("input tensor shape mismatch")
    }
}
