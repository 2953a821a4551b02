//! Model input assembly.
//!
//! The regressors were trained on a fixed 7-column layout: three columns the
//! caller supplies and four engineered geometry columns imputed from the
//! nearest reference propeller.

use crate::types::propeller::{PropellerQuery, ReferenceRow};

/// Number of model input features.
pub const FEATURE_COUNT: usize = 7;

/// Feature names in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "propeller_diameter",
    "propeller_pitch",
    "advance_ratio",
    "blade_area",
    "disc_area",
    "total_blade_area",
    "solidity",
];

/// Ordered model input vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Combine query geometry with the matched row's engineered features.
    pub fn assemble(query: &PropellerQuery, matched: &ReferenceRow) -> Self {
        Self([
            query.diameter,
            query.pitch,
            query.advance_ratio,
            matched.blade_area,
            matched.disc_area,
            matched.total_blade_area,
            matched.solidity,
        ])
    }

    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    /// Single-precision copy for ONNX graphs exported with float inputs.
    pub fn to_f32(&self) -> Vec<f32> {
        self.0.iter().map(|&v| v as f32).collect()
    }
}
