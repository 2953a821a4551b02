//! Propeller geometry records and validated prediction queries

use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// One known propeller from a reference table.
///
/// Column names follow the reference CSV files; extra columns are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    /// Manufacturer / product line
    #[serde(rename = "propeller_brand")]
    pub brand: String,

    /// Diameter, in the unit the dataset was built with
    #[serde(rename = "propeller_diameter")]
    pub diameter: f64,

    /// Pitch, same unit as diameter
    #[serde(rename = "propeller_pitch")]
    pub pitch: f64,

    #[serde(rename = "number_of_blades")]
    pub blade_count: i64,

    /// Area of a single blade
    pub blade_area: f64,

    /// Swept disc area
    pub disc_area: f64,

    /// Blade area times blade count
    pub total_blade_area: f64,

    /// total_blade_area / disc_area
    pub solidity: f64,
}

impl ReferenceRow {
    /// Name of the first non-finite float field, if any.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("propeller_diameter", self.diameter),
            ("propeller_pitch", self.pitch),
            ("blade_area", self.blade_area),
            ("disc_area", self.disc_area),
            ("total_blade_area", self.total_blade_area),
            ("solidity", self.solidity),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(name, _)| name)
    }
}

/// A validated prediction query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropellerQuery {
    pub diameter: f64,
    pub pitch: f64,
    pub blade_count: i64,
    pub advance_ratio: f64,
}

impl PropellerQuery {
    /// Build a query, rejecting values no propeller can have.
    ///
    /// Blade count is not range-checked: every count other than 2 routes to
    /// family B.
    pub fn new(
        diameter: f64,
        pitch: f64,
        blade_count: i64,
        advance_ratio: f64,
    ) -> Result<Self, PredictError> {
        if !diameter.is_finite() || diameter <= 0.0 {
            return Err(PredictError::invalid(format!(
                "diameter must be a positive number, got {}",
                diameter
            )));
        }
        if !pitch.is_finite() {
            return Err(PredictError::invalid("pitch must be a finite number"));
        }
        if !advance_ratio.is_finite() {
            return Err(PredictError::invalid(
                "advance_ratio must be a finite number",
            ));
        }

        Ok(Self {
            diameter,
            pitch,
            blade_count,
            advance_ratio,
        })
    }
}
