//! Wire types for the prediction endpoint

use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::types::propeller::{PropellerQuery, ReferenceRow};

/// A request field as sent by the client: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Number(f64),
    Text(String),
}

impl RawScalar {
    fn as_float(&self, field: &str) -> Result<f64, PredictError> {
        match self {
            RawScalar::Number(value) => Ok(*value),
            RawScalar::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                PredictError::invalid(format!("{} is not a number: {:?}", field, text))
            }),
        }
    }

    fn as_integer(&self, field: &str) -> Result<i64, PredictError> {
        match self {
            RawScalar::Number(value) => {
                if value.is_finite()
                    && value.fract() == 0.0
                    && *value >= i64::MIN as f64
                    && *value <= i64::MAX as f64
                {
                    Ok(*value as i64)
                } else {
                    Err(PredictError::invalid(format!(
                        "{} must be an integer, got {}",
                        field, value
                    )))
                }
            }
            RawScalar::Text(text) => text.trim().parse::<i64>().map_err(|_| {
                PredictError::invalid(format!("{} is not an integer: {:?}", field, text))
            }),
        }
    }
}

/// Body of `POST /predict`.
///
/// Fields are optional at the serde level so that a missing field produces a
/// named input error instead of a generic decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRequest {
    pub diameter: Option<RawScalar>,
    pub pitch: Option<RawScalar>,
    pub blades: Option<RawScalar>,
    pub advance_ratio: Option<RawScalar>,
}

fn required<'a>(value: &'a Option<RawScalar>, field: &str) -> Result<&'a RawScalar, PredictError> {
    value
        .as_ref()
        .ok_or_else(|| PredictError::invalid(format!("missing field `{}`", field)))
}

impl PredictionRequest {
    /// Decode a raw request body. Only a JSON object is accepted.
    pub fn from_slice(body: &[u8]) -> Result<Self, PredictError> {
        let malformed = |e: serde_json::Error| {
            PredictError::invalid(format!("malformed request body: {}", e))
        };

        let fields: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(body).map_err(malformed)?;
        serde_json::from_value(serde_json::Value::Object(fields)).map_err(malformed)
    }

    /// Coerce and validate the four inputs.
    ///
    /// `blades` must be integral: `2.0` and `"2"` are accepted, but `2.5` is
    /// rejected rather than truncated toward zero.
    pub fn into_query(self) -> Result<PropellerQuery, PredictError> {
        let diameter = required(&self.diameter, "diameter")?.as_float("diameter")?;
        let pitch = required(&self.pitch, "pitch")?.as_float("pitch")?;
        let blades = required(&self.blades, "blades")?.as_integer("blades")?;
        let advance_ratio =
            required(&self.advance_ratio, "advance_ratio")?.as_float("advance_ratio")?;

        PropellerQuery::new(diameter, pitch, blades, advance_ratio)
    }
}

/// Body returned by `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub matched_brand: String,
    pub matched_diameter: f64,
    pub matched_pitch: f64,
    pub thrust_coefficient: f64,
    pub power_coefficient: f64,
    pub efficiency: f64,
}

/// The three predicted coefficients for one operating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub thrust: f64,
    pub power: f64,
    pub efficiency: f64,
}

impl PredictionResponse {
    /// Echo the matched row alongside the predicted coefficients.
    pub fn new(matched: &ReferenceRow, coefficients: Coefficients) -> Self {
        Self {
            matched_brand: matched.brand.clone(),
            matched_diameter: matched.diameter,
            matched_pitch: matched.pitch,
            thrust_coefficient: coefficients.thrust,
            power_coefficient: coefficients.power,
            efficiency: coefficients.efficiency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<PropellerQuery, PredictError> {
        PredictionRequest::from_slice(body.as_bytes())?.into_query()
    }

    #[test]
    fn test_numeric_request() {
        let query = parse(r#"{"diameter": 10, "pitch": 4.5, "blades": 3, "advance_ratio": 0.4}"#)
            .unwrap();

        assert_eq!(query.diameter, 10.0);
        assert_eq!(query.pitch, 4.5);
        assert_eq!(query.blade_count, 3);
        assert_eq!(query.advance_ratio, 0.4);
    }

    #[test]
    fn test_string_coercion() {
        let query = parse(r#"{"diameter": "10", "pitch": " 8 ", "blades": "2", "advance_ratio": "0.5"}"#)
            .unwrap();

        assert_eq!(query.diameter, 10.0);
        assert_eq!(query.pitch, 8.0);
        assert_eq!(query.blade_count, 2);
    }

    #[test]
    fn test_integral_float_blades() {
        let query = parse(r#"{"diameter": 10, "pitch": 8, "blades": 2.0, "advance_ratio": 0.5}"#)
            .unwrap();
        assert_eq!(query.blade_count, 2);

        let err = parse(r#"{"diameter": 10, "pitch": 8, "blades": 2.5, "advance_ratio": 0.5}"#)
            .unwrap_err();
        assert!(matches!(err, PredictError::InvalidInput(_)));
    }

    #[test]
    fn test_missing_field_is_named() {
        let err = parse(r#"{"diameter": 10, "blades": 2, "advance_ratio": 0.5}"#).unwrap_err();
        assert_eq!(err.to_string(), "invalid input: missing field `pitch`");

        let err = parse(r#"{"diameter": 10, "pitch": null, "blades": 2, "advance_ratio": 0.5}"#)
            .unwrap_err();
        assert!(err.to_string().contains("pitch"));
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            parse("not json").unwrap_err(),
            PredictError::InvalidInput(_)
        ));
        assert!(matches!(
            parse(r#"{"diameter": "ten", "pitch": 8, "blades": 2, "advance_ratio": 0.5}"#)
                .unwrap_err(),
            PredictError::InvalidInput(_)
        ));
        assert!(matches!(
            parse(r#"{"diameter": true, "pitch": 8, "blades": 2, "advance_ratio": 0.5}"#)
                .unwrap_err(),
            PredictError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_only_object_bodies_accepted() {
        for body in [r#"[10, 8, 2, 0.5]"#, "10", r#""diameter""#, "null"] {
            let err = parse(body).unwrap_err();
            assert!(
                err.to_string().contains("malformed request body"),
                "body: {}",
                body
            );
        }
    }

    #[test]
    fn test_response_echoes_matched_row() {
        let row = ReferenceRow {
            brand: "X".to_string(),
            diameter: 10.0,
            pitch: 8.0,
            blade_count: 2,
            blade_area: 1.0,
            disc_area: 2.0,
            total_blade_area: 2.0,
            solidity: 1.0,
        };
        let response = PredictionResponse::new(
            &row,
            Coefficients {
                thrust: 0.1,
                power: 0.05,
                efficiency: 0.6,
            },
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["matched_brand"], "X");
        assert_eq!(json["matched_diameter"], 10.0);
        assert_eq!(json["matched_pitch"], 8.0);
        assert_eq!(json["thrust_coefficient"], 0.1);
        assert_eq!(json["power_coefficient"], 0.05);
        assert_eq!(json["efficiency"], 0.6);
    }
}
