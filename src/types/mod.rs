//! Type definitions for the prediction service

pub mod prediction;
pub mod propeller;

pub use prediction::{Coefficients, PredictionRequest, PredictionResponse};
pub use propeller::{PropellerQuery, ReferenceRow};
