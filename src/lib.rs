//! Propeller Performance Prediction Library
//!
//! Predicts thrust coefficient, power coefficient and efficiency for a
//! propeller geometry by imputing engineered features from the nearest known
//! propeller and feeding them to pre-trained regressors.

pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod predictor;
pub mod resolver;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::AppConfig;
pub use error::PredictError;
pub use features::FeatureVector;
pub use predictor::{PredictionContext, Predictor};
pub use resolver::resolve;
pub use types::{PredictionRequest, PredictionResponse, PropellerQuery, ReferenceRow};
