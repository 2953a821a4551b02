//! Scalar regressors consumed by the prediction engine

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::debug;

use crate::features::FeatureVector;

/// A fitted model mapping a feature vector to a single value.
pub trait Regressor: Send + Sync {
    /// Identifier used in logs and error messages
    fn name(&self) -> &str;

    /// Predict one value for one feature vector.
    fn predict(&self, features: &FeatureVector) -> Result<f64>;
}

/// Regressor backed by an ONNX Runtime session.
pub struct OnnxRegressor {
    /// Model name
    pub name: String,
    /// ONNX Runtime session; running it needs exclusive access
    session: Mutex<Session>,
    /// Input name for the feature tensor
    pub input_name: String,
    /// Output name for the predicted value
    pub output_name: String,
}

impl OnnxRegressor {
    pub fn new(name: String, session: Session, input_name: String, output_name: String) -> Self {
        Self {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
        }
    }
}

impl Regressor for OnnxRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let data = features.to_f32();

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, data.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, data)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;
        let output = outputs
            .get(self.output_name.as_str())
            .with_context(|| format!("Model output '{}' missing", self.output_name))?;

        // sklearn regressors export a [batch, 1] tensor, usually f32
        let value = if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            data.first().map(|&v| v as f64)
        } else {
            let (_, data) = output
                .try_extract_tensor::<f64>()
                .context("Model output is neither an f32 nor an f64 tensor")?;
            data.first().copied()
        };

        let value = value.context("Model output tensor is empty")?;
        debug!(model = %self.name, value = value, "Regressor output");

        Ok(value)
    }
}

/// Linear model over the feature vector. Used for fixtures and smoke tests
/// where no ONNX artifacts are available.
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    pub name: String,
    pub weights: [f64; crate::features::FEATURE_COUNT],
    pub bias: f64,
}

impl LinearRegressor {
    pub fn constant(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            weights: [0.0; crate::features::FEATURE_COUNT],
            bias: value,
        }
    }
}

impl Regressor for LinearRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let dot: f64 = self
            .weights
            .iter()
            .zip(features.values())
            .map(|(w, x)| w * x)
            .sum();
        Ok(dot + self.bias)
    }
}
