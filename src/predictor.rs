//! Prediction engine: family selection, nearest-match lookup and inference

use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::dataset::ReferenceTable;
use crate::error::PredictError;
use crate::features::FeatureVector;
use crate::metrics::ServiceMetrics;
use crate::models::family::{Family, ModelFamily, Target};
use crate::models::loader::ModelLoader;
use crate::resolver;
use crate::types::prediction::{Coefficients, PredictionResponse};
use crate::types::propeller::PropellerQuery;

/// A model family together with the reference table its features come from.
#[derive(Debug)]
pub struct FamilyResources {
    pub models: ModelFamily,
    pub table: ReferenceTable,
}

impl FamilyResources {
    pub fn new(models: ModelFamily, table: ReferenceTable) -> Self {
        Self { models, table }
    }
}

/// Everything loaded at startup and read by every request.
#[derive(Debug)]
pub struct PredictionContext {
    family_a: FamilyResources,
    family_b: FamilyResources,
}

impl PredictionContext {
    pub fn new(family_a: FamilyResources, family_b: FamilyResources) -> Self {
        Self { family_a, family_b }
    }

    /// Load both reference tables and all six regressors.
    ///
    /// Fails if any table is missing or empty, or any model cannot be loaded.
    pub fn load(config: &AppConfig) -> Result<Self> {
        let table_a = ReferenceTable::load("A", &config.data.family_a_table)?;
        let table_b = ReferenceTable::load("B", &config.data.family_b_table)?;

        let loader = ModelLoader::with_threads(config.models.onnx_threads)?;
        let models_a =
            loader.load_family(Family::A, &config.models.models_dir, &config.models.family_a)?;
        let models_b =
            loader.load_family(Family::B, &config.models.models_dir, &config.models.family_b)?;

        info!(
            family_a_rows = table_a.len(),
            family_b_rows = table_b.len(),
            "Prediction context loaded"
        );

        Ok(Self::new(
            FamilyResources::new(models_a, table_a),
            FamilyResources::new(models_b, table_b),
        ))
    }

    /// Pick the family serving a blade count.
    pub fn select(&self, blade_count: i64) -> (Family, &FamilyResources) {
        let family = Family::for_blade_count(blade_count);
        let resources = match family {
            Family::A => &self.family_a,
            Family::B => &self.family_b,
        };
        (family, resources)
    }
}

/// Result of a prediction with the intermediate values that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub family: Family,
    pub features: FeatureVector,
    /// Index of the matched row in the family's reference table
    pub matched_index: usize,
    pub blade_fallback: bool,
    pub response: PredictionResponse,
}

/// Answers prediction queries against a loaded context
pub struct Predictor {
    context: Arc<PredictionContext>,
    metrics: Arc<ServiceMetrics>,
}

impl Predictor {
    pub fn new(context: Arc<PredictionContext>, metrics: Arc<ServiceMetrics>) -> Self {
        Self { context, metrics }
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    /// Run one prediction. Either all three coefficients are produced or the
    /// call fails.
    pub fn predict(&self, query: &PropellerQuery) -> Result<Prediction, PredictError> {
        let start_time = Instant::now();

        let (family, resources) = self.context.select(query.blade_count);
        if Family::is_unusual_blade_count(query.blade_count) {
            self.metrics.record_unusual_blade_count();
            warn!(
                blade_count = query.blade_count,
                family = %family,
                "Blade count outside trained range"
            );
        }

        let matched = resolver::resolve(
            &resources.table,
            query.diameter,
            query.pitch,
            query.blade_count,
        );
        if matched.blade_fallback {
            self.metrics.record_blade_fallback();
            warn!(
                table = %resources.table.name(),
                blade_count = query.blade_count,
                matched_brand = %matched.row.brand,
                "No reference rows with requested blade count, matched across whole table"
            );
        }

        let features = FeatureVector::assemble(query, matched.row);

        let thrust = self.run(&resources.models, Target::Thrust, &features)?;
        let power = self.run(&resources.models, Target::Power, &features)?;
        let efficiency = self.run(&resources.models, Target::Efficiency, &features)?;

        let response = PredictionResponse::new(
            matched.row,
            Coefficients {
                thrust,
                power,
                efficiency,
            },
        );

        let elapsed = start_time.elapsed();
        self.metrics.record_prediction(family, elapsed);

        debug!(
            family = %family,
            matched_brand = %matched.row.brand,
            matched_index = matched.index,
            diameter_diff = matched.diameter_diff,
            pitch_diff = matched.pitch_diff,
            blade_fallback = matched.blade_fallback,
            elapsed_us = elapsed.as_micros() as u64,
            "Prediction complete"
        );

        Ok(Prediction {
            family,
            features,
            matched_index: matched.index,
            blade_fallback: matched.blade_fallback,
            response,
        })
    }

    fn run(
        &self,
        models: &ModelFamily,
        target: Target,
        features: &FeatureVector,
    ) -> Result<f64, PredictError> {
        let regressor = models.regressor(target);
        let start_time = Instant::now();

        let outcome = regressor.predict(features).and_then(|value| {
            if value.is_finite() {
                Ok(value)
            } else {
                Err(anyhow::anyhow!("model returned non-finite value {}", value))
            }
        });

        match outcome {
            Ok(value) => {
                self.metrics.record_model_time(target, start_time.elapsed());
                Ok(value)
            }
            Err(e) => {
                self.metrics.record_inference_error();
                error!(
                    model = %regressor.name(),
                    target = %target,
                    error = %e,
                    "Model inference failed"
                );
                Err(PredictError::Inference {
                    target,
                    message: format!("{:#}", e),
                })
            }
        }
    }
}
