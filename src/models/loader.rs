//! ONNX model loader

use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

use crate::config::FamilyModelFiles;
use crate::features::FEATURE_NAMES;
use crate::models::family::{Family, ModelFamily};
use crate::models::regressor::OnnxRegressor;

/// Loader for ONNX regressors
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().with_name("propeller-predict").commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a single regressor from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<OnnxRegressor> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .context("Model declares no inputs")?;

        // skl2onnx names the regression output "variable"
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name == "variable")
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .context("Model declares no outputs")?;

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            features = ?FEATURE_NAMES,
            "Model loaded successfully"
        );

        Ok(OnnxRegressor::new(
            name.to_string(),
            session,
            input_name,
            output_name,
        ))
    }

    /// Load the three regressors of one family. Every model must load.
    pub fn load_family<P: AsRef<Path>>(
        &self,
        family: Family,
        models_dir: P,
        files: &FamilyModelFiles,
    ) -> Result<ModelFamily> {
        let models_dir = models_dir.as_ref();

        let load = |file: &str| -> Result<OnnxRegressor> {
            let path = models_dir.join(file);
            if !path.exists() {
                anyhow::bail!("Model file not found: {}", path.display());
            }
            let name = Path::new(file)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(file);
            self.load_model(&path, name)
        };

        let models = ModelFamily::new(
            Box::new(load(&files.thrust)?),
            Box::new(load(&files.power)?),
            Box::new(load(&files.efficiency)?),
        );

        info!(
            family = %family,
            models = ?models.model_names(),
            "Loaded model family from {}",
            models_dir.display()
        );

        Ok(models)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { onnx_threads: 1 }
    }
}
