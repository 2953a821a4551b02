//! Propeller Prediction Service - Main Entry Point
//!
//! Loads reference tables and ONNX regressors, then serves predictions over HTTP.

use anyhow::Result;
use propeller_predict::{
    config::{AppConfig, LogFormat, LoggingConfig, DEFAULT_CONFIG_PATH},
    dataset::{PassthroughDataset, PassthroughDatasets},
    metrics::{MetricsReporter, ServiceMetrics},
    predictor::{PredictionContext, Predictor},
    server::{self, AppState},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)?,
    };

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load_from_path(&config_path)?;

    init_logging(&config.logging)?;

    info!("Starting Propeller Prediction Service");
    info!(path = %config_path, "Configuration loaded successfully");

    // Everything below must load before the listener is bound
    let context = Arc::new(PredictionContext::load(&config)?);

    let rows = config.data.passthrough_rows;
    let datasets = Arc::new(PassthroughDatasets {
        experiment: PassthroughDataset::load("experiment", &config.data.experiment_dataset, rows)?,
        geometry: PassthroughDataset::load("geometry", &config.data.geometry_dataset, rows)?,
    });

    let metrics = Arc::new(ServiceMetrics::new());
    let predictor = Arc::new(Predictor::new(context, metrics.clone()));

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let app = server::router(
        AppState {
            predictor,
            datasets,
        },
        config.server.cors_permissive,
    );

    server::serve(&config.listen_addr(), app).await?;

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}
