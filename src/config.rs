//! Configuration management for the prediction service

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allow any origin; the browser frontend is served from another port
    #[serde(default = "default_true")]
    pub cors_permissive: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_permissive: true,
        }
    }
}

/// Dataset locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Reference table for 2-blade propellers
    pub family_a_table: PathBuf,
    /// Reference table for all other blade counts
    pub family_b_table: PathBuf,
    /// Experimental performance dataset served by /api/experiment
    pub experiment_dataset: PathBuf,
    /// Blade geometry dataset served by /api/geometry
    pub geometry_dataset: PathBuf,
    /// Leading rows kept from each passthrough dataset
    #[serde(default = "default_passthrough_rows")]
    pub passthrough_rows: usize,
}

fn default_passthrough_rows() -> usize {
    250
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            family_a_table: PathBuf::from("data/df_modelA.csv"),
            family_b_table: PathBuf::from("data/df_modelB.csv"),
            experiment_dataset: PathBuf::from("data/experiment_brand_diverse.csv"),
            geometry_dataset: PathBuf::from("data/geometry_brand_diverse.csv"),
            passthrough_rows: default_passthrough_rows(),
        }
    }
}

/// ONNX file names for one model family
#[derive(Debug, Clone, Deserialize)]
pub struct FamilyModelFiles {
    pub thrust: String,
    pub power: String,
    pub efficiency: String,
}

impl FamilyModelFiles {
    fn for_prefix(prefix: &str) -> Self {
        Self {
            thrust: format!("{}_CT.onnx", prefix),
            power: format!("{}_CP.onnx", prefix),
            efficiency: format!("{}_EF.onnx", prefix),
        }
    }
}

/// ML models configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory containing ONNX model files
    pub models_dir: PathBuf,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    #[serde(default = "default_family_a_files")]
    pub family_a: FamilyModelFiles,
    #[serde(default = "default_family_b_files")]
    pub family_b: FamilyModelFiles,
}

fn default_onnx_threads() -> usize {
    1
}

fn default_family_a_files() -> FamilyModelFiles {
    FamilyModelFiles::for_prefix("modelA")
}

fn default_family_b_files() -> FamilyModelFiles {
    FamilyModelFiles::for_prefix("modelB")
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            onnx_threads: default_onnx_threads(),
            family_a: default_family_a_files(),
            family_b: default_family_b_files(),
        }
    }
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between summaries; 0 disables the reporter
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_report_interval() -> u64 {
    60
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific path, with `PROPELLER__SECTION__KEY`
    /// environment variables taking precedence.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("PROPELLER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Socket address string for the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data: DataConfig::default(),
            models: ModelsConfig::default(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.data.passthrough_rows, 250);
        assert_eq!(config.models.family_a.thrust, "modelA_CT.onnx");
        assert_eq!(config.models.family_b.efficiency, "modelB_EF.onnx");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.listen_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080

[data]
family_a_table = "fixtures/a.csv"
family_b_table = "fixtures/b.csv"
experiment_dataset = "fixtures/experiment.csv"
geometry_dataset = "fixtures/geometry.csv"

[models]
models_dir = "fixtures/models"

[models.family_b]
thrust = "b_ct.onnx"
power = "b_cp.onnx"
efficiency = "b_ef.onnx"

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.data.family_a_table, PathBuf::from("fixtures/a.csv"));
        assert_eq!(config.models.onnx_threads, 1);
        assert_eq!(config.models.family_a.power, "modelA_CP.onnx");
        assert_eq!(config.models.family_b.thrust, "b_ct.onnx");
        assert_eq!(config.metrics.report_interval_secs, 60);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(AppConfig::load_from_path("/nonexistent/config.toml").is_err());
    }
}
