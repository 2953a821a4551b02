//! Sample Request Generator
//!
//! Generates plausible prediction requests and posts them to a running
//! prediction service.
//!
//! Usage: sample-requests [base_url] [count] [delay_ms]

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Request body matching the service's /predict contract
#[derive(Debug, Clone, Serialize)]
struct PredictionRequest {
    diameter: f64,
    pitch: f64,
    blades: i64,
    advance_ratio: f64,
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    matched_brand: String,
    matched_diameter: f64,
    matched_pitch: f64,
    thrust_coefficient: f64,
    power_coefficient: f64,
    efficiency: f64,
}

/// Request generator for testing
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Small-UAV geometry in inches, mostly 2-blade like the reference data
    fn generate(&mut self) -> PredictionRequest {
        let blades = if self.rng.gen_bool(0.6) {
            2
        } else {
            self.rng.gen_range(3..=4)
        };
        let diameter = round1(self.rng.gen_range(4.0..20.0));
        // Pitch ratio between 0.3 and 1.0 of diameter
        let pitch = round1(diameter * self.rng.gen_range(0.3..1.0));

        PredictionRequest {
            diameter,
            pitch,
            blades,
            advance_ratio: round1(self.rng.gen_range(0.0..0.9)),
        }
    }
}

/// Round to one decimal place
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_requests=info".parse()?),
        )
        .init();

    info!("Starting Sample Request Generator");

    let args: Vec<String> = std::env::args().collect();
    let base_url = args
        .get(1)
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| "http://127.0.0.1:5000".to_string());
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let delay_ms: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        base_url = %base_url,
        count = count,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let predict_url = format!("{}/predict", base_url);

    // Probe once; fall back to printing requests when nothing is listening
    let probe = client.get(format!("{}/api/geometry", base_url)).send().await;
    if let Err(e) = probe {
        warn!(error = %e, "Service unreachable. Running in dry-run mode.");
        return run_dry_mode(count, delay_ms).await;
    }

    let mut generator = RequestGenerator::new();
    let mut succeeded = 0u64;
    let mut failed = 0u64;

    info!("Starting to send {} requests...", count);

    for i in 0..count {
        let request = generator.generate();

        match send_prediction(&client, &predict_url, &request).await {
            Ok(prediction) => {
                succeeded += 1;
                info!(
                    diameter = request.diameter,
                    pitch = request.pitch,
                    blades = request.blades,
                    advance_ratio = request.advance_ratio,
                    matched = %format!(
                        "{} {}x{}",
                        prediction.matched_brand, prediction.matched_diameter, prediction.matched_pitch
                    ),
                    ct = prediction.thrust_coefficient,
                    cp = prediction.power_coefficient,
                    efficiency = prediction.efficiency,
                    "Prediction"
                );
            }
            Err(e) => {
                failed += 1;
                warn!(error = %format!("{:#}", e), "Prediction request failed");
            }
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Sent {}/{} requests ({} succeeded, {} failed)",
                i + 1,
                count,
                succeeded,
                failed
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} requests ({} succeeded, {} failed)",
        count, succeeded, failed
    );

    Ok(())
}

/// Post one request. Transport errors, non-2xx statuses and unreadable
/// bodies all come back as `Err`.
async fn send_prediction(
    client: &reqwest::Client,
    url: &str,
    request: &PredictionRequest,
) -> anyhow::Result<PredictionResponse> {
    let response = client.post(url).json(request).send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("status {}: {}", status, body);
    }

    Ok(response.json().await?)
}

async fn run_dry_mode(count: u64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no service connection)");

    let mut generator = RequestGenerator::new();

    for i in 0..count {
        let request = generator.generate();
        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_requests_are_plausible() {
        let mut generator = RequestGenerator::new();
        for _ in 0..200 {
            let request = generator.generate();
            assert!((2..=4).contains(&request.blades));
            assert!(request.diameter >= 4.0 && request.diameter <= 20.0);
            assert!(request.pitch > 0.0 && request.pitch <= request.diameter);
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error_not_an_abort() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        let request = RequestGenerator::new().generate();

        // Nothing listens on port 1
        let result = send_prediction(&client, "http://127.0.0.1:1/predict", &request).await;
        assert!(result.is_err());
    }
}
