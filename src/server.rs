//! HTTP interface: prediction endpoint and dataset explorer endpoints

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Instrument};

use crate::dataset::{PassthroughDataset, PassthroughDatasets};
use crate::error::{ErrorBody, PredictError};
use crate::predictor::Predictor;
use crate::types::prediction::{PredictionRequest, PredictionResponse};

/// Shared state for the server.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub datasets: Arc<PassthroughDatasets>,
}

/// Build the application router.
pub fn router(state: AppState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/predict", post(post_predict))
        .route("/api/experiment", get(get_experiment).post(get_experiment))
        .route("/api/geometry", get(get_geometry).post(get_geometry))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Bind the listener and serve until Ctrl-C.
pub async fn serve(addr: &str, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

/// Handler for POST /predict
async fn post_predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, PredictError> {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("predict", request_id = %request_id);

    async move {
        let query = PredictionRequest::from_slice(&body)
            .and_then(PredictionRequest::into_query)
            .map_err(|e| {
                state.predictor.metrics().record_input_error();
                warn!(error = %e, "Rejected prediction request");
                e
            })?;

        let prediction = state.predictor.predict(&query)?;

        info!(
            family = %prediction.family,
            matched_brand = %prediction.response.matched_brand,
            blade_fallback = prediction.blade_fallback,
            "Prediction served"
        );

        Ok(Json(prediction.response))
    }
    .instrument(span)
    .await
}

/// Handler for GET|POST /api/experiment
async fn get_experiment(State(state): State<AppState>) -> Response {
    dataset_response(&state.datasets.experiment)
}

/// Handler for GET|POST /api/geometry
async fn get_geometry(State(state): State<AppState>) -> Response {
    dataset_response(&state.datasets.geometry)
}

fn dataset_response(dataset: &PassthroughDataset) -> Response {
    match serde_json::to_vec(dataset.records()) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to serialize dataset");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "failed to serialize dataset".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ServiceMetrics;
    use crate::test_support::{context, reference_row};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let mut row = reference_row("X", 10.0, 8.0, 2);
        row.blade_area = 1.0;
        row.disc_area = 2.0;
        row.total_blade_area = 2.0;
        row.solidity = 1.0;

        let predictor = Predictor::new(
            Arc::new(context(vec![row], vec![reference_row("Y", 12.0, 6.0, 3)])),
            Arc::new(ServiceMetrics::new()),
        );

        let experiment = PassthroughDataset::read(
            "propeller_brand,propeller_diameter,efficiency_output\napc,9,\nkde,10,0.61\n"
                .as_bytes(),
            250,
        )
        .unwrap();
        let geometry =
            PassthroughDataset::read("blade_name,c/R,r/R\nb1,0.1,0.15\n".as_bytes(), 250).unwrap();

        router(
            AppState {
                predictor: Arc::new(predictor),
                datasets: Arc::new(PassthroughDatasets {
                    experiment,
                    geometry,
                }),
            },
            true,
        )
    }

    async fn send(app: Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_predict_contract() {
        let (status, body) = send(
            app(),
            Method::POST,
            "/predict",
            r#"{"diameter": 10, "pitch": 8, "blades": 2, "advance_ratio": 0.5}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "matched_brand": "X",
                "matched_diameter": 10.0,
                "matched_pitch": 8.0,
                "thrust_coefficient": 0.1,
                "power_coefficient": 0.05,
                "efficiency": 0.6
            })
        );
    }

    #[tokio::test]
    async fn test_predict_family_b() {
        let (status, body) = send(
            app(),
            Method::POST,
            "/predict",
            r#"{"diameter": "11", "pitch": "7", "blades": "3", "advance_ratio": "0.2"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matched_brand"], "Y");
        assert_eq!(body["thrust_coefficient"], 0.2);
    }

    #[tokio::test]
    async fn test_predict_rejects_bad_input() {
        for payload in [
            r#"{"pitch": 8, "blades": 2, "advance_ratio": 0.5}"#,
            r#"{"diameter": "abc", "pitch": 8, "blades": 2, "advance_ratio": 0.5}"#,
            r#"{"diameter": 10, "pitch": 8, "blades": 2.5, "advance_ratio": 0.5}"#,
            r#"{"diameter": -10, "pitch": 8, "blades": 2, "advance_ratio": 0.5}"#,
            "not json",
            "[10, 8, 2, 0.5]",
        ] {
            let (status, body) = send(app(), Method::POST, "/predict", payload).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {}", payload);
            assert!(body["error"].as_str().unwrap().starts_with("invalid input"));
        }
    }

    #[tokio::test]
    async fn test_predict_requires_post() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/predict")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_passthrough_endpoints() {
        let (status, body) = send(app(), Method::GET, "/api/experiment", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"propeller_brand": "apc", "propeller_diameter": 9, "efficiency_output": null},
                {"propeller_brand": "kde", "propeller_diameter": 10, "efficiency_output": 0.61}
            ])
        );

        let (status, body) = send(app(), Method::POST, "/api/geometry", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"blade_name": "b1", "c/R": 0.1, "r/R": 0.15}]));
    }
}
