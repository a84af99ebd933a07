//! JSON API over the prediction service.
//!
//! - `GET /health` artifact readiness, 503 until both are loaded
//! - `GET /locations` location names for the selector
//! - `POST /predict` single-row prediction
//! - `GET /stats` exploratory statistics of the training data

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use price_model::{
    ExploreReport, PredictionError, PredictionRequest, PredictionResponse, PredictionService,
    ServiceStatus,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: PredictionService,
    pub stats: Option<Arc<ExploreReport>>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    artifacts: ServiceStatus,
}

#[derive(Serialize)]
struct LocationsResponse {
    locations: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Prediction failure rendered with its specific reason.
pub struct ApiError(PredictionError);

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            PredictionError::ModelUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "model_unavailable")
            }
            PredictionError::MappingUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "mapping_unavailable")
            }
            PredictionError::UnknownLocation { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unknown_location")
            }
            PredictionError::InvalidDefaultLocation { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invalid_default_location")
            }
            PredictionError::InvalidMileage { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_mileage")
            }
            PredictionError::NonPositivePrediction { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "non_positive_prediction")
            }
        };

        let body = ErrorBody {
            error,
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the Axum application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/locations", get(locations_handler))
        .route("/predict", post(predict_handler))
        .route("/stats", get(stats_handler))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(addr = %addr, ready = state.service.is_ready(), "Prediction API listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Server error")
}

/// Health check endpoint
///
/// Returns 200 OK when model and mapping are loaded, 503 otherwise.
async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let ready = state.service.is_ready();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if ready { "ready" } else { "unavailable" },
            artifacts: state.service.status(),
        }),
    )
}

async fn locations_handler(
    State(state): State<AppState>,
) -> Result<Json<LocationsResponse>, ApiError> {
    let locations = state.service.location_names()?;
    Ok(Json(LocationsResponse { locations }))
}

async fn predict_handler(
    State(state): State<AppState>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let response = state.service.predict(&request)?;
    tracing::debug!(
        location = %request.location_name,
        price = response.predicted_price,
        "Prediction served"
    );
    Ok(Json(response))
}

async fn stats_handler(State(state): State<AppState>) -> Response {
    match state.stats {
        Some(stats) => Json(stats.as_ref().clone()).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorBody {
                error: "stats_unavailable",
                message: "no training data was loaded".to_string(),
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use price_model::{CategoricalEncoder, LinearRegression, TrainedModel};
    use tower::ServiceExt;

    fn ready_state() -> AppState {
        let model = TrainedModel::new(
            LinearRegression {
                intercept: 1000.0,
                coefficients: vec![-0.01, 500.0, 0.0],
            },
            80,
        );
        let mapping = CategoricalEncoder::fit(["Johor", "Selangor"]);
        AppState {
            service: PredictionService::from_parts(model, mapping),
            stats: None,
        }
    }

    fn empty_state() -> AppState {
        let dir = tempfile::tempdir().unwrap();
        AppState {
            service: PredictionService::load(dir.path()),
            stats: None,
        }
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn predict_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn predict_returns_price() {
        let (status, body) = send(
            ready_state(),
            predict_request(serde_json::json!({
                "mileage": 20000.0,
                "transmission": "Automatic",
                "location_name": "Johor"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let price = body["predicted_price"].as_f64().unwrap();
        assert!((price - 1300.0).abs() < 1e-6, "predicted {}", price);
    }

    #[tokio::test]
    async fn unknown_location_is_unprocessable() {
        let (status, body) = send(
            ready_state(),
            predict_request(serde_json::json!({
                "mileage": 1.0,
                "transmission": "Manual",
                "location_name": "Atlantis"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "unknown_location");
    }

    #[tokio::test]
    async fn missing_artifacts_are_service_unavailable() {
        let (status, body) = send(
            empty_state(),
            predict_request(serde_json::json!({
                "mileage": 1.0,
                "transmission": "Manual",
                "location_name": "Johor"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "model_unavailable");

        let (status, body) = send(
            empty_state(),
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["model"]["ready"], false);
    }

    #[tokio::test]
    async fn locations_in_code_order() {
        let (status, body) = send(
            ready_state(),
            Request::get("/locations").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["locations"], serde_json::json!(["Johor", "Selangor"]));
    }

    #[tokio::test]
    async fn stats_unavailable_without_data() {
        let (status, body) = send(
            ready_state(),
            Request::get("/stats").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "stats_unavailable");
    }
}
