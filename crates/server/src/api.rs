//! HTTP API: prediction, batch scoring, ranking, health checks and Prometheus metrics

use axum::{
    extract::{FromRequest, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use hiring_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    observability::{HiringMetrics, StructuredLogger},
    Candidate, FallbackPredictor, HiringError, HiringPredictor, MatchInsight, ModelHandle,
    PredictionResult, RankedCandidate, RawFeatures,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: HiringPredictor,
    pub fallback: Option<FallbackPredictor>,
    pub health_registry: HealthRegistry,
    pub metrics: HiringMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        handle: ModelHandle,
        health_registry: HealthRegistry,
        metrics: HiringMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            predictor: HiringPredictor::new(handle),
            fallback: None,
            health_registry,
            metrics,
            logger,
        }
    }

    /// Serve heuristic scores while no model is loaded
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled.then(FallbackPredictor::new);
        self
    }

    pub fn handle(&self) -> &ModelHandle {
        self.predictor.handle()
    }

    /// Refresh metrics and component health after the loaded model changed
    pub async fn model_changed(&self) {
        let current = self.handle().current();
        match &current {
            Some(model) => {
                self.metrics
                    .set_model(Some(&model.version), model.schema().kind().as_str());
                self.health_registry.set_healthy(components::MODEL).await;
            }
            None => {
                self.metrics.set_model(None, "none");
                let message = if self.fallback.is_some() {
                    "no trained model loaded, serving fallback scores"
                } else {
                    "no trained model loaded"
                };
                self.health_registry.set_degraded(components::MODEL, message).await;
            }
        }
    }
}

/// Library error rendered as a JSON error body
pub struct ApiError(pub HiringError);

impl From<HiringError> for ApiError {
    fn from(err: HiringError) -> Self {
        Self(err)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            HiringError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            HiringError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            success: false,
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// JSON body of `POST /predict`
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub features: RawFeatures,
}

/// Form variant of `POST /predict`: class label plus percentage
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    pub prediction: u8,
    /// Percentage, two decimals
    pub probability: f64,
    /// Raw probability in [0, 1]
    pub score: f64,
    pub model_version: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<MatchInsight>,
}

/// JSON variant of `POST /predict`: `prediction` is the match probability
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonPredictResponse {
    pub success: bool,
    /// Raw probability in [0, 1]
    pub prediction: f64,
    pub label: u8,
    pub model_version: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<MatchInsight>,
}

/// Body encoding of a `/predict` request; selects the response shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Form,
    Json,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum PredictReply {
    Form(PredictResponse),
    Json(JsonPredictResponse),
}

impl PredictReply {
    fn new(
        kind: BodyKind,
        result: PredictionResult,
        insight: Option<MatchInsight>,
        message: &str,
    ) -> Self {
        match kind {
            BodyKind::Form => PredictReply::Form(PredictResponse {
                success: true,
                prediction: result.label,
                probability: result.probability_percent(),
                score: result.probability,
                model_version: result.model_version,
                message: message.to_string(),
                insight,
            }),
            BodyKind::Json => PredictReply::Json(JsonPredictResponse {
                success: true,
                prediction: result.probability,
                label: result.label,
                model_version: result.model_version,
                message: message.to_string(),
                insight,
            }),
        }
    }

    fn label(&self) -> u8 {
        match self {
            PredictReply::Form(r) => r.prediction,
            PredictReply::Json(r) => r.label,
        }
    }

    fn score(&self) -> f64 {
        match self {
            PredictReply::Form(r) => r.score,
            PredictReply::Json(r) => r.prediction,
        }
    }

    fn model_version(&self) -> &str {
        match self {
            PredictReply::Form(r) => &r.model_version,
            PredictReply::Json(r) => &r.model_version,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub data: Vec<Vec<f64>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub predictions: Vec<f64>,
    pub model_version: String,
}

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RankResponse {
    pub success: bool,
    /// Highest match score first
    pub candidates: Vec<RankedCandidate>,
    pub model_version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub model_version: String,
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |ct| ct.starts_with("application/json"))
}

/// Decode either a JSON `{"features": {...}}` body or a form body.
/// Form submissions must carry every feature of the active schema.
async fn read_features(
    state: &Arc<AppState>,
    request: Request,
) -> Result<(RawFeatures, BodyKind), ApiError> {
    if is_json(request.headers()) {
        let Json(body) = Json::<PredictRequest>::from_request(request, state)
            .await
            .map_err(|rejection| HiringError::invalid_input("body", rejection.body_text()))?;
        return Ok((body.features, BodyKind::Json));
    }

    let Form(fields) = Form::<HashMap<String, String>>::from_request(request, state)
        .await
        .map_err(|rejection| HiringError::invalid_input("body", rejection.body_text()))?;

    let schema = match state.predictor.schema() {
        Ok(schema) => schema,
        Err(HiringError::ModelUnavailable) if state.fallback.is_some() => {
            hiring_lib::FeatureSchema::smart_hiring()
        }
        Err(e) => return Err(e.into()),
    };
    if let Some(missing) = schema.features().iter().find(|name| !fields.contains_key(*name)) {
        return Err(HiringError::invalid_input(missing.as_str(), "required field is missing").into());
    }
    let raw: RawFeatures = fields
        .into_iter()
        .map(|(name, value)| (name, serde_json::Value::String(value)))
        .collect();
    Ok((raw, BodyKind::Form))
}

async fn predict(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let start = Instant::now();
    match run_prediction(&state, request).await {
        Ok(reply) => {
            let elapsed = start.elapsed().as_secs_f64();
            let source = if reply.model_version() == hiring_lib::predictor::FALLBACK_VERSION {
                "fallback"
            } else {
                "model"
            };
            state.metrics.observe_prediction_latency(elapsed);
            state.metrics.inc_predictions_served(source);
            state
                .logger
                .log_prediction(reply.label(), reply.score(), reply.model_version(), elapsed);
            (StatusCode::OK, Json(reply)).into_response()
        }
        Err(err) => {
            state.metrics.inc_prediction_errors(err.0.kind());
            warn!(error = %err.0, kind = err.0.kind(), "Prediction request failed");
            err.into_response()
        }
    }
}

async fn run_prediction(state: &Arc<AppState>, request: Request) -> Result<PredictReply, ApiError> {
    let (raw, kind) = read_features(state, request).await?;

    match state.predictor.predict(&raw) {
        Ok(result) => {
            let insight = state.predictor.explain(&raw)?;
            Ok(PredictReply::new(
                kind,
                result,
                insight,
                "Random Forest prediction successful",
            ))
        }
        Err(HiringError::ModelUnavailable) => match &state.fallback {
            Some(fallback) => Ok(PredictReply::new(
                kind,
                fallback.predict(&raw)?,
                Some(fallback.explain(&raw)?),
                "No trained model loaded; heuristic score returned",
            )),
            None => Err(HiringError::ModelUnavailable.into()),
        },
        Err(e) => Err(e.into()),
    }
}

/// Batch scoring of schema-ordered vectors
async fn score(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ScoreRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let Json(request) =
        body.map_err(|rejection| HiringError::invalid_input("data", rejection.body_text()))?;

    let start = Instant::now();
    let (predictions, model_version) =
        state
            .predictor
            .predict_batch(&request.data)
            .map_err(|e| match e {
                HiringError::SchemaMismatch { .. } => HiringError::invalid_input("data", e.to_string()),
                other => other,
            })?;

    state.metrics.observe_prediction_latency(start.elapsed().as_secs_f64());
    Ok(Json(ScoreResponse {
        predictions,
        model_version,
    }))
}

/// Score a candidate pool and return it sorted by match score
async fn rank(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RankRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<RankResponse>, ApiError> {
    let Json(request) =
        body.map_err(|rejection| HiringError::invalid_input("candidates", rejection.body_text()))?;

    let start = Instant::now();
    let (candidates, model_version) = match state.predictor.rank(&request.candidates) {
        Ok(ranked) => ranked,
        Err(HiringError::ModelUnavailable) => match &state.fallback {
            Some(fallback) => (
                fallback.rank(&request.candidates),
                hiring_lib::predictor::FALLBACK_VERSION.to_string(),
            ),
            None => {
                state.metrics.inc_prediction_errors(HiringError::ModelUnavailable.kind());
                return Err(HiringError::ModelUnavailable.into());
            }
        },
        Err(e) => return Err(e.into()),
    };

    state.metrics.observe_prediction_latency(start.elapsed().as_secs_f64());
    info!(
        candidates = candidates.len(),
        unscored = candidates.iter().filter(|c| !c.scored).count(),
        model_version = %model_version,
        "Candidates ranked"
    );
    Ok(Json(RankResponse {
        success: true,
        candidates,
        model_version,
    }))
}

/// Always 200; reports whether a model is loaded
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.health_registry.health(state.handle().version()).await)
}

/// Liveness: 200 unless a component is unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health(state.handle().version()).await;
    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(health))
}

/// Readiness: 503 until a model is loaded
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state
        .health_registry
        .readiness(state.handle().is_loaded())
        .await;
    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(readiness))
}

async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

/// Re-read the artifact from the configured path
async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<ReloadResponse>, ApiError> {
    let handle = state.handle().clone();
    let path = handle
        .source()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let result = tokio::task::spawn_blocking(move || handle.reload())
        .await
        .map_err(|e| HiringError::Artifact(format!("reload task failed: {}", e)))?;

    match result {
        Ok(model) => {
            state.logger.log_model_loaded(&model.version, &path);
            state.model_changed().await;
            Ok(Json(ReloadResponse {
                success: true,
                model_version: model.version.clone(),
            }))
        }
        Err(e) => {
            state.logger.log_model_load_failed(&path, &e.to_string());
            Err(e.into())
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/score", post(score))
        .route("/rank", post(rank))
        .route("/reload", post(reload))
        .route("/health", get(health))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
