//! HTTP surface of the classifier

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ClassifierConfig;
use crate::error::{Error, Result};
use crate::features::ApplicantRecord;
use crate::model::TreeEnsemble;

/// Label for the approving class
pub const APPROVED_CLASS: i64 = 1;

#[derive(Clone)]
pub struct AppState {
    model: Arc<TreeEnsemble>,
}

impl AppState {
    pub fn new(model: TreeEnsemble) -> Self {
        Self {
            model: Arc::new(model),
        }
    }

    pub fn model(&self) -> &TreeEnsemble {
        &self.model
    }
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: &'static str,
}

pub struct ClassifierServer {
    config: ClassifierConfig,
    state: AppState,
}

impl ClassifierServer {
    /// Load the model named in the configuration
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let model = TreeEnsemble::load(&config.model_path)?;
        tracing::info!(
            "Loaded model from {} ({} trees, {} features)",
            config.model_path.display(),
            model.trees.len(),
            model.n_features()
        );
        Ok(Self {
            config,
            state: AppState::new(model),
        })
    }

    pub fn build_router(&self) -> Router {
        router(self.state.clone())
    }

    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();
        tracing::info!("Starting classifier on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    pub fn address(&self) -> String {
        self.config.address()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/predict", post(predict).fallback(method_not_allowed))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Only POST requests are allowed" })),
    )
}

/// POST /predict
async fn predict(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>> {
    let Json(value) = body.map_err(|e| Error::invalid_input(format!("Invalid JSON body: {}", e)))?;
    let record = ApplicantRecord::from_value(value)?;

    let features = record.encode(state.model());
    let class = state.model().predict(&features)?;

    let prediction = if class == APPROVED_CLASS {
        "Approved"
    } else {
        "Rejected"
    };
    tracing::info!("Prediction: {}", prediction);

    Ok(Json(PredictionResponse { prediction }))
}
