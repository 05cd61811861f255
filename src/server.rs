/*
 ═══════════════════════════════════════════════════════════════════════════════
  SENTINEL SHIELD - Risk Scanner HTTP Server

  Exposes the analysis engine via REST API for integration with other
  services.
 ═══════════════════════════════════════════════════════════════════════════════
*/

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use sentinel_risk::config::Config;
use sentinel_risk::detectors::Finding;
use sentinel_risk::engine::{AnalysisResult, Engine, ImplementationResult};
use sentinel_risk::error::EngineError;

// ═══════════════════════════════════════════════════════════════════════════════
//                              REQUEST/RESPONSE TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub address: String,
    pub rpc_url: Option<String>,
    pub explorer_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FindingResponse {
    pub detector: String,
    pub severity: String,
    pub title: &'static str,
    pub description: String,
    pub points: u32,
    pub offset: Option<usize>,
}

impl From<Finding> for FindingResponse {
    fn from(finding: Finding) -> Self {
        Self {
            detector: finding.detector,
            severity: finding.severity.as_str().to_string(),
            title: finding.title,
            description: finding.description,
            points: finding.points,
            offset: finding.offset,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImplementationResponse {
    pub address: String,
    pub bytecode_size: usize,
    pub findings: Vec<FindingResponse>,
    pub category_scores: std::collections::BTreeMap<String, u32>,
}

impl From<ImplementationResult> for ImplementationResponse {
    fn from(result: ImplementationResult) -> Self {
        Self {
            address: result.address,
            bytecode_size: result.bytecode_size,
            findings: result.findings.into_iter().map(Into::into).collect(),
            category_scores: result.category_scores,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub address: String,
    pub score: u32,
    pub level: String,
    pub findings: Vec<FindingResponse>,
    pub category_scores: std::collections::BTreeMap<String, u32>,
    pub bytecode_size: usize,
    pub implementation: Option<ImplementationResponse>,
}

impl From<AnalysisResult> for AnalyzeResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            address: result.address,
            score: result.score,
            level: result.level.as_str().to_string(),
            findings: result.findings.into_iter().map(Into::into).collect(),
            category_scores: result.category_scores,
            bytecode_size: result.bytecode_size,
            implementation: result.implementation.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
//                              STATE
// ═══════════════════════════════════════════════════════════════════════════════

struct AppState {
    engine: Engine,
    config: Config,
}

// ═══════════════════════════════════════════════════════════════════════════════
//                              HANDLERS
// ═══════════════════════════════════════════════════════════════════════════════

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "sentinel-risk".to_string(),
        version: "1.0.0".to_string(),
    })
}

async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    if payload.address.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Missing address".to_string(),
                details: None,
            }),
        )
            .into_response();
    }

    let rpc_url = payload.rpc_url.unwrap_or_else(|| state.config.default_rpc_url.clone());
    let explorer_key = payload
        .explorer_key
        .unwrap_or_else(|| state.config.default_explorer_key.clone());

    match state.engine.analyze(&payload.address, &rpc_url, &explorer_key).await {
        Ok(result) => Json(AnalyzeResponse::from(result)).into_response(),
        Err(e @ EngineError::Rpc(_)) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: "Bytecode fetch failed".to_string(),
                details: Some(e.to_string()),
            }),
        )
            .into_response(),
        Err(e @ EngineError::Parse(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Bytecode parse failed".to_string(),
                details: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//                              SERVER
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn run_server(port: u16, config: Config) -> anyhow::Result<()> {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let engine = Engine::with_capacity(config.cache_capacity);
    let state = Arc::new(AppState { engine, config });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/analyze", post(analyze_handler))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!(
        r#"
 ═══════════════════════════════════════════════════════════════════════════════
  ██████╗ ███████╗███╗   ██╗████████╗██╗███╗   ██╗███████╗██╗
 ██╔════╝ ██╔════╝████╗  ██║╚══██╔══╝██║████╗  ██║██╔════╝██║
 ███████╗ █████╗  ██╔██╗ ██║   ██║   ██║██╔██╗ ██║█████╗  ██║
 ╚════██║ ██╔══╝  ██║╚██╗██║   ██║   ██║██║╚██╗██║██╔══╝  ██║
 ███████║ ███████╗██║ ╚████║   ██║   ██║██║ ╚████║███████╗███████╗
 ╚══════╝ ╚══════╝╚═╝  ╚═══╝   ╚═╝   ╚═╝╚═╝  ╚═══╝╚══════╝╚══════╝

  SENTINEL SHIELD - EVM Bytecode Risk Scanner Server v1.0.0

  Endpoints:
    GET  /health   - Health check
    POST /analyze  - Analyze a contract address

  Listening on http://{addr}
 ═══════════════════════════════════════════════════════════════════════════════
"#
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
