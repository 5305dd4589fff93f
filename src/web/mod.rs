pub mod handlers;
pub mod middleware;

use crate::{ecg::EcgPipeline, models::ModelManager, utils::error::EcgError, Config, Result};
use axum::{
    extract::{DefaultBodyLimit, State},
    middleware::from_fn,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub manager: Arc<ModelManager>,
    pub pipeline: EcgPipeline,
}

impl AppState {
    pub fn new(manager: Arc<ModelManager>) -> Self {
        Self {
            config: manager.config().clone(),
            pipeline: EcgPipeline::from_manager(&manager),
            manager,
        }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 初始化模型管理器，失败时不启动服务
    let manager = ModelManager::init(config.clone())?;

    let app = create_app(AppState::new(manager));

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        EcgError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /predict/        - Multipart ECG image upload");
    tracing::info!("  POST /predict/base64  - JSON base64 upload");
    tracing::info!("  GET  /                - Greeting");
    tracing::info!("  GET  /health          - Health check");
    tracing::info!("  GET  /api/info        - Service information");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| EcgError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| EcgError::Internal(format!("Server failed: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = state.config.server_config.clone();

    Router::new()
        .route("/predict", post(handlers::predict_upload_handler))
        .route("/predict/", post(handlers::predict_upload_handler))
        .route("/predict/base64", post(handlers::predict_base64_handler))
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        // 超限由提取器报告，处理器再转换为 JSON 形式的 FILE_TOO_LARGE
        .layer(DefaultBodyLimit::max(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(CorsLayer::permissive())
        .layer(from_fn(middleware::request_logging))
        .with_state(state)
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({ "message": "Hello, ECG Analyzer!" }))
}

/// 健康检查端点
async fn health_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    state.manager.health_check()?;
    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "ECG Analyzer",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "models": state.manager.get_stats(),
        "limits": {
            "max_image_bytes": state.config.input_config.max_image_bytes,
            "request_timeout_secs": state.config.server_config.request_timeout,
        }
    }))
}
