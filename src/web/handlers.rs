use crate::{analysis::AnalysisResult, utils::error::EcgError, web::AppState, Result};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, State},
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
    response::Json,
};
use serde::Deserialize;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct PredictJsonRequest {
    /// Base64编码的图像数据，可带 data URL 前缀
    pub image: String,
}

/// Multipart文件上传处理器
pub async fn predict_upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>> {
    let limit = state.config.server_config.max_request_size;
    let mut image_data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to read multipart field", &headers, limit))?
    {
        let field_name = field.name().unwrap_or("unknown").to_string();

        if field_name != "file" {
            tracing::debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        if let Some(content_type) = field.content_type() {
            if !is_accepted_content_type(content_type) {
                return Err(EcgError::UnsupportedFormat(content_type.to_string()));
            }
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, "Failed to read file data", &headers, limit))?;

        tracing::debug!("Received file: {} bytes", data.len());
        image_data = Some(data);
    }

    let image_data =
        image_data.ok_or_else(|| EcgError::InvalidInput("No image file provided".to_string()))?;

    let pipeline = state.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.analyze_bytes(&image_data))
        .await
        .map_err(|e| EcgError::Internal(format!("Analysis task failed: {}", e)))??;

    Ok(Json(result))
}

/// JSON base64上传处理器
pub async fn predict_base64_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<PredictJsonRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>> {
    let limit = state.config.server_config.max_request_size;
    let Json(request) = payload.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            EcgError::FileTooLarge(declared_length(&headers).unwrap_or(limit), limit)
        } else {
            EcgError::InvalidInput(e.body_text())
        }
    })?;

    if request.image.trim().is_empty() {
        return Err(EcgError::Decode("empty image payload".to_string()));
    }

    let pipeline = state.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.analyze_base64(&request.image))
        .await
        .map_err(|e| EcgError::Internal(format!("Analysis task failed: {}", e)))??;

    Ok(Json(result))
}

/// 请求体超出上限时统一报告为 FileTooLarge，其余 multipart 错误属于客户端输入问题
fn multipart_error(
    e: MultipartError,
    context: &str,
    headers: &HeaderMap,
    limit: usize,
) -> EcgError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        EcgError::FileTooLarge(declared_length(headers).unwrap_or(limit), limit)
    } else {
        EcgError::InvalidInput(format!("{}: {}", context, e))
    }
}

/// 分块传输时没有 Content-Length，此时只知道已超过上限
fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

fn is_accepted_content_type(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type == "application/octet-stream"
}
