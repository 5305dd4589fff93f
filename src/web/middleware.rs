use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 请求日志中间件，同时为每个响应附上请求ID
pub async fn request_logging(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let start_time = Instant::now();

    tracing::debug!("Request started: {} {} [{}]", method, uri, request_id);

    let mut response = next.run(req).await;

    tracing::info!(
        "Request completed: {} {} - {} - {}ms [{}]",
        method,
        uri,
        response.status(),
        start_time.elapsed().as_millis(),
        request_id
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
