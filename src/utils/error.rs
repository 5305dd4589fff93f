use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EcgError {
    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Tensor shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: [usize; 4],
        actual: Vec<usize>,
    },

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<image::ImageError> for EcgError {
    fn from(e: image::ImageError) -> Self {
        EcgError::Decode(e.to_string())
    }
}

impl From<base64::DecodeError> for EcgError {
    fn from(e: base64::DecodeError) -> Self {
        EcgError::Decode(format!("invalid base64 payload: {}", e))
    }
}

impl EcgError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EcgError::Decode(_) => StatusCode::BAD_REQUEST,
            EcgError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EcgError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            EcgError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            EcgError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EcgError::Decode(_) => "DECODE_ERROR",
            EcgError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            EcgError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            EcgError::InvalidInput(_) => "INVALID_INPUT",
            EcgError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            EcgError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            EcgError::Inference(_) => "INFERENCE_ERROR",
            EcgError::Config(_) => "CONFIG_ERROR",
            EcgError::Io(_) => "IO_ERROR",
            EcgError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 对外暴露的错误信息：客户端错误保留原因，服务端错误只给出类别
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            match self {
                EcgError::ModelLoad(_) => "Model is not available".to_string(),
                _ => "Internal error while analyzing the ECG".to_string(),
            }
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for EcgError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.public_message(),
            }
        });

        if status.is_server_error() {
            tracing::error!("Request failed: {} ({})", self, status);
        } else {
            tracing::warn!("Request rejected: {} ({})", self, status);
        }

        (status, axum::Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let err = EcgError::Decode("not a png".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "DECODE_ERROR");
        assert!(err.public_message().contains("not a png"));
    }

    #[test]
    fn server_errors_hide_details() {
        let err = EcgError::ShapeMismatch {
            expected: [1, 224, 224, 3],
            actual: vec![1, 128, 128, 3],
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "SHAPE_MISMATCH");
        assert!(!err.public_message().contains("128"));

        let err = EcgError::ModelLoad("/secret/path/model.onnx missing".to_string());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.public_message().contains("/secret"));
    }

    #[test]
    fn base64_errors_are_decode_errors() {
        use base64::Engine;
        let err: EcgError = base64::engine::general_purpose::STANDARD
            .decode("@@@")
            .unwrap_err()
            .into();
        assert!(matches!(err, EcgError::Decode(_)));
    }
}
