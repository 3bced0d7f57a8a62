use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    response::IntoResponse,
    Json,
};
use http::StatusCode;
use serde_json::json;
use tracing::{debug, error};

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InternalError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

impl From<albums_dal::Error> for ApiError {
    fn from(e: albums_dal::Error) -> Self {
        error!("Database error: {e}");
        ApiError::InternalError("Database error".into())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        debug!("Error reading multipart form: {e}, status {}", e.status());
        ApiError::InvalidRequest("Invalid form data".into())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        debug!("Request is not multipart form: {e}");
        ApiError::InvalidRequest("Invalid form data".into())
    }
}

impl From<garde::Report> for ApiError {
    fn from(report: garde::Report) -> Self {
        ApiError::InvalidRequest(report.to_string().trim().to_string())
    }
}
