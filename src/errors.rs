use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Uniform failure shape for calls to the remote portal API.
///
/// `status` is `None` when no response arrived at all.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RequestError {
    pub message: String,
    pub status: Option<u16>,
    pub raw_body: String,
}

impl RequestError {
    pub fn transport(err: &reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            status: None,
            raw_body: String::new(),
        }
    }

    pub fn is_transport(&self) -> bool {
        self.status.is_none()
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}
