use spin_sdk::http::Response;
use std::fmt;

use crate::core::response::Envelope;

#[derive(Debug)]
pub enum ApiError {
    InvalidArgument(String),
    Unauthenticated,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::InvalidArgument(_) => 400,
            ApiError::Unauthenticated => 401,
            ApiError::PermissionDenied => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
        }
    }

    /// Message shown to the caller. Internal details stay in the logs.
    pub fn message(&self) -> String {
        match self {
            ApiError::InvalidArgument(msg) => msg.clone(),
            ApiError::Unauthenticated => "Unauthenticated".to_string(),
            ApiError::PermissionDenied => "Permission denied".to_string(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::Conflict(msg) => msg.clone(),
            ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            ApiError::Unauthenticated => write!(f, "Unauthenticated"),
            ApiError::PermissionDenied => write!(f, "Permission denied"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<ApiError> for Response {
    fn from(err: ApiError) -> Self {
        if let ApiError::Internal(detail) = &err {
            tracing::error!(error = %detail, "request failed");
        }
        let body = serde_json::to_vec(&Envelope::<()>::failure(err.message())).unwrap_or_default();
        Response::builder()
            .status(err.status())
            .header("Content-Type", "application/json")
            .body(body)
            .build()
    }
}

impl std::error::Error for ApiError {}

// Store and serialization failures surface as internal errors
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}
