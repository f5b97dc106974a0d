//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keystone_modules::ModuleError;

/// `{"error": message}` with `status`.
pub fn json_error(message: &str, status: StatusCode) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error("{0}")]
    Unauthorized(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Module(ModuleError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Module(
                ModuleError::MissingDependencies { .. } | ModuleError::CircularDependency { .. },
            ) => StatusCode::CONFLICT,
            Self::Module(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        json_error(&self.to_string(), status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(ModuleError::not_found("x")).status(),
            StatusCode::NOT_FOUND
        );
        let missing = ModuleError::MissingDependencies {
            module_id: "reporting".to_string(),
            missing: vec!["ledger".to_string()],
        };
        assert_eq!(ApiError::from(missing).status(), StatusCode::CONFLICT);
        let scan = ModuleError::Scan {
            path: "/modules".into(),
            source: std::io::Error::other("boom"),
        };
        assert_eq!(
            ApiError::from(scan).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Unauthorized("no".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_message_is_module_error_display() {
        let err = ApiError::from(ModuleError::not_found("ghost"));
        assert_eq!(err.to_string(), "Module ghost not found");
    }
}
