use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Error categories exposed to API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ValidationError,
    NotFoundError,
    AuthorizationError,
    ExportError,
    UnavailableError,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::NotFoundError => "NotFoundError",
            ErrorKind::AuthorizationError => "AuthorizationError",
            ErrorKind::ExportError => "ExportError",
            ErrorKind::UnavailableError => "UnavailableError",
        }
    }

    pub const fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFoundError => StatusCode::NOT_FOUND,
            ErrorKind::AuthorizationError => StatusCode::UNAUTHORIZED,
            ErrorKind::ExportError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::UnavailableError => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Error surfaced by the intake store, query engine, shelter directory, and auth guard.
///
/// Messages are safe to show to callers; storage details are logged where the failure
/// is observed and never carried here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("not authorized")]
    Authorization,
    #[error("{0}")]
    Export(String),
    #[error("storage temporarily unavailable")]
    Unavailable,
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::ValidationError,
            ServiceError::NotFound(_) => ErrorKind::NotFoundError,
            ServiceError::Authorization => ErrorKind::AuthorizationError,
            ServiceError::Export(_) => ErrorKind::ExportError,
            ServiceError::Unavailable => ErrorKind::UnavailableError,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let body = Json(json!({
            "error": {
                "kind": kind.label(),
                "message": self.to_string(),
            }
        }));
        (kind.status_code(), body).into_response()
    }
}

/// Process-level failures raised while booting or running the service.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Auth(AuthError),
    Service(ServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Auth(err) => write!(f, "auth error: {}", err),
            AppError::Service(err) => write!(f, "service error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Auth(err) => Some(err),
            AppError::Service(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Service(err) => err.into_response(),
            other => {
                tracing::error!(error = %other, "request failed");
                let body = Json(json!({
                    "error": {
                        "kind": ErrorKind::UnavailableError.label(),
                        "message": "internal server error",
                    }
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn service_errors_render_kind_and_message() {
        let response = ServiceError::validation("page_size must be between 1 and 100").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = body_json(response).await;
        assert_eq!(payload["error"]["kind"], "ValidationError");
        assert_eq!(
            payload["error"]["message"],
            "page_size must be between 1 and 100"
        );
    }

    #[tokio::test]
    async fn authorization_errors_do_not_explain_themselves() {
        let response = ServiceError::Authorization.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let payload = body_json(response).await;
        assert_eq!(payload["error"]["kind"], "AuthorizationError");
        assert_eq!(payload["error"]["message"], "not authorized");
    }

    #[tokio::test]
    async fn process_errors_hide_internal_detail() {
        let error = AppError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk /var/lib/intake full",
        ));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let payload = body_json(response).await;
        assert_eq!(payload["error"]["message"], "internal server error");
    }
}
