use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::{authorize, AuthService, Role, UserIdentity};
use crate::error::ServiceError;

/// Middleware state: which credential resolver to use and which role a route group needs.
#[derive(Clone)]
pub struct RoleGuard {
    auth: Arc<dyn AuthService>,
    required: Role,
}

impl RoleGuard {
    pub fn new(auth: Arc<dyn AuthService>, required: Role) -> Self {
        Self { auth, required }
    }

    pub fn admit(&self, headers: &HeaderMap) -> Result<UserIdentity, ServiceError> {
        let token = bearer_token(headers).ok_or(ServiceError::Authorization)?;
        let identity = self.auth.resolve(token)?;
        authorize(Some(&identity), self.required)?;
        Ok(identity)
    }
}

/// Extract the credential from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Resolve the bearer credential, enforce the guard's role, and hand the identity to the
/// handler through request extensions.
pub async fn require_role(
    State(guard): State<RoleGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    match guard.admit(request.headers()) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(
                path = %request.uri().path(),
                required = guard.required.label(),
                "request denied"
            );
            err.into_response()
        }
    }
}
