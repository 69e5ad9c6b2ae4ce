use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use serde::Deserialize;

use super::{require_role, AccessToken, AuthService, Role, RoleGuard, UserIdentity};
use crate::error::ServiceError;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    pub(crate) password: String,
}

/// `POST /auth/login` and `GET /auth/me`.
pub fn auth_router(auth: Arc<dyn AuthService>) -> Router {
    let me = Router::new()
        .route("/auth/me", get(me_handler))
        .route_layer(middleware::from_fn_with_state(
            RoleGuard::new(auth.clone(), Role::Staff),
            require_role,
        ));

    Router::new()
        .route("/auth/login", post(login_handler))
        .with_state(auth)
        .merge(me)
}

pub(crate) async fn login_handler(
    State(auth): State<Arc<dyn AuthService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AccessToken>, ServiceError> {
    let Json(request) =
        payload.map_err(|_| ServiceError::validation("expected JSON body with email and password"))?;
    let token = auth.login(&request.email, &request.password)?;
    Ok(Json(token))
}

pub(crate) async fn me_handler(Extension(identity): Extension<UserIdentity>) -> Json<UserIdentity> {
    Json(identity)
}
