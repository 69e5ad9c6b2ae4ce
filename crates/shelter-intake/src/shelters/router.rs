use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};

use super::directory::{update_capacity, ShelterDirectory, CAPACITY_HISTORY_LIMIT};
use super::domain::{CapacityLog, CapacityUpdate, Shelter, ShelterId};
use crate::auth::{require_role, AuthService, Role, RoleGuard, UserIdentity};
use crate::error::ServiceError;
use crate::http::path_id;

type DirectoryState = Arc<dyn ShelterDirectory>;

/// Shelter reads for any authenticated role; capacity reports for admins.
pub fn shelter_router(directory: DirectoryState, auth: Arc<dyn AuthService>) -> Router {
    let reads = Router::new()
        .route("/shelters", get(list_handler))
        .route("/shelters/", get(list_handler))
        .route("/shelters/:shelter_id", get(get_handler))
        .route("/capacity/:shelter_id", get(capacity_history_handler))
        .route_layer(middleware::from_fn_with_state(
            RoleGuard::new(auth.clone(), Role::Staff),
            require_role,
        ));

    let writes = Router::new()
        .route("/capacity/:shelter_id", post(record_capacity_handler))
        .route_layer(middleware::from_fn_with_state(
            RoleGuard::new(auth, Role::Admin),
            require_role,
        ));

    reads.merge(writes).with_state(directory)
}

pub(crate) async fn list_handler(
    State(directory): State<DirectoryState>,
) -> Result<Json<Vec<Shelter>>, ServiceError> {
    Ok(Json(directory.list()?))
}

pub(crate) async fn get_handler(
    State(directory): State<DirectoryState>,
    shelter_id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Shelter>, ServiceError> {
    let shelter_id = path_id(shelter_id, "shelter id")?;
    Ok(Json(directory.get(ShelterId(shelter_id))?))
}

pub(crate) async fn capacity_history_handler(
    State(directory): State<DirectoryState>,
    shelter_id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Vec<CapacityLog>>, ServiceError> {
    let shelter_id = path_id(shelter_id, "shelter id")?;
    let history = directory.capacity_history(ShelterId(shelter_id), CAPACITY_HISTORY_LIMIT)?;
    Ok(Json(history))
}

pub(crate) async fn record_capacity_handler(
    State(directory): State<DirectoryState>,
    Extension(identity): Extension<UserIdentity>,
    shelter_id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<CapacityUpdate>, JsonRejection>,
) -> Result<(StatusCode, Json<CapacityLog>), ServiceError> {
    let shelter_id = path_id(shelter_id, "shelter id")?;
    let Json(update) = payload
        .map_err(|_| ServiceError::validation("expected JSON body with beds_total and beds_available"))?;
    let log = update_capacity(
        directory.as_ref(),
        ShelterId(shelter_id),
        update,
        &identity.email,
    )?;
    Ok((StatusCode::CREATED, Json(log)))
}
