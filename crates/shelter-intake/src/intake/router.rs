use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{middleware, Extension, Json, Router};
use serde::Deserialize;

use super::domain::{IntakeId, IntakeStatus, IntakeView, NewIntake, StatusTransition};
use super::export::CsvExport;
use super::notify::IntakeNotifier;
use super::params::{FilterParams, SearchParams};
use super::query::IntakePage;
use super::repository::IntakeRepository;
use crate::auth::{require_role, Role, RoleGuard, UserIdentity};
use crate::error::ServiceError;
use crate::http::{path_id, query_params, IntakeApi};

#[derive(Debug, Deserialize)]
pub(crate) struct StatusPayload {
    pub(crate) status: String,
}

/// Intake endpoints: creation for staff, everything else admin-only.
pub fn intake_router<R, N>(api: IntakeApi<R, N>) -> Router
where
    R: IntakeRepository + 'static,
    N: IntakeNotifier + 'static,
{
    let admin = Router::new()
        .route("/intake/search", get(search_handler::<R, N>))
        .route("/intake/export.csv", get(export_handler::<R, N>))
        .route("/intake/:intake_id/status", patch(status_handler::<R, N>))
        .route("/intake/:intake_id/history", get(history_handler::<R, N>))
        .route_layer(middleware::from_fn_with_state(
            RoleGuard::new(api.auth.clone(), Role::Admin),
            require_role,
        ));

    let staff = Router::new()
        .route("/intake", post(create_handler::<R, N>))
        .route("/intake/", post(create_handler::<R, N>))
        .route_layer(middleware::from_fn_with_state(
            RoleGuard::new(api.auth.clone(), Role::Staff),
            require_role,
        ));

    admin.merge(staff).with_state(api)
}

pub(crate) async fn create_handler<R, N>(
    State(api): State<IntakeApi<R, N>>,
    Extension(identity): Extension<UserIdentity>,
    payload: Result<Json<NewIntake>, JsonRejection>,
) -> Result<(StatusCode, Json<IntakeView>), ServiceError>
where
    R: IntakeRepository + 'static,
    N: IntakeNotifier + 'static,
{
    let Json(intake) = payload.map_err(|rejection| {
        ServiceError::validation(format!("invalid intake payload: {}", rejection.body_text()))
    })?;
    let created = api.store.create(intake)?;
    tracing::debug!(intake_id = created.id.0, recorded_by = %identity.email, "intake recorded");
    Ok((StatusCode::CREATED, Json(created)))
}

pub(crate) async fn search_handler<R, N>(
    State(api): State<IntakeApi<R, N>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<IntakePage>, ServiceError>
where
    R: IntakeRepository + 'static,
    N: IntakeNotifier + 'static,
{
    let spec = query_params(params)?.into_spec(api.queries.paging())?;
    Ok(Json(api.queries.search(&spec)?))
}

pub(crate) async fn export_handler<R, N>(
    State(api): State<IntakeApi<R, N>>,
    params: Result<Query<FilterParams>, QueryRejection>,
) -> Result<CsvExport, ServiceError>
where
    R: IntakeRepository + 'static,
    N: IntakeNotifier + 'static,
{
    let filter = query_params(params)?.into_filter()?;
    api.queries.export_csv(&filter)
}

pub(crate) async fn status_handler<R, N>(
    State(api): State<IntakeApi<R, N>>,
    Extension(identity): Extension<UserIdentity>,
    intake_id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<StatusPayload>, JsonRejection>,
) -> Result<Json<IntakeView>, ServiceError>
where
    R: IntakeRepository + 'static,
    N: IntakeNotifier + 'static,
{
    let intake_id = path_id(intake_id, "intake id")?;
    let Json(payload) =
        payload.map_err(|_| ServiceError::validation("expected JSON body with a status field"))?;
    let status: IntakeStatus = payload.status.parse()?;
    let updated = api.store.set_status(IntakeId(intake_id), status, &identity)?;
    Ok(Json(updated))
}

pub(crate) async fn history_handler<R, N>(
    State(api): State<IntakeApi<R, N>>,
    intake_id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Vec<StatusTransition>>, ServiceError>
where
    R: IntakeRepository + 'static,
    N: IntakeNotifier + 'static,
{
    let intake_id = path_id(intake_id, "intake id")?;
    Ok(Json(api.store.history(IntakeId(intake_id))?))
}
