use std::sync::Arc;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Router;

use crate::auth::{auth_router, AuthService};
use crate::config::PagingConfig;
use crate::error::ServiceError;
use crate::intake::{
    intake_router, IntakeNotifier, IntakeQueryEngine, IntakeRepository, IntakeStore,
};
use crate::shelters::{shelter_router, ShelterDirectory};

/// Shared state behind every intake endpoint.
pub struct IntakeApi<R, N> {
    pub store: Arc<IntakeStore<R, N>>,
    pub queries: Arc<IntakeQueryEngine<R>>,
    pub shelters: Arc<dyn ShelterDirectory>,
    pub auth: Arc<dyn AuthService>,
}

impl<R, N> Clone for IntakeApi<R, N> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            queries: Arc::clone(&self.queries),
            shelters: Arc::clone(&self.shelters),
            auth: Arc::clone(&self.auth),
        }
    }
}

impl<R, N> IntakeApi<R, N>
where
    R: IntakeRepository + 'static,
    N: IntakeNotifier + 'static,
{
    pub fn new(
        repository: Arc<R>,
        shelters: Arc<dyn ShelterDirectory>,
        notifier: Arc<N>,
        auth: Arc<dyn AuthService>,
        paging: PagingConfig,
    ) -> Self {
        let store = IntakeStore::new(Arc::clone(&repository), Arc::clone(&shelters), notifier);
        let queries = IntakeQueryEngine::new(repository, Arc::clone(&shelters), paging);
        Self {
            store: Arc::new(store),
            queries: Arc::new(queries),
            shelters,
            auth,
        }
    }
}

/// Every domain route: intake, shelters, capacity, and auth.
pub fn api_router<R, N>(api: IntakeApi<R, N>) -> Router
where
    R: IntakeRepository + 'static,
    N: IntakeNotifier + 'static,
{
    let shelters = shelter_router(Arc::clone(&api.shelters), Arc::clone(&api.auth));
    let auth = auth_router(Arc::clone(&api.auth));
    intake_router(api).merge(shelters).merge(auth)
}

/// Unwraps a numeric path id; anything else is a validation failure.
pub(crate) fn path_id(
    extracted: Result<Path<u64>, PathRejection>,
    what: &str,
) -> Result<u64, ServiceError> {
    extracted
        .map(|Path(id)| id)
        .map_err(|_| ServiceError::validation(format!("{what} must be a non-negative integer")))
}

/// Unwraps query parameters without echoing the framework's parse text.
pub(crate) fn query_params<T>(
    extracted: Result<Query<T>, QueryRejection>,
) -> Result<T, ServiceError> {
    extracted
        .map(|Query(params)| params)
        .map_err(|_| ServiceError::validation("query string is malformed or repeats a parameter"))
}
