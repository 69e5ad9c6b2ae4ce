use chrono::{DateTime, Utc};

use super::domain::{
    IntakeDraft, IntakeId, IntakeRequest, IntakeStatus, StatusChange, StatusTransition,
};
use super::query::IntakeFilter;
use crate::error::ServiceError;

/// Storage abstraction for intake requests and their status audit log.
///
/// Each call must observe a consistent snapshot of the store. There is no delete.
pub trait IntakeRepository: Send + Sync {
    /// Assign an id and persist the draft as a pending request.
    fn insert(&self, draft: IntakeDraft) -> Result<IntakeRequest, RepositoryError>;
    fn fetch(&self, id: IntakeId) -> Result<Option<IntakeRequest>, RepositoryError>;
    /// Overwrite the status and, when it actually changes, append a transition.
    fn apply_status(
        &self,
        id: IntakeId,
        status: IntakeStatus,
        changed_by: &str,
        at: DateTime<Utc>,
    ) -> Result<StatusChange, RepositoryError>;
    /// Requests matching `filter`, in any order. Results are re-checked with
    /// `IntakeFilter::matches` by the query engine.
    fn matching(&self, filter: &IntakeFilter) -> Result<Vec<IntakeRequest>, RepositoryError>;
    /// Transitions for one request, oldest first.
    fn transitions(&self, id: IntakeId) -> Result<Vec<StatusTransition>, RepositoryError>;
    fn count(&self) -> Result<usize, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ServiceError::not_found("intake request not found"),
            RepositoryError::Unavailable(detail) => {
                tracing::error!(%detail, "intake repository unavailable");
                ServiceError::Unavailable
            }
        }
    }
}
