use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::domain::{
    IntakeDraft, IntakeId, IntakeRequest, IntakeStatus, StatusChange, StatusTransition,
};
use super::query::IntakeFilter;
use super::repository::{IntakeRepository, RepositoryError};

#[derive(Default)]
struct IntakeState {
    records: BTreeMap<IntakeId, IntakeRequest>,
    transitions: Vec<StatusTransition>,
    next_id: u64,
}

/// Mutex-backed repository. Every call holds the lock for its full duration, so reads
/// see a consistent snapshot and writes to one record are last-write-wins.
#[derive(Default, Clone)]
pub struct InMemoryIntakeRepository {
    state: Arc<Mutex<IntakeState>>,
}

impl IntakeRepository for InMemoryIntakeRepository {
    fn insert(&self, draft: IntakeDraft) -> Result<IntakeRequest, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        state.next_id += 1;
        let record = draft.into_record(IntakeId(state.next_id));
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    fn fetch(&self, id: IntakeId) -> Result<Option<IntakeRequest>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.records.get(&id).cloned())
    }

    fn apply_status(
        &self,
        id: IntakeId,
        status: IntakeStatus,
        changed_by: &str,
        at: DateTime<Utc>,
    ) -> Result<StatusChange, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let record = state.records.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        let previous = record.status;
        record.status = status;
        let record = record.clone();

        let transition = (previous != status).then(|| StatusTransition {
            intake_id: id,
            from: previous,
            to: status,
            changed_by: changed_by.to_string(),
            changed_at: at,
        });
        if let Some(entry) = &transition {
            state.transitions.push(entry.clone());
        }

        Ok(StatusChange { record, transition })
    }

    fn matching(&self, filter: &IntakeFilter) -> Result<Vec<IntakeRequest>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state
            .records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn transitions(&self, id: IntakeId) -> Result<Vec<StatusTransition>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        if !state.records.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        Ok(state
            .transitions
            .iter()
            .filter(|entry| entry.intake_id == id)
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.records.len())
    }
}
