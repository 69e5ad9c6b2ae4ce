use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::domain::{CapacityLog, CapacityUpdate, NewShelter, Shelter, ShelterId};
use crate::error::ServiceError;

/// Most recent capacity reports returned by `capacity_history`.
pub const CAPACITY_HISTORY_LIMIT: usize = 20;

/// Read model of shelters. Intake records reference entries by `ShelterId`.
pub trait ShelterDirectory: Send + Sync {
    fn get(&self, id: ShelterId) -> Result<Shelter, DirectoryError>;
    /// Newest shelters first.
    fn list(&self) -> Result<Vec<Shelter>, DirectoryError>;
    fn record_capacity(
        &self,
        id: ShelterId,
        update: CapacityUpdate,
        updated_by: &str,
        at: DateTime<Utc>,
    ) -> Result<CapacityLog, DirectoryError>;
    /// Newest reports first, at most `limit` entries.
    fn capacity_history(
        &self,
        id: ShelterId,
        limit: usize,
    ) -> Result<Vec<CapacityLog>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("shelter {0} not found")]
    NotFound(ShelterId),
    #[error("beds_available ({beds_available}) cannot exceed beds_total ({beds_total})")]
    InconsistentCapacity { beds_total: u32, beds_available: u32 },
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

impl From<DirectoryError> for ServiceError {
    fn from(value: DirectoryError) -> Self {
        match value {
            DirectoryError::NotFound(_) => ServiceError::not_found("shelter not found"),
            DirectoryError::InconsistentCapacity { .. } => {
                ServiceError::validation(value.to_string())
            }
            DirectoryError::Unavailable(detail) => {
                tracing::error!(%detail, "shelter directory unavailable");
                ServiceError::Unavailable
            }
        }
    }
}

/// Validate and record a capacity report.
pub fn update_capacity(
    directory: &dyn ShelterDirectory,
    id: ShelterId,
    update: CapacityUpdate,
    updated_by: &str,
) -> Result<CapacityLog, ServiceError> {
    if !update.is_consistent() {
        return Err(DirectoryError::InconsistentCapacity {
            beds_total: update.beds_total,
            beds_available: update.beds_available,
        }
        .into());
    }
    let log = directory.record_capacity(id, update, updated_by, Utc::now())?;
    tracing::info!(
        shelter_id = id.0,
        beds_total = log.beds_total,
        beds_available = log.beds_available,
        "capacity recorded"
    );
    Ok(log)
}

#[derive(Default)]
struct DirectoryState {
    shelters: BTreeMap<ShelterId, Shelter>,
    capacity: Vec<CapacityLog>,
    next_shelter_id: u64,
    next_log_id: u64,
}

/// Mutex-backed directory used by the service wiring, demos, and tests.
#[derive(Default, Clone)]
pub struct InMemoryShelterDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl InMemoryShelterDirectory {
    pub fn insert(&self, shelter: NewShelter) -> Result<Shelter, DirectoryError> {
        let update = CapacityUpdate {
            beds_total: shelter.beds_total,
            beds_available: shelter.beds_available,
        };
        if !update.is_consistent() {
            return Err(DirectoryError::InconsistentCapacity {
                beds_total: update.beds_total,
                beds_available: update.beds_available,
            });
        }

        let mut state = self.state.lock().expect("directory mutex poisoned");
        state.next_shelter_id += 1;
        let id = ShelterId(state.next_shelter_id);
        let record = Shelter {
            id,
            name: shelter.name,
            address: shelter.address,
            geo_lat: shelter.geo_lat,
            geo_lng: shelter.geo_lng,
            beds_total: shelter.beds_total,
            beds_available: shelter.beds_available,
            phone: shelter.phone,
            hours: shelter.hours,
            policies: shelter.policies,
        };
        state.shelters.insert(id, record.clone());
        Ok(record)
    }
}

impl ShelterDirectory for InMemoryShelterDirectory {
    fn get(&self, id: ShelterId) -> Result<Shelter, DirectoryError> {
        let state = self.state.lock().expect("directory mutex poisoned");
        state
            .shelters
            .get(&id)
            .cloned()
            .ok_or(DirectoryError::NotFound(id))
    }

    fn list(&self) -> Result<Vec<Shelter>, DirectoryError> {
        let state = self.state.lock().expect("directory mutex poisoned");
        Ok(state.shelters.values().rev().cloned().collect())
    }

    fn record_capacity(
        &self,
        id: ShelterId,
        update: CapacityUpdate,
        updated_by: &str,
        at: DateTime<Utc>,
    ) -> Result<CapacityLog, DirectoryError> {
        let mut state = self.state.lock().expect("directory mutex poisoned");
        let shelter = state
            .shelters
            .get_mut(&id)
            .ok_or(DirectoryError::NotFound(id))?;
        shelter.beds_total = update.beds_total;
        shelter.beds_available = update.beds_available;

        state.next_log_id += 1;
        let log = CapacityLog {
            id: state.next_log_id,
            shelter_id: id,
            beds_total: update.beds_total,
            beds_available: update.beds_available,
            updated_at: at,
            updated_by: updated_by.to_string(),
        };
        state.capacity.push(log.clone());
        Ok(log)
    }

    fn capacity_history(
        &self,
        id: ShelterId,
        limit: usize,
    ) -> Result<Vec<CapacityLog>, DirectoryError> {
        let state = self.state.lock().expect("directory mutex poisoned");
        if !state.shelters.contains_key(&id) {
            return Err(DirectoryError::NotFound(id));
        }
        Ok(state
            .capacity
            .iter()
            .rev()
            .filter(|log| log.shelter_id == id)
            .take(limit)
            .cloned()
            .collect())
    }
}
