use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{IntakeId, IntakeStatus, IntakeView, NewIntake, StatusTransition};
use super::notify::{IntakeNotice, IntakeNotifier};
use super::query::ShelterJoin;
use super::repository::IntakeRepository;
use crate::auth::UserIdentity;
use crate::error::ServiceError;
use crate::shelters::{DirectoryError, ShelterDirectory};

/// Authoritative intake table: creation and the open status state machine.
pub struct IntakeStore<R, N> {
    repository: Arc<R>,
    directory: Arc<dyn ShelterDirectory>,
    notifier: Arc<N>,
}

impl<R, N> IntakeStore<R, N>
where
    R: IntakeRepository + 'static,
    N: IntakeNotifier + 'static,
{
    pub fn new(repository: Arc<R>, directory: Arc<dyn ShelterDirectory>, notifier: Arc<N>) -> Self {
        Self {
            repository,
            directory,
            notifier,
        }
    }

    /// Record a new pending request against an existing shelter.
    pub fn create(&self, intake: NewIntake) -> Result<IntakeView, ServiceError> {
        self.create_at(intake, Utc::now())
    }

    pub fn create_at(
        &self,
        intake: NewIntake,
        created_at: DateTime<Utc>,
    ) -> Result<IntakeView, ServiceError> {
        let shelter = match self.directory.get(intake.shelter_id) {
            Ok(shelter) => shelter,
            Err(DirectoryError::NotFound(id)) => {
                return Err(ServiceError::validation(format!(
                    "shelter_id {id} does not reference a known shelter"
                )))
            }
            Err(other) => return Err(other.into()),
        };

        let record = self.repository.insert(intake.into_draft(created_at))?;
        tracing::info!(
            intake_id = record.id.0,
            shelter_id = record.shelter_id.0,
            "intake request created"
        );

        self.dispatch(IntakeNotice::Created {
            intake_id: record.id,
            shelter_name: shelter.name.clone(),
            shelter_address: shelter.address.clone(),
        });

        Ok(IntakeView::joined(record, Some(shelter.summary())))
    }

    /// Overwrite the status of one request. Re-applying the current status is accepted
    /// but records no transition.
    pub fn set_status(
        &self,
        id: IntakeId,
        status: IntakeStatus,
        actor: &UserIdentity,
    ) -> Result<IntakeView, ServiceError> {
        self.set_status_at(id, status, actor, Utc::now())
    }

    pub fn set_status_at(
        &self,
        id: IntakeId,
        status: IntakeStatus,
        actor: &UserIdentity,
        at: DateTime<Utc>,
    ) -> Result<IntakeView, ServiceError> {
        let change = self
            .repository
            .apply_status(id, status, &actor.email, at)?;

        let mut join = ShelterJoin::new(self.directory.as_ref());
        let view = join.view(change.record);

        if let Some(transition) = change.transition {
            tracing::info!(
                intake_id = id.0,
                from = transition.from.label(),
                to = transition.to.label(),
                actor = %transition.changed_by,
                "intake status changed"
            );
            let (shelter_name, shelter_address) = view
                .shelter
                .as_ref()
                .map(|shelter| (shelter.name.clone(), shelter.address.clone()))
                .unwrap_or_default();
            self.dispatch(IntakeNotice::StatusChanged {
                intake_id: id,
                shelter_name,
                shelter_address,
                from: transition.from,
                to: transition.to,
            });
        }

        Ok(view)
    }

    pub fn get(&self, id: IntakeId) -> Result<IntakeView, ServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or_else(|| ServiceError::not_found("intake request not found"))?;
        Ok(ShelterJoin::new(self.directory.as_ref()).view(record))
    }

    /// Status audit log for one request, oldest first.
    pub fn history(&self, id: IntakeId) -> Result<Vec<StatusTransition>, ServiceError> {
        Ok(self.repository.transitions(id)?)
    }

    pub fn count(&self) -> Result<usize, ServiceError> {
        Ok(self.repository.count()?)
    }

    fn dispatch(&self, notice: IntakeNotice) {
        let intake_id = notice.intake_id();
        if let Err(err) = self.notifier.notify(notice) {
            tracing::warn!(intake_id = intake_id.0, error = %err, "intake notification failed");
        }
    }
}
