use serde::{Deserialize, Serialize};

use super::domain::{IntakeId, IntakeStatus};

/// Outbound hook fired after intake events (email/SMS adapters, dashboards).
pub trait IntakeNotifier: Send + Sync {
    fn notify(&self, notice: IntakeNotice) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IntakeNotice {
    Created {
        intake_id: IntakeId,
        shelter_name: String,
        shelter_address: String,
    },
    StatusChanged {
        intake_id: IntakeId,
        shelter_name: String,
        shelter_address: String,
        from: IntakeStatus,
        to: IntakeStatus,
    },
}

impl IntakeNotice {
    pub fn intake_id(&self) -> IntakeId {
        match self {
            IntakeNotice::Created { intake_id, .. }
            | IntakeNotice::StatusChanged { intake_id, .. } => *intake_id,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Writes notices to the log; the default until a real transport is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl IntakeNotifier for TracingNotifier {
    fn notify(&self, notice: IntakeNotice) -> Result<(), NotifyError> {
        match &notice {
            IntakeNotice::Created {
                intake_id,
                shelter_name,
                ..
            } => tracing::info!(intake_id = intake_id.0, shelter = %shelter_name, "notice: intake created"),
            IntakeNotice::StatusChanged {
                intake_id,
                shelter_name,
                from,
                to,
                ..
            } => tracing::info!(
                intake_id = intake_id.0,
                shelter = %shelter_name,
                from = from.label(),
                to = to.label(),
                "notice: intake status changed"
            ),
        }
        Ok(())
    }
}
