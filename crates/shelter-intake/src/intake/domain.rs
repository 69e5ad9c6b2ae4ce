use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::params::deserialize_optional_timestamp;
use crate::error::ServiceError;
use crate::shelters::{ShelterId, ShelterSummary};

/// Identifier wrapper for intake requests, assigned by the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntakeId(pub u64);

impl fmt::Display for IntakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status. Any status may be set from any other by an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeStatus {
    Pending,
    Fulfilled,
    Cancelled,
}

impl IntakeStatus {
    pub const ALL: [IntakeStatus; 3] = [
        IntakeStatus::Pending,
        IntakeStatus::Fulfilled,
        IntakeStatus::Cancelled,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            IntakeStatus::Pending => "pending",
            IntakeStatus::Fulfilled => "fulfilled",
            IntakeStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for IntakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IntakeStatus {
    type Err = ServiceError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        IntakeStatus::ALL
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or_else(|| {
                ServiceError::validation(format!(
                    "invalid status '{}': expected pending, fulfilled, or cancelled",
                    raw.trim()
                ))
            })
    }
}

/// Stored intake request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRequest {
    pub id: IntakeId,
    pub shelter_id: ShelterId,
    pub name: Option<String>,
    pub reason: Option<String>,
    pub eta: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub status: IntakeStatus,
}

/// Payload accepted when staff record a new intake request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIntake {
    pub shelter_id: ShelterId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub eta: Option<DateTime<Utc>>,
}

impl NewIntake {
    pub fn for_shelter(shelter_id: ShelterId) -> Self {
        Self {
            shelter_id,
            name: None,
            reason: None,
            eta: None,
        }
    }

    pub(crate) fn into_draft(self, created_at: DateTime<Utc>) -> IntakeDraft {
        IntakeDraft {
            shelter_id: self.shelter_id,
            name: non_blank(self.name),
            reason: non_blank(self.reason),
            eta: self.eta,
            created_at,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// A validated intake request waiting for the repository to assign its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeDraft {
    pub shelter_id: ShelterId,
    pub name: Option<String>,
    pub reason: Option<String>,
    pub eta: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl IntakeDraft {
    /// Every request starts out pending.
    pub fn into_record(self, id: IntakeId) -> IntakeRequest {
        IntakeRequest {
            id,
            shelter_id: self.shelter_id,
            name: self.name,
            reason: self.reason,
            eta: self.eta,
            created_at: self.created_at,
            status: IntakeStatus::Pending,
        }
    }
}

/// Intake request joined with its shelter for display and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeView {
    pub id: IntakeId,
    pub shelter_id: ShelterId,
    pub shelter: Option<ShelterSummary>,
    pub name: Option<String>,
    pub reason: Option<String>,
    pub eta: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub status: IntakeStatus,
}

impl IntakeView {
    pub fn joined(record: IntakeRequest, shelter: Option<ShelterSummary>) -> Self {
        Self {
            id: record.id,
            shelter_id: record.shelter_id,
            shelter,
            name: record.name,
            reason: record.reason,
            eta: record.eta,
            created_at: record.created_at,
            status: record.status,
        }
    }
}

/// One entry of the append-only status audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub intake_id: IntakeId,
    pub from: IntakeStatus,
    pub to: IntakeStatus,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
}

/// Result of applying a status to a stored request. `transition` is `None` when the
/// request already had that status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub record: IntakeRequest,
    pub transition: Option<StatusTransition>,
}
