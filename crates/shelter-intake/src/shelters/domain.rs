use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for shelters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShelterId(pub u64);

impl std::fmt::Display for ShelterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A shelter location with its latest reported bed counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelter {
    pub id: ShelterId,
    pub name: String,
    pub address: String,
    pub geo_lat: f64,
    pub geo_lng: f64,
    pub beds_total: u32,
    pub beds_available: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies: Option<String>,
}

impl Shelter {
    pub fn summary(&self) -> ShelterSummary {
        ShelterSummary {
            id: self.id,
            name: self.name.clone(),
            address: self.address.clone(),
        }
    }
}

/// Display join attached to intake results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelterSummary {
    pub id: ShelterId,
    pub name: String,
    pub address: String,
}

/// Fields needed to register a shelter in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewShelter {
    pub name: String,
    pub address: String,
    pub geo_lat: f64,
    pub geo_lng: f64,
    #[serde(default)]
    pub beds_total: u32,
    #[serde(default)]
    pub beds_available: u32,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub policies: Option<String>,
}

/// Bed count report submitted by an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityUpdate {
    pub beds_total: u32,
    pub beds_available: u32,
}

impl CapacityUpdate {
    pub fn is_consistent(&self) -> bool {
        self.beds_available <= self.beds_total
    }
}

/// Append-only history of capacity reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityLog {
    pub id: u64,
    pub shelter_id: ShelterId,
    pub beds_total: u32,
    pub beds_available: u32,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}
