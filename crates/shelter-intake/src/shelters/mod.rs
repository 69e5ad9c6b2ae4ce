//! Shelter locations, bed counts, and capacity history.

pub mod directory;
pub mod domain;
pub mod router;

pub use directory::{
    update_capacity, DirectoryError, InMemoryShelterDirectory, ShelterDirectory,
    CAPACITY_HISTORY_LIMIT,
};
pub use domain::{CapacityLog, CapacityUpdate, NewShelter, Shelter, ShelterId, ShelterSummary};
pub use router::shelter_router;
