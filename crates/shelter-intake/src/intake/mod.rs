//! Intake request lifecycle, administrative search, and CSV export.

pub mod domain;
pub mod export;
pub mod memory;
pub mod notify;
pub mod params;
pub mod query;
pub mod repository;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    IntakeDraft, IntakeId, IntakeRequest, IntakeStatus, IntakeView, NewIntake, StatusChange,
    StatusTransition,
};
pub use export::{canonical_timestamp, render_csv, CsvExport, CSV_HEADER, EXPORT_FILENAME};
pub use memory::InMemoryIntakeRepository;
pub use notify::{IntakeNotice, IntakeNotifier, NotifyError, TracingNotifier};
pub use params::{parse_timestamp, FilterParams, SearchParams};
pub use query::{sort_newest_first, IntakeFilter, IntakePage, IntakeQueryEngine, QuerySpec};
pub use repository::{IntakeRepository, RepositoryError};
pub use router::intake_router;
pub use store::IntakeStore;
