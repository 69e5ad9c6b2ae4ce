//! Shelter intake requests: lifecycle, administrative search, and CSV export.
//!
//! Field staff record intake requests against a shelter; administrators search,
//! page through, export, and transition the status of those requests.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod intake;
pub mod session;
pub mod shelters;
pub mod telemetry;

pub use error::{AppError, ErrorKind, ServiceError};
pub use http::{api_router, IntakeApi};
