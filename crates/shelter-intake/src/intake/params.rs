//! Query-string and payload parsing for the intake endpoints.
//!
//! Every parameter arrives as an optional string so malformed input surfaces as a
//! structured `ValidationError` instead of a framework rejection. Empty strings are
//! treated as absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use super::domain::IntakeStatus;
use super::query::{IntakeFilter, QuerySpec};
use crate::config::PagingConfig;
use crate::error::ServiceError;
use crate::shelters::ShelterId;

const NAIVE_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parse an RFC 3339 timestamp, or a naive date/time taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(format!(
        "failed to parse '{trimmed}' as an ISO-8601 timestamp"
    ))
}

pub(crate) fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.filter(|value| !value.trim().is_empty())
        .map(|value| parse_timestamp(&value).map_err(serde::de::Error::custom))
        .transpose()
}

/// Filters shared by `/intake/search` and `/intake/export.csv`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub shelter_id: Option<String>,
    #[serde(default)]
    pub from_dt: Option<String>,
    #[serde(default)]
    pub to_dt: Option<String>,
}

impl FilterParams {
    pub fn into_filter(self) -> Result<IntakeFilter, ServiceError> {
        let status = present(self.status)
            .map(|raw| raw.parse::<IntakeStatus>())
            .transpose()?;
        let shelter_id = present(self.shelter_id)
            .map(|raw| positive("shelter_id", &raw).map(ShelterId))
            .transpose()?;
        let from_dt = present(self.from_dt)
            .map(|raw| timestamp("from_dt", &raw))
            .transpose()?;
        let to_dt = present(self.to_dt)
            .map(|raw| timestamp("to_dt", &raw))
            .transpose()?;

        let filter = IntakeFilter {
            status,
            shelter_id,
            from_dt,
            to_dt,
        };
        filter.validate()?;
        Ok(filter)
    }
}

/// Filters plus pagination for `/intake/search`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(flatten)]
    pub filter: FilterParams,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub page_size: Option<String>,
}

impl SearchParams {
    pub fn into_spec(self, paging: &PagingConfig) -> Result<QuerySpec, ServiceError> {
        let page = match present(self.page) {
            Some(raw) => u32::try_from(positive("page", &raw)?)
                .map_err(|_| ServiceError::validation("page is out of range"))?,
            None => 1,
        };
        let page_size = match present(self.page_size) {
            Some(raw) => u32::try_from(positive("page_size", &raw)?).map_err(|_| {
                ServiceError::validation(format!(
                    "page_size must be between 1 and {}",
                    paging.max_page_size
                ))
            })?,
            None => paging.default_page_size,
        };

        let spec = QuerySpec {
            filter: self.filter.into_filter()?,
            page,
            page_size,
        };
        spec.validate(paging)?;
        Ok(spec)
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

fn positive(field: &str, raw: &str) -> Result<u64, ServiceError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ServiceError::validation(format!(
            "{field} must be a positive integer"
        ))),
    }
}

fn timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, ServiceError> {
    parse_timestamp(raw).map_err(|reason| ServiceError::validation(format!("{field}: {reason}")))
}
