use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, SecondsFormat, Utc};

use super::domain::IntakeView;

pub const CSV_HEADER: [&str; 8] = [
    "id",
    "shelter_name",
    "shelter_address",
    "name",
    "reason",
    "eta",
    "created_at",
    "status",
];

pub const EXPORT_FILENAME: &str = "intakes.csv";

/// A fully rendered CSV document, built before any byte is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub row_count: usize,
    pub body: Vec<u8>,
}

impl CsvExport {
    pub fn new(row_count: usize, body: Vec<u8>) -> Self {
        Self { row_count, body }
    }

    pub fn content_type(&self) -> mime::Mime {
        mime::TEXT_CSV_UTF_8
    }

    pub fn as_text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}

impl IntoResponse for CsvExport {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{EXPORT_FILENAME}\"");
        let content_type = self.content_type();
        let mut response = (StatusCode::OK, self.body).into_response();
        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
            headers.insert(header::CONTENT_TYPE, value);
        }
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        response
    }
}

/// Canonical export timestamp: RFC 3339, UTC, second precision.
pub fn canonical_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn render_csv(rows: &[IntakeView]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for row in rows {
        let (shelter_name, shelter_address) = row
            .shelter
            .as_ref()
            .map(|shelter| (shelter.name.as_str(), shelter.address.as_str()))
            .unwrap_or_default();

        writer.write_record([
            row.id.to_string().as_str(),
            shelter_name,
            shelter_address,
            row.name.as_deref().unwrap_or_default(),
            row.reason.as_deref().unwrap_or_default(),
            row.eta.as_ref().map(canonical_timestamp).unwrap_or_default().as_str(),
            canonical_timestamp(&row.created_at).as_str(),
            row.status.label(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::domain::{IntakeId, IntakeStatus};
    use crate::shelters::{ShelterId, ShelterSummary};

    fn utc(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn header_only_for_empty_exports() {
        let body = render_csv(&[]).expect("renders");
        assert_eq!(
            String::from_utf8(body).expect("utf8"),
            "id,shelter_name,shelter_address,name,reason,eta,created_at,status\n"
        );
    }

    #[test]
    fn rows_use_fixed_columns_and_canonical_timestamps() {
        let row = IntakeView {
            id: IntakeId(7),
            shelter_id: ShelterId(1),
            shelter: Some(ShelterSummary {
                id: ShelterId(1),
                name: "Downtown Family Shelter".to_string(),
                address: "200 Church St, Nashville, TN".to_string(),
            }),
            name: Some("Sam".to_string()),
            reason: Some("Evicted, needs bed tonight".to_string()),
            eta: Some(utc("2024-01-01T21:30:00.900+00:00")),
            created_at: utc("2024-01-01T18:00:00-06:00"),
            status: IntakeStatus::Pending,
        };

        let body = render_csv(&[row]).expect("renders");
        let text = String::from_utf8(body).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[1],
            "7,Downtown Family Shelter,\"200 Church St, Nashville, TN\",Sam,\"Evicted, needs bed tonight\",2024-01-01T21:30:00Z,2024-01-02T00:00:00Z,pending"
        );
    }

    #[test]
    fn missing_optional_values_are_empty_cells() {
        let row = IntakeView {
            id: IntakeId(3),
            shelter_id: ShelterId(9),
            shelter: None,
            name: None,
            reason: None,
            eta: None,
            created_at: utc("2024-05-01T00:00:00Z"),
            status: IntakeStatus::Cancelled,
        };

        let body = render_csv(&[row]).expect("renders");
        let text = String::from_utf8(body).expect("utf8");
        assert_eq!(
            text.lines().nth(1),
            Some("3,,,,,,2024-05-01T00:00:00Z,cancelled")
        );
    }

    #[tokio::test]
    async fn response_carries_csv_headers() {
        let export = CsvExport::new(0, render_csv(&[]).expect("renders"));
        assert_eq!(export.content_type().as_ref(), "text/csv; charset=utf-8");
        let response = export.into_response();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE),
            Some(&HeaderValue::from_static("text/csv; charset=utf-8"))
        );
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION),
            Some(&HeaderValue::from_static("attachment; filename=\"intakes.csv\""))
        );
    }
}
