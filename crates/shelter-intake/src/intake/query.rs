use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{IntakeRequest, IntakeStatus, IntakeView};
use super::export::{render_csv, CsvExport};
use super::repository::{IntakeRepository, RepositoryError};
use crate::config::PagingConfig;
use crate::error::ServiceError;
use crate::shelters::{ShelterDirectory, ShelterId, ShelterSummary};

/// Filter predicate shared by paged search and CSV export. `None` fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeFilter {
    pub status: Option<IntakeStatus>,
    pub shelter_id: Option<ShelterId>,
    /// Inclusive lower bound on `created_at`.
    pub from_dt: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub to_dt: Option<DateTime<Utc>>,
}

impl IntakeFilter {
    pub fn matches(&self, record: &IntakeRequest) -> bool {
        self.status.map_or(true, |status| record.status == status)
            && self
                .shelter_id
                .map_or(true, |shelter_id| record.shelter_id == shelter_id)
            && self.from_dt.map_or(true, |from| record.created_at >= from)
            && self.to_dt.map_or(true, |to| record.created_at <= to)
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        match (self.from_dt, self.to_dt) {
            (Some(from), Some(to)) if from > to => Err(ServiceError::validation(
                "from_dt must not be later than to_dt",
            )),
            _ => Ok(()),
        }
    }
}

/// Filter plus 1-based pagination for a single search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub filter: IntakeFilter,
    pub page: u32,
    pub page_size: u32,
}

impl QuerySpec {
    pub fn first_page(filter: IntakeFilter, page_size: u32) -> Self {
        Self {
            filter,
            page: 1,
            page_size,
        }
    }

    /// Out-of-range pagination is rejected rather than clamped.
    pub fn validate(&self, paging: &PagingConfig) -> Result<(), ServiceError> {
        if self.page == 0 {
            return Err(ServiceError::validation("page must be at least 1"));
        }
        if self.page_size == 0 || self.page_size > paging.max_page_size {
            return Err(ServiceError::validation(format!(
                "page_size must be between 1 and {}",
                paging.max_page_size
            )));
        }
        self.filter.validate()
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }
}

/// One page of search results. `total` counts every match before pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakePage {
    pub items: Vec<IntakeView>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}

impl IntakePage {
    /// At least one page, even when nothing matches.
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        self.total.div_ceil(self.page_size as usize).max(1)
    }
}

/// Newest first; ties broken by id so pagination is stable.
pub fn sort_newest_first(records: &mut [IntakeRequest]) {
    records.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| right.id.cmp(&left.id))
    });
}

/// Executes filtered searches and exports over the intake repository.
pub struct IntakeQueryEngine<R> {
    repository: Arc<R>,
    directory: Arc<dyn ShelterDirectory>,
    paging: PagingConfig,
}

impl<R> IntakeQueryEngine<R>
where
    R: IntakeRepository + 'static,
{
    pub fn new(repository: Arc<R>, directory: Arc<dyn ShelterDirectory>, paging: PagingConfig) -> Self {
        Self {
            repository,
            directory,
            paging,
        }
    }

    pub fn paging(&self) -> &PagingConfig {
        &self.paging
    }

    pub fn search(&self, spec: &QuerySpec) -> Result<IntakePage, ServiceError> {
        spec.validate(&self.paging)?;

        let rows = self.filtered(&spec.filter)?;
        let total = rows.len();
        let mut join = ShelterJoin::new(self.directory.as_ref());
        let items = rows
            .into_iter()
            .skip(spec.offset())
            .take(spec.page_size as usize)
            .map(|record| join.view(record))
            .collect();

        Ok(IntakePage {
            items,
            total,
            page: spec.page,
            page_size: spec.page_size,
        })
    }

    /// Every matching row, unpaginated, as a complete CSV document.
    pub fn export_csv(&self, filter: &IntakeFilter) -> Result<CsvExport, ServiceError> {
        filter.validate()?;

        let rows = self.filtered(filter).map_err(|err| {
            tracing::error!(error = %err, "intake export query failed");
            ServiceError::Export("export failed while reading intake requests".to_string())
        })?;

        let mut join = ShelterJoin::new(self.directory.as_ref());
        let views: Vec<IntakeView> = rows.into_iter().map(|record| join.view(record)).collect();
        let body = render_csv(&views).map_err(|err| {
            tracing::error!(error = %err, "intake export rendering failed");
            ServiceError::Export("export failed while writing CSV".to_string())
        })?;

        tracing::info!(rows = views.len(), "intake export rendered");
        Ok(CsvExport::new(views.len(), body))
    }

    fn filtered(&self, filter: &IntakeFilter) -> Result<Vec<IntakeRequest>, RepositoryError> {
        let mut rows = self.repository.matching(filter)?;
        rows.retain(|record| filter.matches(record));
        sort_newest_first(&mut rows);
        Ok(rows)
    }
}

/// Memoized shelter lookups for one result set.
pub(crate) struct ShelterJoin<'a> {
    directory: &'a dyn ShelterDirectory,
    cache: HashMap<ShelterId, Option<ShelterSummary>>,
}

impl<'a> ShelterJoin<'a> {
    pub(crate) fn new(directory: &'a dyn ShelterDirectory) -> Self {
        Self {
            directory,
            cache: HashMap::new(),
        }
    }

    pub(crate) fn summary(&mut self, id: ShelterId) -> Option<ShelterSummary> {
        let directory = self.directory;
        self.cache
            .entry(id)
            .or_insert_with(|| match directory.get(id) {
                Ok(shelter) => Some(shelter.summary()),
                Err(err) => {
                    tracing::warn!(shelter_id = id.0, error = %err, "shelter join failed");
                    None
                }
            })
            .clone()
    }

    pub(crate) fn view(&mut self, record: IntakeRequest) -> IntakeView {
        let shelter = self.summary(record.shelter_id);
        IntakeView::joined(record, shelter)
    }
}
