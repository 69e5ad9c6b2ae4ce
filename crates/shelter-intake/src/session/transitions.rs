use chrono::{DateTime, Utc};

use crate::intake::{IntakeFilter, IntakePage, IntakeStatus, IntakeView, QuerySpec};
use crate::shelters::ShelterId;

/// Edit applied to a single filter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change<T> {
    Keep,
    Set(T),
    Clear,
}

impl<T> Default for Change<T> {
    fn default() -> Self {
        Change::Keep
    }
}

impl<T> Change<T> {
    fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Change::Keep => current,
            Change::Set(value) => Some(value),
            Change::Clear => None,
        }
    }
}

/// User edits to the filter panel. Untouched fields stay as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterPatch {
    pub status: Change<IntakeStatus>,
    pub shelter_id: Change<ShelterId>,
    pub from_dt: Change<DateTime<Utc>>,
    pub to_dt: Change<DateTime<Utc>>,
}

impl FilterPatch {
    pub fn status(status: Option<IntakeStatus>) -> Self {
        Self {
            status: status.map_or(Change::Clear, Change::Set),
            ..Self::default()
        }
    }

    pub fn date_range(from_dt: Option<DateTime<Utc>>, to_dt: Option<DateTime<Utc>>) -> Self {
        Self {
            from_dt: from_dt.map_or(Change::Clear, Change::Set),
            to_dt: to_dt.map_or(Change::Clear, Change::Set),
            ..Self::default()
        }
    }
}

/// Next query after a filter edit. Whenever the effective filter differs, the page
/// goes back to 1 so a narrowed result set is never viewed past its end.
pub fn apply_filter_change(current: &QuerySpec, patch: FilterPatch) -> QuerySpec {
    let filter = IntakeFilter {
        status: patch.status.apply(current.filter.status),
        shelter_id: patch.shelter_id.apply(current.filter.shelter_id),
        from_dt: patch.from_dt.apply(current.filter.from_dt),
        to_dt: patch.to_dt.apply(current.filter.to_dt),
    };
    let page = if filter == current.filter {
        current.page
    } else {
        1
    };
    QuerySpec {
        filter,
        page,
        page_size: current.page_size,
    }
}

/// Copy of `page` with the row sharing `updated.id` swapped out. Other rows, their
/// order, and the totals are untouched.
pub fn replace_by_id(page: &IntakePage, updated: &IntakeView) -> IntakePage {
    IntakePage {
        items: page
            .items
            .iter()
            .map(|row| {
                if row.id == updated.id {
                    updated.clone()
                } else {
                    row.clone()
                }
            })
            .collect(),
        ..page.clone()
    }
}
