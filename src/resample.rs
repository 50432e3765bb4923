//! Dense daily load series from sparse, irregularly dated sessions

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{CalculationError, ValidationError};
use crate::models::Session;

/// Anything that contributes a load on a calendar day
pub trait DatedLoad {
    fn date(&self) -> NaiveDate;
    fn load(&self) -> Decimal;
}

impl<T: DatedLoad + ?Sized> DatedLoad for &T {
    fn date(&self) -> NaiveDate {
        (**self).date()
    }

    fn load(&self) -> Decimal {
        (**self).load()
    }
}

impl DatedLoad for Session {
    fn date(&self) -> NaiveDate {
        Session::date(self)
    }

    fn load(&self) -> Decimal {
        Session::load(self)
    }
}

/// Total load for one calendar day. Zero on rest days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLoad {
    pub date: NaiveDate,
    pub load: Decimal,
}

impl DatedLoad for DailyLoad {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn load(&self) -> Decimal {
        self.load
    }
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Contiguous, date-ordered daily loads with no gaps. Every load is
/// non-negative; only `resample` builds one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSeries {
    days: Vec<DailyLoad>,
}

impl LoadSeries {
    pub fn days(&self) -> &[DailyLoad] {
        &self.days
    }

    pub fn loads(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.days.iter().map(|d| d.load)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.date)
    }

    /// Append zero-load rest days up to and including `date`.
    ///
    /// No-op when the series is empty or already reaches `date`.
    pub fn extend_to(mut self, date: NaiveDate) -> Self {
        if let Some(last) = self.last_date() {
            self.days.extend(
                last.iter_days()
                    .skip(1)
                    .take_while(|d| *d <= date)
                    .map(|date| DailyLoad {
                        date,
                        load: Decimal::ZERO,
                    }),
            );
        }
        self
    }

    pub fn into_days(self) -> Vec<DailyLoad> {
        self.days
    }
}

/// Resample dated loads into a dense daily series.
///
/// Entries outside `range` are dropped. The series spans the earliest to the
/// latest remaining date; same-day loads accumulate and missing days get
/// zero load. No entries yields an empty series.
///
/// # Errors
/// Negative loads are rejected, as is a daily total beyond the decimal range.
pub fn resample<T: DatedLoad>(
    entries: &[T],
    range: Option<DateRange>,
) -> Result<LoadSeries, CalculationError> {
    let mut totals: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

    for entry in entries
        .iter()
        .filter(|e| range.map_or(true, |r| r.contains(e.date())))
    {
        let load = entry.load();
        if load < Decimal::ZERO {
            return Err(CalculationError::InvalidParameter {
                calculation: "resample".to_string(),
                parameter: format!("load on {}", entry.date()),
                value: load.to_string(),
            });
        }

        let total = totals.entry(entry.date()).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(load)
            .ok_or_else(|| CalculationError::Overflow {
                calculation: format!("daily load total on {}", entry.date()),
            })?;
    }

    let (first, last) = match (totals.keys().next(), totals.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Ok(LoadSeries::default()),
    };

    let days: Vec<DailyLoad> = first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|date| DailyLoad {
            date,
            load: totals.get(&date).copied().unwrap_or(Decimal::ZERO),
        })
        .collect();

    debug!(
        entries = entries.len(),
        training_days = totals.len(),
        days = days.len(),
        "Resampled load series"
    );

    Ok(LoadSeries { days })
}
