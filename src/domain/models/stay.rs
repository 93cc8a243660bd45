use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use crate::error::AppError;

/// Stay interval in whole days.
///
/// Overnight stays occupy `[start, end)`: the checkout day is free for the next guest.
/// Same-day stays (day tours) have `start == end` and hold the unit for the full day,
/// i.e. they occupy `[start, start + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl StayRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if end < start {
            return Err(AppError::Validation(format!(
                "check-out {} is before check-in {}", end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn is_day_tour(&self) -> bool {
        self.start == self.end
    }

    /// Exclusive end of the occupied span.
    pub fn occupied_until(&self) -> NaiveDate {
        if self.is_day_tour() {
            self.start + Duration::days(1)
        } else {
            self.end
        }
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.start < other.occupied_until() && other.start < self.occupied_until()
    }

    /// Dates that carry a meal service: every night of an overnight stay,
    /// or the visit date of a day tour.
    pub fn service_dates(&self) -> Vec<NaiveDate> {
        if self.is_day_tour() {
            return vec![self.start];
        }
        self.start.iter_days().take_while(|d| *d < self.end).collect()
    }

    /// Every calendar day this stay occupies.
    pub fn occupied_dates(&self) -> Vec<NaiveDate> {
        let until = self.occupied_until();
        self.start.iter_days().take_while(|d| *d < until).collect()
    }
}
