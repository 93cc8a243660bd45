use serde::{Deserialize, Serialize};
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use sqlx::FromRow;
use sqlx::types::Json;
use std::collections::BTreeSet;
use uuid::Uuid;
use crate::error::AppError;

text_enum!(
    ScopeType {
        Always => "always",
        DateRange => "date_range",
        Months => "months",
        Weekly => "weekly",
        Composite => "composite",
    }
);

text_enum!(
    /// Which days count as "weekend" for a weekly program.
    WeekendDefinition {
        SatSun => "sat_sun",
        FriSun => "fri_sun",
        FriSat => "fri_sat",
        Custom => "custom",
    }
);

impl WeekendDefinition {
    pub fn days(&self) -> &'static [Weekday] {
        match self {
            WeekendDefinition::SatSun => &[Weekday::Sat, Weekday::Sun],
            WeekendDefinition::FriSun => &[Weekday::Fri, Weekday::Sat, Weekday::Sun],
            WeekendDefinition::FriSat => &[Weekday::Fri, Weekday::Sat],
            WeekendDefinition::Custom => &[],
        }
    }
}

text_enum!(
    ProgramStatus {
        Active => "active",
        Inactive => "inactive",
    }
);

text_enum!(
    OverrideKind {
        Date => "date",
        Month => "month",
    }
);

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct MealProgram {
    pub id: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub scope_type: ScopeType,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    /// Months 1-12.
    pub months: Json<Vec<u32>>,
    /// Days counted from Sunday (0) to Saturday (6); used with `WeekendDefinition::Custom`.
    pub weekdays: Json<Vec<u32>>,
    #[sqlx(try_from = "String")]
    pub weekend_definition: WeekendDefinition,
    #[sqlx(try_from = "String")]
    pub status: ProgramStatus,
    pub inactive_label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MealProgram {
    pub fn new(name: String, scope_type: ScopeType, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            scope_type,
            date_start: None,
            date_end: None,
            months: Json(Vec::new()),
            weekdays: Json(Vec::new()),
            weekend_definition: WeekendDefinition::SatSun,
            status: ProgramStatus::Active,
            inactive_label: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn scope(&self) -> Result<ProgramScope, AppError> {
        let months: BTreeSet<u32> = self.months.0.iter().copied().filter(|m| (1..=12).contains(m)).collect();
        let range = match (self.date_start, self.date_end) {
            (Some(start), Some(end)) if start <= end => Some((start, end)),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(format!(
                    "program {} has an incomplete or inverted date range", self.id
                )));
            }
        };

        Ok(match self.scope_type {
            ScopeType::Always => ProgramScope::Always,
            ScopeType::DateRange => {
                let (start, end) = range.ok_or_else(|| {
                    AppError::Validation(format!("program {} needs date_start and date_end", self.id))
                })?;
                ProgramScope::DateRange { start, end }
            }
            ScopeType::Months => ProgramScope::Months(months),
            ScopeType::Weekly => {
                let days = if self.weekend_definition == WeekendDefinition::Custom {
                    self.weekdays.0.iter().copied().filter(|d| *d <= 6).collect()
                } else {
                    self.weekend_definition.days().iter().map(Weekday::num_days_from_sunday).collect()
                };
                ProgramScope::Weekly(days)
            }
            ScopeType::Composite => ProgramScope::Composite { range, months },
        })
    }
}

/// Validated base rule of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramScope {
    Always,
    DateRange { start: NaiveDate, end: NaiveDate },
    Months(BTreeSet<u32>),
    /// Days counted from Sunday (0).
    Weekly(BTreeSet<u32>),
    /// Union of its configured sub-rules.
    Composite { range: Option<(NaiveDate, NaiveDate)>, months: BTreeSet<u32> },
}

impl ProgramScope {
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            ProgramScope::Always => true,
            ProgramScope::DateRange { start, end } => *start <= date && date <= *end,
            ProgramScope::Months(months) => months.contains(&date.month()),
            ProgramScope::Weekly(days) => days.contains(&date.weekday().num_days_from_sunday()),
            ProgramScope::Composite { range, months } => {
                range.is_some_and(|(start, end)| start <= date && date <= end)
                    || months.contains(&date.month())
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct MealCalendarOverride {
    pub id: String,
    pub program_id: String,
    #[sqlx(try_from = "String")]
    pub kind: OverrideKind,
    pub date: Option<NaiveDate>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub is_active: bool,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MealCalendarOverride {
    pub fn for_date(program_id: String, date: NaiveDate, is_active: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            program_id,
            kind: OverrideKind::Date,
            date: Some(date),
            month: None,
            year: None,
            is_active,
            note: None,
            created_at: Utc::now(),
        }
    }

    pub fn for_month(program_id: String, year: i32, month: u32, is_active: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            program_id,
            kind: OverrideKind::Month,
            date: None,
            month: Some(month as i32),
            year: Some(year),
            is_active,
            note: None,
            created_at: Utc::now(),
        }
    }

    pub fn applies_to(&self, date: NaiveDate) -> bool {
        match self.kind {
            OverrideKind::Date => self.date == Some(date),
            OverrideKind::Month => {
                self.year == Some(date.year()) && self.month == Some(date.month() as i32)
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct MealPricingTier {
    pub id: String,
    pub program_id: String,
    pub name: String,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    pub adult_buffet_price: i64,
    pub child_buffet_price: i64,
    pub extra_guest_breakfast_price: i64,
    pub created_at: DateTime<Utc>,
}

pub struct NewTierParams {
    pub program_id: String,
    pub name: String,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    pub adult_buffet_price: i64,
    pub child_buffet_price: i64,
    pub extra_guest_breakfast_price: i64,
}

impl MealPricingTier {
    pub fn new(params: NewTierParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            program_id: params.program_id,
            name: params.name,
            effective_from: params.effective_from,
            effective_to: params.effective_to,
            adult_buffet_price: params.adult_buffet_price,
            child_buffet_price: params.child_buffet_price,
            extra_guest_breakfast_price: params.extra_guest_breakfast_price,
            created_at: Utc::now(),
        }
    }

    /// Window test with open ends treated as unbounded.
    pub fn window_contains(&self, date: NaiveDate) -> bool {
        self.effective_from.is_none_or(|from| from <= date)
            && self.effective_to.is_none_or(|to| date <= to)
    }

    pub fn is_open_ended(&self) -> bool {
        self.effective_from.is_none() || self.effective_to.is_none()
    }
}

/// Why a night fell back to free breakfast at no cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealFallback {
    NoActiveProgram,
    NoPricingTier,
}

/// Meal service priced for one service date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MealNight {
    Buffet {
        date: NaiveDate,
        adult_price: i64,
        child_price: i64,
        charge: i64,
    },
    FreeBreakfast {
        date: NaiveDate,
        extra_guest_breakfast_price: i64,
        extra_guests: i32,
        charge: i64,
        fallback: Option<MealFallback>,
    },
}

impl MealNight {
    pub fn date(&self) -> NaiveDate {
        match self {
            MealNight::Buffet { date, .. } | MealNight::FreeBreakfast { date, .. } => *date,
        }
    }

    pub fn charge(&self) -> i64 {
        match self {
            MealNight::Buffet { charge, .. } | MealNight::FreeBreakfast { charge, .. } => *charge,
        }
    }

    pub fn is_buffet(&self) -> bool {
        matches!(self, MealNight::Buffet { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealQuote {
    pub program_id: Option<String>,
    pub nights: Vec<MealNight>,
    pub total: i64,
}
