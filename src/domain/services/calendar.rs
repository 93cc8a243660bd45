use crate::domain::models::meal::{MealCalendarOverride, MealProgram, OverrideKind, ProgramScope, ProgramStatus};
use crate::domain::ports::MealRepository;
use crate::error::AppError;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    DateOverride,
    MonthOverride,
    BaseScope,
    NoActiveProgram,
}

/// Buffet or free breakfast for one date, with the rule that decided it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayClassification {
    pub date: NaiveDate,
    pub buffet_active: bool,
    pub source: ResolutionSource,
    pub program_id: Option<String>,
    /// Shown to guests on free-breakfast days.
    pub label: Option<String>,
}

/// Raised when more than one program is active at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDiagnostic {
    pub chosen_program_id: String,
    pub competing_program_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarResolution {
    pub days: Vec<DayClassification>,
    pub diagnostic: Option<CalendarDiagnostic>,
}

/// The most recently updated active program. Competing active programs are reported
/// rather than dropped.
pub fn select_active_program(programs: &[MealProgram]) -> (Option<&MealProgram>, Option<CalendarDiagnostic>) {
    let mut active: Vec<&MealProgram> = programs.iter().filter(|p| p.status == ProgramStatus::Active).collect();
    active.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));

    let Some(chosen) = active.first().copied() else {
        return (None, None);
    };

    let diagnostic = (active.len() > 1).then(|| CalendarDiagnostic {
        chosen_program_id: chosen.id.clone(),
        competing_program_ids: active[1..].iter().map(|p| p.id.clone()).collect(),
    });

    (Some(chosen), diagnostic)
}

/// Applies date override, then month override, then the base scope.
///
/// `scope` is `None` when the program's rule could not be evaluated; such days resolve
/// to free breakfast.
pub fn resolve_day(
    program: Option<&MealProgram>,
    scope: Option<&ProgramScope>,
    overrides: &[MealCalendarOverride],
    date: NaiveDate,
) -> DayClassification {
    let Some(program) = program else {
        return DayClassification {
            date,
            buffet_active: false,
            source: ResolutionSource::NoActiveProgram,
            program_id: None,
            label: None,
        };
    };

    let relevant = move || overrides.iter().filter(move |o| o.program_id == program.id && o.applies_to(date));

    let (buffet_active, source) = if let Some(o) = relevant().find(|o| o.kind == OverrideKind::Date) {
        (o.is_active, ResolutionSource::DateOverride)
    } else if let Some(o) = relevant().find(|o| o.kind == OverrideKind::Month) {
        (o.is_active, ResolutionSource::MonthOverride)
    } else {
        (scope.is_some_and(|s| s.matches(date)), ResolutionSource::BaseScope)
    };

    DayClassification {
        date,
        buffet_active,
        source,
        program_id: Some(program.id.clone()),
        label: if buffet_active { None } else { program.inactive_label.clone() },
    }
}

pub struct CalendarResolver {
    meal_repo: Arc<dyn MealRepository>,
}

impl CalendarResolver {
    pub fn new(meal_repo: Arc<dyn MealRepository>) -> Self {
        Self { meal_repo }
    }

    /// Loads the authoritative program, logging every time more than one is active.
    pub async fn active_program(&self) -> Result<(Option<MealProgram>, Option<CalendarDiagnostic>), AppError> {
        let programs = self.meal_repo.list_active_programs().await?;
        let (chosen, diagnostic) = select_active_program(&programs);

        if let Some(diag) = &diagnostic {
            warn!(
                "Multiple active meal programs; using {} and ignoring {:?}",
                diag.chosen_program_id, diag.competing_program_ids
            );
        }

        Ok((chosen.cloned(), diagnostic))
    }

    pub async fn is_buffet_active(&self, date: NaiveDate) -> Result<DayClassification, AppError> {
        let resolution = self.classify_range(date, date).await?;
        resolution
            .days
            .into_iter()
            .next()
            .ok_or_else(|| AppError::InternalWithMsg(format!("no classification for {}", date)))
    }

    /// Classifies every date in `[start, end]`.
    pub async fn classify_range(&self, start: NaiveDate, end: NaiveDate) -> Result<CalendarResolution, AppError> {
        if end < start {
            return Err(AppError::Validation(format!("range end {} is before start {}", end, start)));
        }

        let (program, diagnostic) = self.active_program().await?;

        let (scope, overrides) = match &program {
            Some(p) => {
                let scope = match p.scope() {
                    Ok(scope) => Some(scope),
                    Err(e) => {
                        warn!("Meal program {} has an unusable scope: {}", p.id, e);
                        None
                    }
                };
                (scope, self.meal_repo.overrides_between(&p.id, start, end).await?)
            }
            None => (None, Vec::new()),
        };

        let days = start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|date| resolve_day(program.as_ref(), scope.as_ref(), &overrides, date))
            .collect();

        Ok(CalendarResolution { days, diagnostic })
    }
}
