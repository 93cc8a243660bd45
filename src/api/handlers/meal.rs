use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use crate::api::dtos::requests::{DateQuery, DateRangeQuery, UpsertOverrideRequest};
use crate::api::dtos::responses::TierLookupResponse;
use crate::domain::models::meal::MealCalendarOverride;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn get_calendar(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    if (query.to - query.from).num_days() > 366 {
        return Err(AppError::Validation("Calendar range is limited to one year".into()));
    }
    Ok(Json(state.calendar.classify_range(query.from, query.to).await?))
}

/// Pricing tier of the active program that applies on `date`.
pub async fn get_tier(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (program, _) = state.calendar.active_program().await?;

    let response = match program {
        Some(program) => TierLookupResponse {
            tier: state.tiers.tier_for(&program.id, query.date).await?,
            conflicts: state.tiers.window_conflicts(&program.id).await?,
            program_id: Some(program.id),
            date: query.date,
        },
        None => TierLookupResponse { program_id: None, date: query.date, tier: None, conflicts: Vec::new() },
    };

    Ok(Json(response))
}

pub async fn upsert_override(
    State(state): State<Arc<AppState>>,
    Path(program_id): Path<String>,
    Json(payload): Json<UpsertOverrideRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.meal_repo.find_program(&program_id).await?
        .ok_or(AppError::NotFound(format!("Meal program {} not found", program_id)))?;

    let mut o = match (payload.date, payload.year, payload.month) {
        (Some(date), None, None) => MealCalendarOverride::for_date(program_id, date, payload.is_active),
        (None, Some(year), Some(month)) if (1..=12).contains(&month) => {
            MealCalendarOverride::for_month(program_id, year, month, payload.is_active)
        }
        _ => return Err(AppError::Validation("Provide either a date or a year and month (1-12)".into())),
    };
    o.note = payload.note;

    let saved = state.meal_repo.upsert_override(&o).await?;
    info!("Meal override {} saved for program {} (active: {})", saved.id, saved.program_id, saved.is_active);
    Ok(Json(saved))
}
