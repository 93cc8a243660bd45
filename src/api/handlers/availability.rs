use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use crate::api::dtos::requests::{DateRangeQuery, StayQuery};
use crate::api::dtos::responses::AvailabilityResponse;
use crate::domain::models::stay::StayRange;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

/// Rooms of one type still bookable for a whole stay.
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(room_type_id): Path<String>,
    Query(query): Query<StayQuery>,
) -> Result<impl IntoResponse, AppError> {
    let stay = match query.check_out {
        Some(check_out) => StayRange::new(query.check_in, check_out)?,
        None => StayRange::single_day(query.check_in),
    };

    let snapshot = state.availability.snapshot(&room_type_id, &stay, None).await?;

    Ok(Json(AvailabilityResponse {
        room_type_id,
        check_in: stay.start,
        check_out: stay.end,
        snapshot,
    }))
}

/// Per-date availability for a calendar view, `from` and `to` inclusive.
pub async fn get_daily_availability(
    State(state): State<Arc<AppState>>,
    Path(room_type_id): Path<String>,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    if (query.to - query.from).num_days() > 366 {
        return Err(AppError::Validation("Calendar range is limited to one year".into()));
    }
    let days = state.availability.daily(&room_type_id, query.from, query.to).await?;
    Ok(Json(days))
}

pub async fn list_room_types(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.room_repo.list_room_types().await?))
}
