use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use crate::domain::services::booking_service::NewBooking;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewBooking>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.bookings.create(payload).await?;
    info!("Booking {} accepted, pending payment", created.booking.reference);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.get(&booking_id).await?))
}

pub async fn get_booking_by_reference(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_reference(&reference).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;
    Ok(Json(state.bookings.get(&booking.id).await?))
}
