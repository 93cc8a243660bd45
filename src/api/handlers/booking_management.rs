use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::{
    CancelBookingRequest, ConfirmPaymentRequest, FailBookingRequest, ModifyRoomsRequest,
    RecordPaymentRequest, RescheduleBookingRequest, ReviewPaymentRequest,
};
use crate::domain::models::payment::ProofStatus;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.bookings.confirm_payment(&booking_id, payload.kind).await?;
    Ok(Json(details))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<CancelBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let reason = payload.reason.unwrap_or_else(|| "cancelled by request".into());
    let booking = state.bookings.cancel(&booking_id, &reason).await?;
    info!("Booking {} cancelled: {}", booking.id, reason);
    Ok(Json(booking))
}

/// Called by the payment subsystem when a checkout attempt fails.
pub async fn fail_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<FailBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.mark_failed(&booking_id, &payload.reason).await?))
}

pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<RescheduleBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.bookings.reschedule(&booking_id, payload.check_in, payload.check_out).await?;
    Ok(Json(details))
}

pub async fn modify_rooms(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<ModifyRoomsRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.modify(&booking_id, payload.rooms).await?))
}

pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = payload.proof_status.unwrap_or(ProofStatus::Pending);
    let payment = state.bookings.record_payment(&booking_id, payload.amount, status).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.payment_repo.list_for_booking(&booking_id).await?))
}

pub async fn review_payment(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<String>,
    Json(payload): Json<ReviewPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.review_payment(&payment_id, payload.proof_status).await?))
}
