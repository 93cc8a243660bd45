use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, availability, booking, booking_management, meal};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Inventory
        .route("/api/v1/room-types", get(availability::list_room_types))
        .route("/api/v1/room-types/{room_type_id}/availability", get(availability::get_availability))
        .route("/api/v1/room-types/{room_type_id}/availability/daily", get(availability::get_daily_availability))

        // Bookings
        .route("/api/v1/bookings", post(booking::create_booking))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking))
        .route("/api/v1/bookings/by-reference/{reference}", get(booking::get_booking_by_reference))

        // Lifecycle
        .route("/api/v1/bookings/{booking_id}/confirm", post(booking_management::confirm_payment))
        .route("/api/v1/bookings/{booking_id}/cancel", post(booking_management::cancel_booking))
        .route("/api/v1/bookings/{booking_id}/fail", post(booking_management::fail_booking))
        .route("/api/v1/bookings/{booking_id}/reschedule", post(booking_management::reschedule_booking))
        .route("/api/v1/bookings/{booking_id}/rooms", put(booking_management::modify_rooms))

        // Payments
        .route("/api/v1/bookings/{booking_id}/payments", get(booking_management::list_payments).post(booking_management::record_payment))
        .route("/api/v1/payments/{payment_id}/review", post(booking_management::review_payment))

        // Meals
        .route("/api/v1/meals/calendar", get(meal::get_calendar))
        .route("/api/v1/meals/tier", get(meal::get_tier))
        .route("/api/v1/meal-programs/{program_id}/overrides", put(meal::upsert_override))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
