mod common;

use chrono::NaiveTime;
use common::{booking_request, d, TestApp};
use resort_booking::domain::models::booking::{BookingStatus, BookingType, RoomLineRequest};
use resort_booking::domain::services::booking_service::PaymentKind;
use resort_booking::error::AppError;

fn rooms(entries: &[(&str, i32)]) -> Vec<RoomLineRequest> {
    entries
        .iter()
        .map(|(id, adults)| RoomLineRequest { room_type_id: id.to_string(), adults: *adults, children: 0 })
        .collect()
}

#[tokio::test]
async fn test_failed_reschedule_changes_nothing() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 1).await;

    let other = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    app.state.bookings.confirm_payment(&other.booking.id, PaymentKind::Full).await.unwrap();

    let mine = app.state.bookings.create(booking_request("2025-09-05", "2025-09-07", &[(&rt.id, 2)])).await.unwrap();
    app.state.bookings.confirm_payment(&mine.booking.id, PaymentKind::Full).await.unwrap();

    let result = app.state.bookings.reschedule(&mine.booking.id, d("2025-09-11"), d("2025-09-13")).await;
    assert!(matches!(result, Err(AppError::RoomUnavailable(_))));

    let after = app.state.bookings.get(&mine.booking.id).await.unwrap();
    assert_eq!(after.booking.check_in_date, d("2025-09-05"));
    assert_eq!(after.booking.check_out_date, d("2025-09-07"));
    assert_eq!(after.booking.total_price, mine.booking.total_price);
    assert_eq!(after.lines.len(), 1);
    assert_eq!(after.lines[0].room_unit_id, mine.lines[0].room_unit_id);
    assert_eq!(app.notifier.wait_for(&mine.booking.id, "rescheduled", 0).await, 0);
}

#[tokio::test]
async fn test_reschedule_keeps_unit_and_reprices() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 2).await;

    let created = app.state.bookings.create(booking_request("2025-09-05", "2025-09-07", &[(&rt.id, 2)])).await.unwrap();
    app.state.bookings.confirm_payment(&created.booking.id, PaymentKind::Downpayment).await.unwrap();

    let moved = app.state.bookings.reschedule(&created.booking.id, d("2025-09-05"), d("2025-09-08")).await.unwrap();
    assert_eq!(moved.booking.status, BookingStatus::Downpayment);
    assert_eq!(moved.booking.check_out_date, d("2025-09-08"));
    assert_eq!(moved.booking.occupied_until, d("2025-09-08"));
    assert_eq!(moved.booking.room_subtotal, 15000);
    assert_eq!(moved.lines[0].room_unit_id, created.lines[0].room_unit_id);

    // Overlapping its own old dates never counts against itself.
    let shifted = app.state.bookings.reschedule(&created.booking.id, d("2025-09-06"), d("2025-09-09")).await.unwrap();
    assert_eq!(shifted.lines[0].room_unit_id, created.lines[0].room_unit_id);
    assert_eq!(app.notifier.wait_for(&created.booking.id, "rescheduled", 2).await, 2);
}

#[tokio::test]
async fn test_reschedule_moves_to_a_free_unit_when_needed() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 2).await;

    let mine = app.state.bookings.create(booking_request("2025-09-05", "2025-09-07", &[(&rt.id, 2)])).await.unwrap();
    let blocker = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    assert_eq!(blocker.lines[0].room_unit_id, mine.lines[0].room_unit_id);

    let moved = app.state.bookings.reschedule(&mine.booking.id, d("2025-09-10"), d("2025-09-12")).await.unwrap();
    assert!(moved.lines[0].room_unit_id.is_some());
    assert_ne!(moved.lines[0].room_unit_id, blocker.lines[0].room_unit_id);

    // A pending booking's hold follows it to the new dates.
    let hold = app.state.lock_store.peek(&mine.booking.id).await.unwrap().unwrap();
    assert_eq!(hold.stay.start, d("2025-09-10"));
}

#[tokio::test]
async fn test_reschedule_rejects_closed_bookings() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 1).await;
    let created = app.state.bookings.create(booking_request("2025-09-05", "2025-09-07", &[(&rt.id, 2)])).await.unwrap();
    app.state.bookings.cancel(&created.booking.id, "changed plans").await.unwrap();

    let result = app.state.bookings.reschedule(&created.booking.id, d("2025-09-06"), d("2025-09-08")).await;
    assert!(matches!(result, Err(AppError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_modify_rooms_reuses_units_and_recomputes_totals() {
    let app = TestApp::new().await;
    let deluxe = app.seed_room_type("Deluxe", 2, 5000, 2).await;
    let suite = app.seed_room_type("Suite", 4, 9000, 1).await;

    let created = app.state.bookings.create(booking_request("2025-09-05", "2025-09-07", &[(&deluxe.id, 2)])).await.unwrap();
    let original_unit = created.lines[0].room_unit_id.clone();

    let modified = app.state.bookings
        .modify(&created.booking.id, rooms(&[(&deluxe.id, 2), (&suite.id, 4)]))
        .await
        .unwrap();
    assert_eq!(modified.lines.len(), 2);
    assert_eq!(modified.booking.adults, 6);
    assert_eq!(modified.booking.room_subtotal, 2 * 5000 + 2 * 9000);
    let deluxe_line = modified.lines.iter().find(|l| l.room_type_id == deluxe.id).unwrap();
    assert_eq!(deluxe_line.room_unit_id, original_unit);
    assert!(modified.lines.iter().all(|l| l.room_unit_id.is_some()));

    let stored = app.state.bookings.get(&created.booking.id).await.unwrap();
    assert_eq!(stored.lines.len(), 2);
    assert_eq!(stored.booking.total_price, modified.booking.total_price);
}

#[tokio::test]
async fn test_modify_beyond_inventory_is_rejected_whole() {
    let app = TestApp::new().await;
    let suite = app.seed_room_type("Suite", 4, 9000, 1).await;
    let deluxe = app.seed_room_type("Deluxe", 2, 5000, 1).await;

    let created = app.state.bookings.create(booking_request("2025-09-05", "2025-09-07", &[(&deluxe.id, 2)])).await.unwrap();

    let result = app.state.bookings
        .modify(&created.booking.id, rooms(&[(&deluxe.id, 2), (&suite.id, 2), (&suite.id, 2)]))
        .await;
    assert!(matches!(result, Err(AppError::RoomUnavailable(_))));

    let stored = app.state.bookings.get(&created.booking.id).await.unwrap();
    assert_eq!(stored.lines.len(), 1);
    assert_eq!(stored.lines[0].room_unit_id, created.lines[0].room_unit_id);
    assert_eq!(stored.booking.total_price, created.booking.total_price);
}

#[tokio::test]
async fn test_reschedule_into_a_day_tour_takes_day_tour_hours() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 1).await;
    let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();

    let created = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    assert_eq!((created.booking.check_in_time, created.booking.check_out_time), (at(14), at(12)));

    let day_tour = app.state.bookings.reschedule(&created.booking.id, d("2025-09-15"), d("2025-09-15")).await.unwrap();
    assert_eq!(day_tour.booking.booking_type, BookingType::DayTour);
    assert_eq!((day_tour.booking.check_in_time, day_tour.booking.check_out_time), (at(8), at(17)));
    assert_eq!(day_tour.booking.room_subtotal, 2500);

    let overnight = app.state.bookings.reschedule(&created.booking.id, d("2025-09-15"), d("2025-09-16")).await.unwrap();
    assert_eq!(overnight.booking.booking_type, BookingType::Overnight);
    assert_eq!((overnight.booking.check_in_time, overnight.booking.check_out_time), (at(14), at(12)));
}
