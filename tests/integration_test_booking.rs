mod common;

use chrono::Duration;
use common::{booking_request, d, TestApp};
use resort_booking::domain::models::{booking::BookingStatus, payment::ProofStatus, stay::StayRange};
use resort_booking::domain::ports::Clock;
use resort_booking::domain::services::booking_service::PaymentKind;
use resort_booking::error::AppError;

#[tokio::test]
async fn test_create_booking_prices_and_holds() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 2).await;

    let created = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 3)])).await.unwrap();
    let booking = &created.booking;

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.reserved_until, Some(app.clock.now() + Duration::minutes(15)));
    assert_eq!(booking.adults, 3);
    // Two nights at 5000 plus one extra guest at 500 per night.
    assert_eq!(booking.room_subtotal, 11000);
    assert_eq!(booking.total_price, 11000);
    assert_eq!(booking.reference.len(), 8);
    assert!(created.lines[0].room_unit_id.is_some());

    let hold = app.state.lock_store.peek(&booking.id).await.unwrap().unwrap();
    assert_eq!(hold.lines.len(), 1);
    let ttl = app.state.lock_store.remaining_ttl(&booking.id).await.unwrap();
    assert!(ttl <= std::time::Duration::from_secs(900) && ttl > std::time::Duration::from_secs(890));

    let stored = app.state.bookings.get(&booking.id).await.unwrap();
    assert_eq!(stored.booking.reference, booking.reference);
    assert_eq!(stored.lines.len(), 1);
}

#[tokio::test]
async fn test_day_tour_uses_longer_hold() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Cabana", 4, 3000, 1).await;

    let tour = app.state.bookings.create(booking_request("2025-09-20", "2025-09-20", &[(&rt.id, 2)])).await.unwrap();
    assert_eq!(tour.booking.reserved_until, Some(app.clock.now() + Duration::minutes(120)));
    assert_eq!(tour.booking.room_subtotal, 1500);
}

#[tokio::test]
async fn test_create_rejects_invalid_requests() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 1).await;

    let past = app.state.bookings.create(booking_request("2025-08-30", "2025-09-02", &[(&rt.id, 2)])).await;
    assert!(matches!(past, Err(AppError::Validation(_))));

    let inverted = app.state.bookings.create(booking_request("2025-09-12", "2025-09-10", &[(&rt.id, 2)])).await;
    assert!(matches!(inverted, Err(AppError::Validation(_))));

    let crowded = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 4)])).await;
    assert!(matches!(crowded, Err(AppError::Validation(_))));

    let no_rooms = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[])).await;
    assert!(matches!(no_rooms, Err(AppError::Validation(_))));

    let unknown = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[("nope", 2)])).await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    // Nothing above may leave a hold behind.
    assert!(app.state.lock_store.active_holds().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_payment_confirmation_flow() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 1).await;
    let created = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    let id = created.booking.id.clone();

    let down = app.state.bookings.confirm_payment(&id, PaymentKind::Downpayment).await.unwrap();
    assert_eq!(down.booking.status, BookingStatus::Downpayment);
    assert_eq!(down.booking.reserved_until, None);
    assert_eq!(down.lines[0].room_unit_id, created.lines[0].room_unit_id);
    assert!(app.state.lock_store.peek(&id).await.unwrap().is_none());

    // Confirmed bookings stay committed long after the hold window.
    app.clock.advance(Duration::hours(3));
    let stay = StayRange::new(d("2025-09-10"), d("2025-09-12")).unwrap();
    assert_eq!(app.state.availability.available(&rt.id, &stay).await.unwrap(), 0);

    let paid = app.state.bookings.confirm_payment(&id, PaymentKind::Full).await.unwrap();
    assert_eq!(paid.booking.status, BookingStatus::Paid);

    let again = app.state.bookings.confirm_payment(&id, PaymentKind::Downpayment).await;
    assert!(matches!(again, Err(AppError::InvalidTransition { .. })));

    assert_eq!(app.notifier.wait_for(&id, "payment_confirmed", 2).await, 2);
}

#[tokio::test]
async fn test_confirm_reassigns_a_unit_taken_while_lapsed() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 2).await;

    let slow = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    app.clock.advance(Duration::minutes(20));

    // The lapsed booking no longer occupies its unit, so the next guest gets it.
    let fast = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    assert_eq!(fast.lines[0].room_unit_id, slow.lines[0].room_unit_id);

    // Payment for the lapsed booking still lands; it is moved to the remaining unit.
    let confirmed = app.state.bookings.confirm_payment(&slow.booking.id, PaymentKind::Full).await.unwrap();
    assert!(confirmed.lines[0].room_unit_id.is_some());
    assert_ne!(confirmed.lines[0].room_unit_id, fast.lines[0].room_unit_id);
}

#[tokio::test]
async fn test_cancel_and_fail_transitions() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 1).await;
    let stay = StayRange::new(d("2025-09-10"), d("2025-09-12")).unwrap();

    let first = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    let cancelled = app.state.bookings.cancel(&first.booking.id, "guest changed plans").await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.status_reason.as_deref(), Some("guest changed plans"));

    let lines = app.state.booking_repo.lines_for_booking(&first.booking.id).await.unwrap();
    assert!(lines[0].room_unit_id.is_none());
    assert_eq!(lines[0].released_unit_id, first.lines[0].room_unit_id);
    assert_eq!(app.state.availability.available(&rt.id, &stay).await.unwrap(), 1);

    let second = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    let failed = app.state.bookings.mark_failed(&second.booking.id, "card declined").await.unwrap();
    assert_eq!(failed.status, BookingStatus::Failed);
    assert!(matches!(
        app.state.bookings.mark_failed(&second.booking.id, "again").await,
        Err(AppError::InvalidTransition { .. })
    ));
    let closed = app.state.bookings.cancel(&second.booking.id, "abandoned").await.unwrap();
    assert_eq!(closed.status, BookingStatus::Cancelled);

    let third = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    app.state.bookings.confirm_payment(&third.booking.id, PaymentKind::Full).await.unwrap();
    assert!(matches!(
        app.state.bookings.cancel(&third.booking.id, "too late").await,
        Err(AppError::InvalidTransition { .. })
    ));

    assert!(matches!(app.state.bookings.cancel("missing", "x").await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_expiry_sweep_is_idempotent() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 2).await;

    let lapsed = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    app.clock.advance(Duration::minutes(10));
    let fresh = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    app.clock.advance(Duration::minutes(10));

    let sweep = app.state.bookings.expire_stale().await.unwrap();
    assert_eq!(sweep.expired, 1);

    let expired = app.state.booking_repo.find_by_id(&lapsed.booking.id).await.unwrap().unwrap();
    assert_eq!(expired.status, BookingStatus::Cancelled);
    assert_eq!(expired.status_reason.as_deref(), Some("expired"));
    let still = app.state.booking_repo.find_by_id(&fresh.booking.id).await.unwrap().unwrap();
    assert_eq!(still.status, BookingStatus::Pending);

    let repeat = app.state.bookings.expire_stale().await.unwrap();
    assert_eq!(repeat.expired, 0);
    assert_eq!(app.notifier.wait_for(&lapsed.booking.id, "expired", 1).await, 1);
}

#[tokio::test]
async fn test_expiry_respects_payments() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 3).await;

    let with_proof = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    app.state.bookings.record_payment(&with_proof.booking.id, 2500, ProofStatus::Pending).await.unwrap();

    let rejected = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    let payment = app.state.bookings.record_payment(&rejected.booking.id, 2500, ProofStatus::Pending).await.unwrap();

    app.clock.advance(Duration::minutes(20));
    let reviewed = app.state.bookings.review_payment(&payment.id, ProofStatus::Rejected).await.unwrap();
    assert!(reviewed.proof_rejected_at.is_some());

    // Open proof and a fresh rejection both keep the booking alive.
    assert_eq!(app.state.bookings.expire_stale().await.unwrap().expired, 0);
    let stay = StayRange::new(d("2025-09-10"), d("2025-09-12")).unwrap();
    assert_eq!(app.state.availability.available(&rt.id, &stay).await.unwrap(), 1);

    // Grace runs from the rejection, not from creation.
    app.clock.advance(Duration::hours(23));
    assert_eq!(app.state.bookings.expire_stale().await.unwrap().expired, 0);
    app.clock.advance(Duration::hours(2));
    assert_eq!(app.state.bookings.expire_stale().await.unwrap().expired, 1);

    let after = app.state.booking_repo.find_by_id(&rejected.booking.id).await.unwrap().unwrap();
    assert_eq!(after.status, BookingStatus::Cancelled);
    let kept = app.state.booking_repo.find_by_id(&with_proof.booking.id).await.unwrap().unwrap();
    assert_eq!(kept.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_payment_recording_rules() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 1).await;
    let created = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();

    assert!(matches!(
        app.state.bookings.record_payment(&created.booking.id, 0, ProofStatus::Pending).await,
        Err(AppError::Validation(_))
    ));

    app.state.bookings.cancel(&created.booking.id, "changed plans").await.unwrap();
    assert!(matches!(
        app.state.bookings.record_payment(&created.booking.id, 1000, ProofStatus::Pending).await,
        Err(AppError::InvalidTransition { .. })
    ));
    assert!(matches!(
        app.state.bookings.review_payment("missing", ProofStatus::Approved).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_grace_runs_from_the_latest_rejection() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 1).await;
    let stay = StayRange::new(d("2025-09-10"), d("2025-09-12")).unwrap();

    let created = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();
    let id = created.booking.id.clone();
    let first = app.state.bookings.record_payment(&id, 2500, ProofStatus::Pending).await.unwrap();
    let second = app.state.bookings.record_payment(&id, 2500, ProofStatus::Pending).await.unwrap();

    app.clock.advance(Duration::minutes(20));
    app.state.bookings.review_payment(&first.id, ProofStatus::Rejected).await.unwrap();
    app.clock.advance(Duration::hours(5));
    app.state.bookings.review_payment(&second.id, ProofStatus::Rejected).await.unwrap();

    // Past the first rejection's grace, inside the second's.
    app.clock.advance(Duration::hours(20));
    assert_eq!(app.state.bookings.expire_stale().await.unwrap().expired, 0);
    assert_eq!(app.state.availability.available(&rt.id, &stay).await.unwrap(), 0);

    app.clock.advance(Duration::hours(5));
    assert_eq!(app.state.availability.available(&rt.id, &stay).await.unwrap(), 1);
    assert_eq!(app.state.bookings.expire_stale().await.unwrap().expired, 1);
    let after = app.state.booking_repo.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(after.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_expiry_reaches_past_a_full_batch_of_live_bookings() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 10).await;

    let mut waiting = Vec::new();
    for night in 0..21 {
        let check_in = d("2025-09-10") + Duration::days(night);
        let check_out = check_in + Duration::days(1);
        let (check_in, check_out) = (check_in.to_string(), check_out.to_string());
        for _ in 0..10 {
            let created = app.state.bookings.create(booking_request(&check_in, &check_out, &[(&rt.id, 2)])).await.unwrap();
            app.state.bookings.record_payment(&created.booking.id, 2500, ProofStatus::Pending).await.unwrap();
            waiting.push(created.booking.id);
        }
    }

    app.clock.advance(Duration::minutes(1));
    let abandoned = app.state.bookings.create(booking_request("2025-10-15", "2025-10-16", &[(&rt.id, 2)])).await.unwrap();
    app.clock.advance(Duration::minutes(31));

    let sweep = app.state.bookings.expire_stale().await.unwrap();
    assert_eq!(sweep.expired, 1);
    assert_eq!(sweep.examined, 1);

    let after = app.state.booking_repo.find_by_id(&abandoned.booking.id).await.unwrap().unwrap();
    assert_eq!(after.status, BookingStatus::Cancelled);
    let first = app.state.booking_repo.find_by_id(&waiting[0]).await.unwrap().unwrap();
    assert_eq!(first.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_mail_outage_does_not_hold_up_transitions() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 1).await;
    let created = app.state.bookings.create(booking_request("2025-09-10", "2025-09-12", &[(&rt.id, 2)])).await.unwrap();

    app.notifier.simulate_outage(std::time::Duration::from_secs(3));
    let started = std::time::Instant::now();
    let cancelled = app.state.bookings.cancel(&created.booking.id, "guest changed plans").await.unwrap();

    assert!(started.elapsed() < std::time::Duration::from_secs(1));
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(app.notifier.sent().is_empty());
}
