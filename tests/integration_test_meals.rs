mod common;

use common::{booking_request, d, TestApp};
use chrono::Duration;
use resort_booking::domain::models::meal::{
    MealCalendarOverride, MealFallback, MealNight, MealPricingTier, MealProgram, NewTierParams, ScopeType,
};
use resort_booking::domain::ports::Clock;
use resort_booking::domain::services::calendar::ResolutionSource;

#[tokio::test]
async fn test_date_override_inside_date_range_program() {
    let app = TestApp::new().await;
    let program = app.seed_program(app.date_range_program("2025-10-01", "2025-10-31")).await;
    app.state.meal_repo
        .upsert_override(&MealCalendarOverride::for_date(program.id.clone(), d("2025-10-15"), false))
        .await
        .unwrap();

    let off = app.state.calendar.is_buffet_active(d("2025-10-15")).await.unwrap();
    assert!(!off.buffet_active);
    assert_eq!(off.source, ResolutionSource::DateOverride);
    assert_eq!(off.label.as_deref(), Some("Free breakfast"));

    let on = app.state.calendar.is_buffet_active(d("2025-10-16")).await.unwrap();
    assert!(on.buffet_active);
    assert_eq!(on.source, ResolutionSource::BaseScope);

    let outside = app.state.calendar.is_buffet_active(d("2025-11-01")).await.unwrap();
    assert!(!outside.buffet_active);
}

#[tokio::test]
async fn test_override_upsert_replaces_and_precedence_holds() {
    let app = TestApp::new().await;
    let program = app.seed_program(app.date_range_program("2025-10-01", "2025-10-31")).await;

    let first = app.state.meal_repo
        .upsert_override(&MealCalendarOverride::for_month(program.id.clone(), 2025, 11, false))
        .await
        .unwrap();
    let second = app.state.meal_repo
        .upsert_override(&MealCalendarOverride::for_month(program.id.clone(), 2025, 11, true))
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert!(second.is_active);

    app.state.meal_repo
        .upsert_override(&MealCalendarOverride::for_date(program.id.clone(), d("2025-11-05"), false))
        .await
        .unwrap();

    let resolution = app.state.calendar.classify_range(d("2025-10-31"), d("2025-11-06")).await.unwrap();
    assert_eq!(resolution.days.len(), 7);
    assert!(resolution.diagnostic.is_none());

    let by_date = |s: &str| resolution.days.iter().find(|day| day.date == d(s)).unwrap().clone();
    assert_eq!(by_date("2025-10-31").source, ResolutionSource::BaseScope);
    assert!(by_date("2025-11-04").buffet_active);
    assert_eq!(by_date("2025-11-04").source, ResolutionSource::MonthOverride);
    assert!(!by_date("2025-11-05").buffet_active);
    assert_eq!(by_date("2025-11-05").source, ResolutionSource::DateOverride);
}

#[tokio::test]
async fn test_latest_active_program_wins() {
    let app = TestApp::new().await;
    let older = app.seed_program(MealProgram::new("Weekends".into(), ScopeType::Weekly, app.clock.now())).await;
    app.clock.advance(Duration::hours(1));
    let newer = app.seed_program(MealProgram::new("Always on".into(), ScopeType::Always, app.clock.now())).await;

    let resolution = app.state.calendar.classify_range(d("2025-10-06"), d("2025-10-06")).await.unwrap();
    assert_eq!(resolution.days[0].program_id.as_deref(), Some(newer.id.as_str()));
    assert!(resolution.days[0].buffet_active);

    let diagnostic = resolution.diagnostic.unwrap();
    assert_eq!(diagnostic.chosen_program_id, newer.id);
    assert_eq!(diagnostic.competing_program_ids, vec![older.id]);
}

#[tokio::test]
async fn test_no_program_means_free_breakfast() {
    let app = TestApp::new().await;
    let day = app.state.calendar.is_buffet_active(d("2025-10-06")).await.unwrap();
    assert!(!day.buffet_active);
    assert_eq!(day.source, ResolutionSource::NoActiveProgram);
}

#[tokio::test]
async fn test_tier_lookup_prefers_windows_then_falls_back() {
    let app = TestApp::new().await;
    let program = app.seed_program(MealProgram::new("Always on".into(), ScopeType::Always, app.clock.now())).await;

    let base = app.state.meal_repo.create_tier(&MealPricingTier::new(NewTierParams {
        program_id: program.id.clone(),
        name: "base".into(),
        effective_from: Some(d("2025-01-01")),
        effective_to: None,
        adult_buffet_price: 700,
        child_buffet_price: 350,
        extra_guest_breakfast_price: 200,
    })).await.unwrap();
    let holiday = app.state.meal_repo.create_tier(&MealPricingTier::new(NewTierParams {
        program_id: program.id.clone(),
        name: "holiday".into(),
        effective_from: Some(d("2025-12-20")),
        effective_to: Some(d("2026-01-05")),
        adult_buffet_price: 1200,
        child_buffet_price: 600,
        extra_guest_breakfast_price: 300,
    })).await.unwrap();

    let tier = |date: &str| {
        let tiers = app.state.tiers.clone();
        let program_id = program.id.clone();
        let date = d(date);
        async move { tiers.tier_for(&program_id, date).await.unwrap().map(|t| t.id) }
    };

    assert_eq!(tier("2025-12-25").await, Some(holiday.id.clone()));
    assert_eq!(tier("2025-10-01").await, Some(base.id.clone()));
    // After the holiday window closes the newest started tier applies again.
    assert_eq!(tier("2026-01-10").await, Some(base.id.clone()));
    assert_eq!(tier("2024-06-01").await, None);

    let conflicts = app.state.tiers.window_conflicts(&program.id).await.unwrap();
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].open_ended);
}

#[tokio::test]
async fn test_booking_includes_meal_quote() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 1).await;
    let program = app.seed_program(app.date_range_program("2025-10-01", "2025-10-31")).await;
    app.seed_tier(&program.id, 800, 400, 250).await;
    app.state.meal_repo
        .upsert_override(&MealCalendarOverride::for_date(program.id.clone(), d("2025-10-15"), false))
        .await
        .unwrap();

    // Three guests in a room that includes breakfast for two.
    let created = app.state.bookings
        .create(booking_request("2025-10-14", "2025-10-17", &[(&rt.id, 3)]))
        .await
        .unwrap();
    let quote = created.booking.meal_quote.as_ref().unwrap().0.clone();

    assert_eq!(quote.nights.len(), 3);
    assert!(quote.nights[0].is_buffet());
    assert!(!quote.nights[1].is_buffet());
    assert!(quote.nights[2].is_buffet());
    assert_eq!(quote.nights[1].charge(), 250);
    assert_eq!(quote.total, 3 * 800 + 250 + 3 * 800);
    assert_eq!(created.booking.meal_total, quote.total);
    assert_eq!(created.booking.total_price, created.booking.room_subtotal + quote.total);
}

#[tokio::test]
async fn test_missing_tier_is_free_with_fallback() {
    let app = TestApp::new().await;
    let rt = app.seed_room_type("Deluxe", 2, 5000, 1).await;
    app.seed_program(app.date_range_program("2025-10-01", "2025-10-31")).await;

    let created = app.state.bookings
        .create(booking_request("2025-10-14", "2025-10-15", &[(&rt.id, 2)]))
        .await
        .unwrap();
    let quote = created.booking.meal_quote.as_ref().unwrap().0.clone();

    assert_eq!(quote.total, 0);
    assert!(matches!(
        quote.nights[0],
        MealNight::FreeBreakfast { fallback: Some(MealFallback::NoPricingTier), .. }
    ));
}
