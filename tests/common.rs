use resort_booking::{
    api::router::create_router,
    config::Config,
    domain::models::{
        booking::{Booking, RoomLineRequest},
        meal::{MealPricingTier, MealProgram, NewTierParams, ScopeType},
        room::{NewRoomTypeParams, RoomType, RoomUnit},
    },
    domain::ports::{Clock, NotificationService},
    domain::services::booking_service::NewBooking,
    error::AppError,
    infra::{
        clock::ManualClock,
        discount::NoDiscount,
        factory::connect_repositories,
        lock_store::memory::InMemoryLockStore,
    },
    state::{Adapters, AppState},
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

/// Captures every notification instead of calling the mail service.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    outage: Mutex<Option<Duration>>,
}

impl RecordingNotifier {
    #[allow(dead_code)]
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn count_for(&self, booking_id: &str, reason: &str) -> usize {
        self.sent().iter().filter(|(id, r)| id == booking_id && r == reason).count()
    }

    /// Notifications go out on detached tasks; polls until `expected` arrived or a second passed.
    #[allow(dead_code)]
    pub async fn wait_for(&self, booking_id: &str, reason: &str, expected: usize) -> usize {
        for _ in 0..100 {
            if self.count_for(booking_id, reason) >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.count_for(booking_id, reason)
    }

    /// Every later send hangs for `delay` and then fails, like an unreachable mail service.
    #[allow(dead_code)]
    pub fn simulate_outage(&self, delay: Duration) {
        *self.outage.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl NotificationService for RecordingNotifier {
    async fn notify(&self, booking: &Booking, reason: &str) -> Result<(), AppError> {
        let outage = *self.outage.lock().unwrap();
        if let Some(delay) = outage {
            tokio::time::sleep(delay).await;
            return Err(AppError::InternalWithMsg("mail service unreachable".into()));
        }
        self.sent.lock().unwrap().push((booking.id.clone(), reason.to_string()));
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
}

/// 2025-09-01 10:00 at the resort (Asia/Manila).
#[allow(dead_code)]
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 2, 0, 0).unwrap()
}

#[allow(dead_code)]
pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            redis_url: None,
            notification_url: "http://localhost".to_string(),
            notification_token: "token".to_string(),
            hold_ttl_overnight_minutes: 15,
            hold_ttl_day_tour_minutes: 120,
            payment_grace_hours: 24,
            sweep_interval_secs: 60,
            timezone: chrono_tz::Asia::Manila,
        };

        let repos = connect_repositories(&db_url).await.expect("Failed to set up test db");

        let clock = Arc::new(ManualClock::new(start_time()));
        let notifier = Arc::new(RecordingNotifier::default());
        let shared_clock: Arc<dyn Clock> = clock.clone();

        let state = Arc::new(AppState::assemble(
            config,
            repos,
            Adapters {
                lock_store: Arc::new(InMemoryLockStore::new(shared_clock.clone())),
                notifier: notifier.clone(),
                discounts: Arc::new(NoDiscount),
                clock: shared_clock,
            },
        ));

        let router = create_router(state.clone());

        Self { router, db_filename, state, clock, notifier }
    }

    /// Creates a room type with `units` allocatable units numbered from 101.
    pub async fn seed_room_type(&self, name: &str, max_guests: i32, price_per_night: i64, units: i32) -> RoomType {
        let room_type = self.state.room_repo.create_room_type(&RoomType::new(NewRoomTypeParams {
            name: name.to_string(),
            max_guests,
            extra_guests: Some(1),
            price_per_night,
            extra_guest_fee: 500,
            day_tour_price: Some(price_per_night / 2),
        })).await.unwrap();

        for n in 0..units {
            self.state.room_repo.create_unit(&RoomUnit::new(room_type.id.clone(), 101 + n)).await.unwrap();
        }
        room_type
    }

    pub async fn unit_numbers(&self, room_type_id: &str) -> std::collections::HashMap<String, i32> {
        self.state.room_repo.list_units(room_type_id).await.unwrap()
            .into_iter()
            .map(|u| (u.id, u.unit_number))
            .collect()
    }

    pub async fn seed_program(&self, program: MealProgram) -> MealProgram {
        self.state.meal_repo.create_program(&program).await.unwrap()
    }

    pub async fn seed_tier(&self, program_id: &str, adult: i64, child: i64, extra_breakfast: i64) -> MealPricingTier {
        self.state.meal_repo.create_tier(&MealPricingTier::new(NewTierParams {
            program_id: program_id.to_string(),
            name: "standard".to_string(),
            effective_from: None,
            effective_to: None,
            adult_buffet_price: adult,
            child_buffet_price: child,
            extra_guest_breakfast_price: extra_breakfast,
        })).await.unwrap()
    }

    pub fn date_range_program(&self, start: &str, end: &str) -> MealProgram {
        let mut program = MealProgram::new("Buffet season".into(), ScopeType::DateRange, self.clock.now());
        program.date_start = Some(d(start));
        program.date_end = Some(d(end));
        program.inactive_label = Some("Free breakfast".into());
        program
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.router.clone().oneshot(
            Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
        ).await.unwrap()
    }

    pub async fn send_json(&self, method: &str, uri: &str, payload: Value) -> Response {
        self.router.clone().oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap()
    }
}

#[allow(dead_code)]
pub fn booking_request(check_in: &str, check_out: &str, rooms: &[(&str, i32)]) -> NewBooking {
    NewBooking {
        guest_name: "Maria Santos".to_string(),
        guest_email: "maria@example.com".to_string(),
        check_in: d(check_in),
        check_out: d(check_out),
        check_in_time: None,
        check_out_time: None,
        rooms: rooms
            .iter()
            .map(|(room_type_id, adults)| RoomLineRequest { room_type_id: room_type_id.to_string(), adults: *adults, children: 0 })
            .collect(),
        promo_code: None,
    }
}

#[allow(dead_code)]
pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
