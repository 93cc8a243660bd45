use std::sync::Arc;
use crate::config::{BookingPolicy, Config};
use crate::domain::ports::{
    BookingRepository, Clock, DiscountProvider, MealRepository, NotificationService,
    PaymentRepository, ReservationLockStore, RoomRepository,
};
use crate::domain::services::{
    availability::AvailabilityEngine,
    booking_service::{BookingDeps, BookingService},
    calendar::CalendarResolver,
    meal_quote::MealQuoteService,
    pricing_tier::PricingTierResolver,
};

/// Storage adapters for one database backend.
#[derive(Clone)]
pub struct Repositories {
    pub rooms: Arc<dyn RoomRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub meals: Arc<dyn MealRepository>,
}

/// Adapters that talk to things outside the database.
pub struct Adapters {
    pub lock_store: Arc<dyn ReservationLockStore>,
    pub notifier: Arc<dyn NotificationService>,
    pub discounts: Arc<dyn DiscountProvider>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub policy: BookingPolicy,
    pub room_repo: Arc<dyn RoomRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub meal_repo: Arc<dyn MealRepository>,
    pub lock_store: Arc<dyn ReservationLockStore>,
    pub clock: Arc<dyn Clock>,
    pub availability: Arc<AvailabilityEngine>,
    pub bookings: Arc<BookingService>,
    pub calendar: Arc<CalendarResolver>,
    pub tiers: Arc<PricingTierResolver>,
    pub meals: Arc<MealQuoteService>,
}

impl AppState {
    pub fn assemble(config: Config, repos: Repositories, adapters: Adapters) -> Self {
        let policy = config.booking_policy();

        let availability = Arc::new(AvailabilityEngine::new(
            repos.rooms.clone(),
            repos.bookings.clone(),
            adapters.lock_store.clone(),
            adapters.clock.clone(),
            policy,
        ));
        let calendar = Arc::new(CalendarResolver::new(repos.meals.clone()));
        let tiers = Arc::new(PricingTierResolver::new(repos.meals.clone()));
        let meals = Arc::new(MealQuoteService::new(calendar.clone(), tiers.clone()));

        let bookings = Arc::new(BookingService::new(
            BookingDeps {
                room_repo: repos.rooms.clone(),
                booking_repo: repos.bookings.clone(),
                payment_repo: repos.payments.clone(),
                lock_store: adapters.lock_store.clone(),
                notifier: adapters.notifier,
                discounts: adapters.discounts,
                clock: adapters.clock.clone(),
                availability: availability.clone(),
                meals: meals.clone(),
            },
            policy,
        ));

        Self {
            config,
            policy,
            room_repo: repos.rooms,
            booking_repo: repos.bookings,
            payment_repo: repos.payments,
            meal_repo: repos.meals,
            lock_store: adapters.lock_store,
            clock: adapters.clock,
            availability,
            bookings,
            calendar,
            tiers,
            meals,
        }
    }
}
