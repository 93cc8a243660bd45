use std::env;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use crate::domain::models::booking::BookingType;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Lock store backend; the in-memory store is used when unset.
    pub redis_url: Option<String>,
    pub notification_url: String,
    pub notification_token: String,
    pub hold_ttl_overnight_minutes: i64,
    pub hold_ttl_day_tour_minutes: i64,
    /// How long a guest may resubmit after the last rejected payment proof.
    pub payment_grace_hours: i64,
    pub sweep_interval_secs: u64,
    pub timezone: Tz,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://resort.db".to_string()),
            port: parse_or("PORT", 3000),
            redis_url: env::var("REDIS_URL").ok().filter(|u| !u.is_empty()),
            notification_url: env::var("NOTIFICATION_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            notification_token: env::var("NOTIFICATION_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            hold_ttl_overnight_minutes: parse_or("HOLD_TTL_OVERNIGHT_MINUTES", 15),
            hold_ttl_day_tour_minutes: parse_or("HOLD_TTL_DAY_TOUR_MINUTES", 120),
            payment_grace_hours: parse_or("PAYMENT_GRACE_HOURS", 24),
            sweep_interval_secs: parse_or("SWEEP_INTERVAL_SECS", 60),
            timezone: env::var("RESORT_TIMEZONE").ok().and_then(|tz| tz.parse().ok()).unwrap_or(chrono_tz::Asia::Manila),
        }
    }

    pub fn booking_policy(&self) -> BookingPolicy {
        BookingPolicy {
            overnight_hold: Duration::minutes(self.hold_ttl_overnight_minutes),
            day_tour_hold: Duration::minutes(self.hold_ttl_day_tour_minutes),
            payment_grace: Duration::hours(self.payment_grace_hours),
            timezone: self.timezone,
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Timing knobs shared by the availability read path and the booking state machine.
#[derive(Debug, Clone, Copy)]
pub struct BookingPolicy {
    pub overnight_hold: Duration,
    pub day_tour_hold: Duration,
    pub payment_grace: Duration,
    pub timezone: Tz,
}

impl BookingPolicy {
    pub fn hold_for(&self, booking_type: BookingType) -> Duration {
        match booking_type {
            BookingType::Overnight => self.overnight_hold,
            BookingType::DayTour => self.day_tour_hold,
        }
    }

    /// Calendar date at the resort for `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            overnight_hold: Duration::minutes(15),
            day_tour_hold: Duration::minutes(120),
            payment_grace: Duration::hours(24),
            timezone: chrono_tz::Asia::Manila,
        }
    }
}
