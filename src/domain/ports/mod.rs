use crate::domain::models::{
    booking::{Booking, BookingRoomLine, BookingStatus, HoldPayload, LineOccupancy},
    meal::{MealCalendarOverride, MealPricingTier, MealProgram},
    payment::{Payment, ProofStatus},
    room::{RoomType, RoomUnit, UnitStatus},
    stay::StayRange,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::time::Duration;

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn create_room_type(&self, room_type: &RoomType) -> Result<RoomType, AppError>;
    async fn find_room_type(&self, id: &str) -> Result<Option<RoomType>, AppError>;
    async fn list_room_types(&self) -> Result<Vec<RoomType>, AppError>;
    async fn create_unit(&self, unit: &RoomUnit) -> Result<RoomUnit, AppError>;
    async fn list_units(&self, room_type_id: &str) -> Result<Vec<RoomUnit>, AppError>;
    async fn count_allocatable_units(&self, room_type_id: &str) -> Result<i64, AppError>;
    async fn set_unit_status(&self, unit_id: &str, status: UnitStatus, blocked_until: Option<NaiveDate>) -> Result<RoomUnit, AppError>;
    /// Returns blocked units whose block ended before `today` to service.
    async fn release_expired_blocks(&self, today: NaiveDate) -> Result<u64, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Opens the transaction every allocation-affecting operation runs in.
    async fn begin(&self) -> Result<Box<dyn BookingTx>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Booking>, AppError>;
    async fn lines_for_booking(&self, booking_id: &str) -> Result<Vec<BookingRoomLine>, AppError>;
    async fn overlapping_lines(&self, room_type_id: &str, stay: &StayRange, exclude_booking: Option<&str>) -> Result<Vec<LineOccupancy>, AppError>;
    async fn statuses(&self, ids: &[String]) -> Result<HashMap<String, BookingStatus>, AppError>;
    /// Pending bookings whose `reserved_until` is before `now` and that have no live payment:
    /// no proof other than rejected ones, and none rejected after `grace_cutoff`. Oldest first.
    async fn find_expirable(&self, now: DateTime<Utc>, grace_cutoff: DateTime<Utc>, limit: i64) -> Result<Vec<Booking>, AppError>;
}

/// Unit of work over bookings, lines and unit rows. Dropping it without
/// `commit` rolls everything back.
#[async_trait]
pub trait BookingTx: Send {
    /// Row-locks and returns the booking.
    async fn lock_booking(&mut self, id: &str) -> Result<Option<Booking>, AppError>;
    /// Row-locks the room type's units and returns the allocatable ones by unit number.
    async fn lock_units(&mut self, room_type_id: &str) -> Result<Vec<RoomUnit>, AppError>;
    async fn overlapping_lines(&mut self, room_type_id: &str, stay: &StayRange, exclude_booking: Option<&str>) -> Result<Vec<LineOccupancy>, AppError>;
    async fn lines_for_booking(&mut self, booking_id: &str) -> Result<Vec<BookingRoomLine>, AppError>;
    async fn payments_for_booking(&mut self, booking_id: &str) -> Result<Vec<Payment>, AppError>;
    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), AppError>;
    async fn update_booking(&mut self, booking: &Booking) -> Result<(), AppError>;
    async fn insert_line(&mut self, line: &BookingRoomLine) -> Result<(), AppError>;
    async fn set_line_unit(&mut self, line_id: &str, unit_id: Option<&str>) -> Result<(), AppError>;
    /// Soft-unlinks every unit held by the booking's lines.
    async fn release_units(&mut self, booking_id: &str) -> Result<u64, AppError>;
    async fn delete_lines(&mut self, booking_id: &str) -> Result<(), AppError>;
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn record(&self, payment: &Payment) -> Result<Payment, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>, AppError>;
    async fn list_for_booking(&self, booking_id: &str) -> Result<Vec<Payment>, AppError>;
    async fn update_proof_status(&self, id: &str, status: ProofStatus, at: DateTime<Utc>) -> Result<Payment, AppError>;
}

#[async_trait]
pub trait MealRepository: Send + Sync {
    async fn create_program(&self, program: &MealProgram) -> Result<MealProgram, AppError>;
    async fn update_program(&self, program: &MealProgram) -> Result<MealProgram, AppError>;
    async fn find_program(&self, id: &str) -> Result<Option<MealProgram>, AppError>;
    /// Active programs, most recently updated first.
    async fn list_active_programs(&self) -> Result<Vec<MealProgram>, AppError>;
    async fn upsert_override(&self, entity: &MealCalendarOverride) -> Result<MealCalendarOverride, AppError>;
    /// Date overrides inside `[start, end]` plus month overrides for every month the range touches.
    async fn overrides_between(&self, program_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<MealCalendarOverride>, AppError>;
    async fn create_tier(&self, tier: &MealPricingTier) -> Result<MealPricingTier, AppError>;
    async fn list_tiers(&self, program_id: &str) -> Result<Vec<MealPricingTier>, AppError>;
}

/// TTL-native soft holds keyed by booking id. Entries vanish on their own once the
/// TTL elapses; absence always means "no hold".
#[async_trait]
pub trait ReservationLockStore: Send + Sync {
    /// Creates or overwrites the hold and restarts its TTL.
    async fn hold(&self, booking_id: &str, payload: &HoldPayload, ttl: Duration) -> Result<(), AppError>;
    async fn peek(&self, booking_id: &str) -> Result<Option<HoldPayload>, AppError>;
    /// No-op when the hold is already gone.
    async fn release(&self, booking_id: &str) -> Result<(), AppError>;
    /// Zero when the hold is missing.
    async fn remaining_ttl(&self, booking_id: &str) -> Result<Duration, AppError>;
    async fn active_holds(&self) -> Result<Vec<HoldPayload>, AppError>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn notify(&self, booking: &Booking, reason: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait DiscountProvider: Send + Sync {
    async fn discount_for(&self, promo_code: &str, subtotal: i64) -> Result<i64, AppError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
