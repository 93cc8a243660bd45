use crate::config::BookingPolicy;
use crate::domain::models::{
    booking::{BookingStatus, HoldPayload, LineOccupancy},
    stay::StayRange,
};
use crate::domain::ports::{BookingRepository, Clock, ReservationLockStore, RoomRepository};
use crate::error::AppError;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailabilitySnapshot {
    pub total_units: u32,
    pub committed: u32,
    pub locked: u32,
    pub available: u32,
}

impl AvailabilitySnapshot {
    fn new(total_units: u32, committed: u32, locked: u32) -> Self {
        Self {
            total_units,
            committed,
            locked,
            available: total_units.saturating_sub(committed).saturating_sub(locked),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyAvailability {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub snapshot: AvailabilitySnapshot,
}

/// Inputs of one availability question, already fetched from the database and lock store.
pub struct Tally<'a> {
    pub room_type_id: &'a str,
    pub total_units: u32,
    pub lines: &'a [LineOccupancy],
    pub holds: &'a [HoldPayload],
    /// Current status of every held booking that has a row.
    pub statuses: &'a HashMap<String, BookingStatus>,
    pub exclude_booking: Option<&'a str>,
    pub now: DateTime<Utc>,
    pub grace: Duration,
}

impl Tally<'_> {
    /// Counts committed lines and in-flight holds over `query`.
    ///
    /// A hold only counts when its booking is not persisted yet or still pending, and when
    /// that booking was not already counted from its own occupying lines.
    pub fn over(&self, query: &StayRange) -> AvailabilitySnapshot {
        let mut committed = 0u32;
        let mut counted_bookings = HashSet::new();
        for line in self.lines.iter().filter(|l| l.overlaps(query)) {
            if self.exclude_booking == Some(line.booking_id.as_str()) {
                continue;
            }
            if line.is_occupying(self.now, self.grace) {
                committed += 1;
                counted_bookings.insert(line.booking_id.as_str());
            }
        }

        let locked = self
            .holds
            .iter()
            .filter(|h| self.exclude_booking != Some(h.booking_id.as_str()))
            .filter(|h| !counted_bookings.contains(h.booking_id.as_str()))
            .filter(|h| {
                self.statuses
                    .get(&h.booking_id)
                    .is_none_or(|s| *s == BookingStatus::Pending)
            })
            .map(|h| h.overlapping_count(self.room_type_id, query))
            .sum();

        AvailabilitySnapshot::new(self.total_units, committed, locked)
    }
}

/// Read path answering "how many units of this type are free for these dates".
/// Consults committed rows and the lock store on every call.
pub struct AvailabilityEngine {
    room_repo: Arc<dyn RoomRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    lock_store: Arc<dyn ReservationLockStore>,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
}

impl AvailabilityEngine {
    pub fn new(
        room_repo: Arc<dyn RoomRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        lock_store: Arc<dyn ReservationLockStore>,
        clock: Arc<dyn Clock>,
        policy: BookingPolicy,
    ) -> Self {
        Self { room_repo, booking_repo, lock_store, clock, policy }
    }

    pub async fn available(&self, room_type_id: &str, stay: &StayRange) -> Result<u32, AppError> {
        Ok(self.snapshot(room_type_id, stay, None).await?.available)
    }

    /// Availability as seen by `booking_id` itself, used when moving or resizing it.
    pub async fn available_excluding(&self, room_type_id: &str, stay: &StayRange, booking_id: &str) -> Result<u32, AppError> {
        Ok(self.snapshot(room_type_id, stay, Some(booking_id)).await?.available)
    }

    pub async fn snapshot(&self, room_type_id: &str, stay: &StayRange, exclude_booking: Option<&str>) -> Result<AvailabilitySnapshot, AppError> {
        let inputs = self.gather(room_type_id, stay, exclude_booking).await?;
        let snapshot = inputs.tally(self, room_type_id, exclude_booking).over(stay);
        debug!(
            "Availability {} {}..{}: {:?}",
            room_type_id, stay.start, stay.end, snapshot
        );
        Ok(snapshot)
    }

    /// One entry per calendar day in `[from, to]`, each answering for that single night.
    pub async fn daily(&self, room_type_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyAvailability>, AppError> {
        StayRange::new(from, to)?;
        let span = StayRange::new(from, to + Duration::days(1))?;
        let inputs = self.gather(room_type_id, &span, None).await?;
        let tally = inputs.tally(self, room_type_id, None);

        Ok(span
            .occupied_dates()
            .into_iter()
            .map(|date| DailyAvailability {
                date,
                snapshot: tally.over(&StayRange::single_day(date)),
            })
            .collect())
    }

    async fn gather(&self, room_type_id: &str, stay: &StayRange, exclude_booking: Option<&str>) -> Result<Gathered, AppError> {
        if self.room_repo.find_room_type(room_type_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Room type {} not found", room_type_id)));
        }

        let total_units = self.room_repo.count_allocatable_units(room_type_id).await?;
        let lines = self.booking_repo.overlapping_lines(room_type_id, stay, exclude_booking).await?;

        let holds: Vec<HoldPayload> = self
            .lock_store
            .active_holds()
            .await?
            .into_iter()
            .filter(|h| h.overlapping_count(room_type_id, stay) > 0)
            .collect();

        let held_ids: Vec<String> = holds.iter().map(|h| h.booking_id.clone()).collect();
        let statuses = if held_ids.is_empty() {
            HashMap::new()
        } else {
            self.booking_repo.statuses(&held_ids).await?
        };

        Ok(Gathered {
            total_units: u32::try_from(total_units).unwrap_or(0),
            lines,
            holds,
            statuses,
            now: self.clock.now(),
        })
    }
}

struct Gathered {
    total_units: u32,
    lines: Vec<LineOccupancy>,
    holds: Vec<HoldPayload>,
    statuses: HashMap<String, BookingStatus>,
    now: DateTime<Utc>,
}

impl Gathered {
    fn tally<'a>(&'a self, engine: &AvailabilityEngine, room_type_id: &'a str, exclude_booking: Option<&'a str>) -> Tally<'a> {
        Tally {
            room_type_id,
            total_units: self.total_units,
            lines: &self.lines,
            holds: &self.holds,
            statuses: &self.statuses,
            exclude_booking,
            now: self.now,
            grace: engine.policy.payment_grace,
        }
    }
}
