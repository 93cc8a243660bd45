use crate::domain::models::{booking::BookingRoomLine, room::RoomUnit, stay::StayRange};
use crate::domain::ports::BookingTx;
use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Lowest-numbered unit that is neither occupied nor already claimed.
pub fn pick_unit<'a>(
    units: &'a [RoomUnit],
    occupied: &HashSet<String>,
    claimed: &HashSet<String>,
) -> Option<&'a RoomUnit> {
    units
        .iter()
        .filter(|u| u.is_allocatable())
        .filter(|u| !occupied.contains(&u.id) && !claimed.contains(&u.id))
        .min_by_key(|u| u.unit_number)
}

/// Chooses concrete units inside an open [`BookingTx`]. Every read goes through the
/// transaction after the unit rows are locked, so concurrent callers serialize on them.
#[derive(Debug, Clone, Copy)]
pub struct UnitAllocator {
    grace: Duration,
}

impl UnitAllocator {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    /// Units held by occupying lines that overlap `stay`.
    pub async fn occupied_units(
        &self,
        tx: &mut dyn BookingTx,
        room_type_id: &str,
        stay: &StayRange,
        exclude_booking: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<HashSet<String>, AppError> {
        let lines = tx.overlapping_lines(room_type_id, stay, exclude_booking).await?;
        Ok(lines
            .into_iter()
            .filter(|l| l.is_occupying(now, self.grace))
            .filter_map(|l| l.room_unit_id)
            .collect())
    }

    /// Locks the room type's units and returns the first free one, or `None`.
    pub async fn assign_unit(
        &self,
        tx: &mut dyn BookingTx,
        room_type_id: &str,
        stay: &StayRange,
        exclude_booking: Option<&str>,
        claimed: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<RoomUnit>, AppError> {
        let units = tx.lock_units(room_type_id).await?;
        let occupied = self.occupied_units(tx, room_type_id, stay, exclude_booking, now).await?;
        Ok(pick_unit(&units, &occupied, claimed).cloned())
    }

    /// Gives every line a unit that is free for `stay`.
    ///
    /// Lines keep their current unit when it is still allocatable and unclaimed by
    /// anybody else; the rest get the lowest free unit of their type. Returns the ids of
    /// lines that could not be given a unit (they are left with `room_unit_id = None`).
    /// Nothing is written; callers persist the lines.
    pub async fn reconcile(
        &self,
        tx: &mut dyn BookingTx,
        stay: &StayRange,
        exclude_booking: Option<&str>,
        lines: &mut [BookingRoomLine],
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, AppError> {
        // sorted so concurrent transactions lock room types in the same order
        let room_type_ids: BTreeSet<String> = lines.iter().map(|l| l.room_type_id.clone()).collect();

        let mut pools: HashMap<String, (Vec<RoomUnit>, HashSet<String>)> = HashMap::new();
        for room_type_id in room_type_ids {
            let units = tx.lock_units(&room_type_id).await?;
            let occupied = self.occupied_units(tx, &room_type_id, stay, exclude_booking, now).await?;
            pools.insert(room_type_id, (units, occupied));
        }

        let mut claimed = HashSet::new();
        for line in lines.iter_mut() {
            let Some(unit_id) = line.room_unit_id.take() else { continue };
            let Some((units, occupied)) = pools.get(&line.room_type_id) else { continue };

            let still_free = units.iter().any(|u| u.id == unit_id) && !occupied.contains(&unit_id);
            if still_free && claimed.insert(unit_id.clone()) {
                line.room_unit_id = Some(unit_id);
            } else {
                debug!("Unit {} no longer free for line {}", unit_id, line.id);
            }
        }

        let mut unassigned = Vec::new();
        for line in lines.iter_mut().filter(|l| l.room_unit_id.is_none()) {
            let picked = pools
                .get(&line.room_type_id)
                .and_then(|(units, occupied)| pick_unit(units, occupied, &claimed));

            match picked {
                Some(unit) => {
                    claimed.insert(unit.id.clone());
                    line.room_unit_id = Some(unit.id.clone());
                }
                None => unassigned.push(line.id.clone()),
            }
        }

        Ok(unassigned)
    }
}
