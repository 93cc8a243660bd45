use crate::config::BookingPolicy;
use crate::domain::models::{
    booking::{Booking, BookingRoomLine, BookingStatus, BookingType, HoldPayload, NewBookingParams, RoomLineRequest},
    payment::{Payment, PaymentSummary, ProofStatus},
    room::RoomType,
    stay::StayRange,
};
use crate::domain::ports::{
    BookingRepository, Clock, DiscountProvider, NotificationService, PaymentRepository, ReservationLockStore,
    RoomRepository,
};
use crate::domain::services::allocator::UnitAllocator;
use crate::domain::services::availability::AvailabilityEngine;
use crate::domain::services::meal_quote::{MealQuoteService, Party};
use crate::domain::services::pricing::{line_price, BookingTotals};
use crate::error::AppError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info, warn};

const EXPIRY_BATCH: i64 = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub guest_name: String,
    pub guest_email: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub check_in_time: Option<NaiveTime>,
    pub check_out_time: Option<NaiveTime>,
    pub rooms: Vec<RoomLineRequest>,
    pub promo_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Downpayment,
    Full,
}

impl PaymentKind {
    fn target(self) -> BookingStatus {
        match self {
            PaymentKind::Downpayment => BookingStatus::Downpayment,
            PaymentKind::Full => BookingStatus::Paid,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub lines: Vec<BookingRoomLine>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpirySweep {
    pub examined: usize,
    pub expired: usize,
    pub failed: usize,
}

/// Room types and per-line prices for a set of requested rooms.
struct PricedRooms {
    room_types: HashMap<String, RoomType>,
    lines: Vec<(RoomLineRequest, i64)>,
    /// Requested units per room type, ordered by id.
    quantities: BTreeMap<String, u32>,
}

fn default_times(booking_type: BookingType) -> (NaiveTime, NaiveTime) {
    let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN);
    match booking_type {
        BookingType::Overnight => (at(14), at(12)),
        BookingType::DayTour => (at(8), at(17)),
    }
}

fn invalid(status: BookingStatus, action: &'static str) -> AppError {
    AppError::InvalidTransition { from: status.to_string(), action }
}

fn not_found(booking_id: &str) -> AppError {
    AppError::NotFound(format!("Booking {} not found", booking_id))
}

pub struct BookingDeps {
    pub room_repo: Arc<dyn RoomRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub lock_store: Arc<dyn ReservationLockStore>,
    pub notifier: Arc<dyn NotificationService>,
    pub discounts: Arc<dyn DiscountProvider>,
    pub clock: Arc<dyn Clock>,
    pub availability: Arc<AvailabilityEngine>,
    pub meals: Arc<MealQuoteService>,
}

/// Booking lifecycle: pending, downpayment, paid, cancelled, failed.
///
/// Every operation that changes unit assignment runs inside one [`crate::domain::ports::BookingTx`];
/// lock-store and notification side effects happen after it commits and never undo it.
pub struct BookingService {
    room_repo: Arc<dyn RoomRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    lock_store: Arc<dyn ReservationLockStore>,
    notifier: Arc<dyn NotificationService>,
    discounts: Arc<dyn DiscountProvider>,
    clock: Arc<dyn Clock>,
    availability: Arc<AvailabilityEngine>,
    meals: Arc<MealQuoteService>,
    allocator: UnitAllocator,
    policy: BookingPolicy,
}

impl BookingService {
    pub fn new(deps: BookingDeps, policy: BookingPolicy) -> Self {
        Self {
            room_repo: deps.room_repo,
            booking_repo: deps.booking_repo,
            payment_repo: deps.payment_repo,
            lock_store: deps.lock_store,
            notifier: deps.notifier,
            discounts: deps.discounts,
            clock: deps.clock,
            availability: deps.availability,
            meals: deps.meals,
            allocator: UnitAllocator::new(policy.payment_grace),
            policy,
        }
    }

    pub async fn get(&self, booking_id: &str) -> Result<BookingDetails, AppError> {
        let booking = self.booking_repo.find_by_id(booking_id).await?.ok_or_else(|| not_found(booking_id))?;
        let lines = self.booking_repo.lines_for_booking(booking_id).await?;
        Ok(BookingDetails { booking, lines })
    }

    pub async fn create(&self, request: NewBooking) -> Result<BookingDetails, AppError> {
        let now = self.clock.now();
        let stay = StayRange::new(request.check_in, request.check_out)?;
        if stay.start < self.policy.today(now) {
            return Err(AppError::Validation("Check-in date is in the past".into()));
        }
        if request.guest_name.trim().is_empty() || !request.guest_email.contains('@') {
            return Err(AppError::Validation("Guest name and a valid email are required".into()));
        }

        let priced = self.price_rooms(&stay, &request.rooms).await?;
        self.ensure_available(&stay, &priced, None).await?;

        let booking_type = BookingType::for_stay(&stay);
        let (default_in, default_out) = default_times(booking_type);
        let hold_ttl = self.policy.hold_for(booking_type);

        let mut booking = Booking::new(NewBookingParams {
            guest_name: request.guest_name.trim().to_string(),
            guest_email: request.guest_email.trim().to_lowercase(),
            stay,
            check_in_time: request.check_in_time.unwrap_or(default_in),
            check_out_time: request.check_out_time.unwrap_or(default_out),
            promo_code: request.promo_code.filter(|c| !c.trim().is_empty()),
            hold_ttl,
            now,
        });

        let mut lines: Vec<BookingRoomLine> = priced
            .lines
            .iter()
            .map(|(req, price)| BookingRoomLine::new(booking.id.clone(), req.room_type_id.clone(), req.adults, req.children, *price))
            .collect();

        self.apply_totals(&mut booking, &lines, &priced.room_types).await?;

        // the hold goes in before the row exists so concurrent checkouts see it immediately
        let payload = HoldPayload::from_lines(&booking.id, stay, &lines);
        self.lock_store.hold(&booking.id, &payload, to_std(hold_ttl)?).await?;

        if let Err(e) = self.persist_new(&booking, &mut lines, &priced, now).await {
            warn!("Booking {} could not be created: {}", booking.id, e);
            self.release_hold(&booking.id).await;
            return Err(e);
        }

        info!(
            "Booking {} ({}) created for {}..{}, {} room(s), total {}",
            booking.id, booking.reference, stay.start, stay.end, lines.len(), booking.total_price
        );
        Ok(BookingDetails { booking, lines })
    }

    async fn persist_new(
        &self,
        booking: &Booking,
        lines: &mut [BookingRoomLine],
        priced: &PricedRooms,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let stay = booking.stay();
        let mut tx = self.booking_repo.begin().await?;

        for (room_type_id, quantity) in &priced.quantities {
            let units = tx.lock_units(room_type_id).await?;
            let committed = tx
                .overlapping_lines(room_type_id, &stay, None)
                .await?
                .iter()
                .filter(|l| l.is_occupying(now, self.policy.payment_grace))
                .count();

            if units.len().saturating_sub(committed) < *quantity as usize {
                return Err(AppError::RoomUnavailable(format!(
                    "Room type {} is fully booked for {}..{}",
                    room_type_id, stay.start, stay.end
                )));
            }
        }

        tx.insert_booking(booking).await?;

        let unassigned = self.allocator.reconcile(tx.as_mut(), &stay, Some(booking.id.as_str()), lines, now).await?;
        if !unassigned.is_empty() {
            warn!("Booking {}: {} line(s) created without a unit", booking.id, unassigned.len());
        }

        for line in lines.iter() {
            tx.insert_line(line).await?;
        }

        tx.commit().await
    }

    /// Moves a pending or downpayment booking forward once payment is confirmed and makes
    /// sure every line holds a unit that is still free.
    pub async fn confirm_payment(&self, booking_id: &str, kind: PaymentKind) -> Result<BookingDetails, AppError> {
        let now = self.clock.now();
        let target = kind.target();

        let mut tx = self.booking_repo.begin().await?;
        let mut booking = tx.lock_booking(booking_id).await?.ok_or_else(|| not_found(booking_id))?;
        if !booking.status.can_become(target) {
            return Err(invalid(booking.status, "confirm payment for"));
        }

        let mut lines = tx.lines_for_booking(&booking.id).await?;
        let before: Vec<Option<String>> = lines.iter().map(|l| l.room_unit_id.clone()).collect();

        let unassigned = self.allocator.reconcile(tx.as_mut(), &booking.stay(), Some(booking.id.as_str()), &mut lines, now).await?;
        for (line, previous) in lines.iter().zip(&before) {
            if line.room_unit_id != *previous {
                info!("Booking {} line {}: unit {:?} -> {:?}", booking.id, line.id, previous, line.room_unit_id);
                tx.set_line_unit(&line.id, line.room_unit_id.as_deref()).await?;
            }
        }
        for line_id in &unassigned {
            warn!("Booking {} line {} confirmed without a unit; none free", booking.id, line_id);
        }

        booking.status = target;
        booking.reserved_until = None;
        booking.updated_at = now;
        tx.update_booking(&booking).await?;
        tx.commit().await?;

        self.release_hold(&booking.id).await;
        self.notify(&booking, "payment_confirmed");
        info!("Booking {} is now {}", booking.id, booking.status);

        Ok(BookingDetails { booking, lines })
    }

    /// Payment gateway reported a failure for a pending booking.
    pub async fn mark_failed(&self, booking_id: &str, reason: &str) -> Result<Booking, AppError> {
        self.close(booking_id, BookingStatus::Failed, "fail", reason, |s| s == BookingStatus::Pending)
            .await
    }

    pub async fn cancel(&self, booking_id: &str, reason: &str) -> Result<Booking, AppError> {
        self.close(booking_id, BookingStatus::Cancelled, "cancel", reason, |s| {
            matches!(s, BookingStatus::Pending | BookingStatus::Failed)
        })
        .await
    }

    async fn close(
        &self,
        booking_id: &str,
        target: BookingStatus,
        action: &'static str,
        reason: &str,
        allowed: fn(BookingStatus) -> bool,
    ) -> Result<Booking, AppError> {
        let now = self.clock.now();
        let mut tx = self.booking_repo.begin().await?;
        let mut booking = tx.lock_booking(booking_id).await?.ok_or_else(|| not_found(booking_id))?;
        if !allowed(booking.status) || !booking.status.can_become(target) {
            return Err(invalid(booking.status, action));
        }

        let released = tx.release_units(&booking.id).await?;
        booking.status = target;
        booking.status_reason = Some(reason.to_string());
        booking.updated_at = now;
        tx.update_booking(&booking).await?;
        tx.commit().await?;

        info!("Booking {} -> {} ({}), {} unit(s) released", booking.id, target, reason, released);
        self.release_hold(&booking.id).await;
        self.notify(&booking, reason);
        Ok(booking)
    }

    /// Cancels pending bookings whose hold lapsed without a live payment.
    /// Safe to run repeatedly; each booking is re-checked under its row lock.
    pub async fn expire_stale(&self) -> Result<ExpirySweep, AppError> {
        let now = self.clock.now();
        let grace_cutoff = now - self.policy.payment_grace;
        let mut sweep = ExpirySweep::default();

        loop {
            let candidates = self.booking_repo.find_expirable(now, grace_cutoff, EXPIRY_BATCH).await?;
            let full_batch = candidates.len() as i64 == EXPIRY_BATCH;
            let expired_before = sweep.expired;
            sweep.examined += candidates.len();

            for candidate in candidates {
                match self.expire_one(&candidate.id, now).await {
                    Ok(Some(booking)) => {
                        sweep.expired += 1;
                        self.release_hold(&booking.id).await;
                        self.notify(&booking, "expired");
                    }
                    Ok(None) => {}
                    Err(e) => {
                        sweep.failed += 1;
                        error!("Failed to expire booking {}: {}", candidate.id, e);
                    }
                }
            }

            // Rows that keep failing stay eligible; stop once a page makes no progress.
            if !full_batch || sweep.expired == expired_before {
                break;
            }
        }

        if sweep.expired > 0 || sweep.failed > 0 {
            info!("Expiry sweep: {:?}", sweep);
        }
        Ok(sweep)
    }

    async fn expire_one(&self, booking_id: &str, now: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let mut tx = self.booking_repo.begin().await?;
        let Some(mut booking) = tx.lock_booking(booking_id).await? else {
            return Ok(None);
        };

        let lapsed = booking.reserved_until.is_some_and(|until| until < now);
        if booking.status != BookingStatus::Pending || !lapsed {
            return Ok(None);
        }

        let payments = PaymentSummary::from_payments(&tx.payments_for_booking(&booking.id).await?);
        let grace_over = payments
            .last_rejected_at
            .is_none_or(|at| at + self.policy.payment_grace <= now);
        if payments.total > 0 && !(payments.all_rejected() && grace_over) {
            return Ok(None);
        }

        tx.release_units(&booking.id).await?;
        booking.status = BookingStatus::Cancelled;
        booking.status_reason = Some("expired".into());
        booking.updated_at = now;
        tx.update_booking(&booking).await?;
        tx.commit().await?;

        info!("Booking {} expired", booking.id);
        Ok(Some(booking))
    }

    /// Moves a live booking to new dates, all or nothing.
    pub async fn reschedule(&self, booking_id: &str, check_in: NaiveDate, check_out: NaiveDate) -> Result<BookingDetails, AppError> {
        let now = self.clock.now();
        let stay = StayRange::new(check_in, check_out)?;
        if stay.start < self.policy.today(now) {
            return Err(AppError::Validation("Cannot reschedule into the past".into()));
        }

        let current = self.get(booking_id).await?;
        if !current.booking.status.is_live() {
            return Err(invalid(current.booking.status, "reschedule"));
        }

        let requests: Vec<RoomLineRequest> = current
            .lines
            .iter()
            .map(|l| RoomLineRequest { room_type_id: l.room_type_id.clone(), adults: l.adults, children: l.children })
            .collect();
        let priced = self.price_rooms(&stay, &requests).await?;
        self.ensure_available(&stay, &priced, Some(booking_id)).await?;

        let mut tx = self.booking_repo.begin().await?;
        let mut booking = tx.lock_booking(booking_id).await?.ok_or_else(|| not_found(booking_id))?;
        if !booking.status.is_live() {
            return Err(invalid(booking.status, "reschedule"));
        }

        let mut lines = tx.lines_for_booking(&booking.id).await?;
        for line in lines.iter_mut() {
            let room_type = priced
                .room_types
                .get(&line.room_type_id)
                .ok_or_else(|| AppError::Conflict(format!("Booking {} changed while rescheduling", booking.id)))?;
            line.line_price = line_price(room_type, &stay, line.guests());
        }

        let unassigned = self.allocator.reconcile(tx.as_mut(), &stay, Some(booking.id.as_str()), &mut lines, now).await?;
        if !unassigned.is_empty() {
            warn!("Reschedule of {} to {}..{} rejected: no free unit", booking.id, stay.start, stay.end);
            return Err(AppError::RoomUnavailable(format!(
                "No free unit for {}..{}", stay.start, stay.end
            )));
        }

        let previous_type = booking.booking_type;
        booking.set_stay(stay);
        if booking.booking_type != previous_type {
            (booking.check_in_time, booking.check_out_time) = default_times(booking.booking_type);
        }
        booking.updated_at = now;
        self.apply_totals(&mut booking, &lines, &priced.room_types).await?;

        tx.delete_lines(&booking.id).await?;
        for line in &lines {
            tx.insert_line(line).await?;
        }
        tx.update_booking(&booking).await?;
        tx.commit().await?;

        info!("Booking {} rescheduled to {}..{}", booking.id, stay.start, stay.end);
        self.refresh_hold(&booking, &lines, now).await;
        self.notify(&booking, "rescheduled");
        Ok(BookingDetails { booking, lines })
    }

    /// Replaces the booked rooms, all or nothing. Units of a room type the booking already
    /// held are reused where still free.
    pub async fn modify(&self, booking_id: &str, rooms: Vec<RoomLineRequest>) -> Result<BookingDetails, AppError> {
        let now = self.clock.now();
        let current = self.booking_repo.find_by_id(booking_id).await?.ok_or_else(|| not_found(booking_id))?;
        if !current.status.is_live() {
            return Err(invalid(current.status, "modify"));
        }

        let stay = current.stay();
        let priced = self.price_rooms(&stay, &rooms).await?;
        self.ensure_available(&stay, &priced, Some(booking_id)).await?;

        let mut tx = self.booking_repo.begin().await?;
        let mut booking = tx.lock_booking(booking_id).await?.ok_or_else(|| not_found(booking_id))?;
        if !booking.status.is_live() {
            return Err(invalid(booking.status, "modify"));
        }

        let mut previous_units: HashMap<String, Vec<String>> = HashMap::new();
        for old in tx.lines_for_booking(&booking.id).await? {
            if let Some(unit_id) = old.room_unit_id {
                previous_units.entry(old.room_type_id).or_default().push(unit_id);
            }
        }

        let mut lines: Vec<BookingRoomLine> = priced
            .lines
            .iter()
            .map(|(req, price)| {
                let mut line = BookingRoomLine::new(booking.id.clone(), req.room_type_id.clone(), req.adults, req.children, *price);
                if let Some(units) = previous_units.get_mut(&req.room_type_id)
                    && !units.is_empty()
                {
                    line.room_unit_id = Some(units.remove(0));
                }
                line
            })
            .collect();

        let unassigned = self.allocator.reconcile(tx.as_mut(), &stay, Some(booking.id.as_str()), &mut lines, now).await?;
        if !unassigned.is_empty() {
            return Err(AppError::RoomUnavailable(format!(
                "No free unit for {} of the requested rooms", unassigned.len()
            )));
        }

        booking.updated_at = now;
        self.apply_totals(&mut booking, &lines, &priced.room_types).await?;

        tx.delete_lines(&booking.id).await?;
        for line in &lines {
            tx.insert_line(line).await?;
        }
        tx.update_booking(&booking).await?;
        tx.commit().await?;

        info!("Booking {} modified: {} room(s), total {}", booking.id, lines.len(), booking.total_price);
        self.refresh_hold(&booking, &lines, now).await;
        self.notify(&booking, "modified");
        Ok(BookingDetails { booking, lines })
    }

    /// Records a payment attempt on behalf of the payment subsystem.
    pub async fn record_payment(&self, booking_id: &str, amount: i64, proof_status: ProofStatus) -> Result<Payment, AppError> {
        if amount <= 0 {
            return Err(AppError::Validation("Payment amount must be positive".into()));
        }
        let booking = self.booking_repo.find_by_id(booking_id).await?.ok_or_else(|| not_found(booking_id))?;
        if !matches!(booking.status, BookingStatus::Pending | BookingStatus::Downpayment) {
            return Err(invalid(booking.status, "record a payment for"));
        }

        let payment = Payment::new(booking.id, amount, proof_status, self.clock.now());
        self.payment_repo.record(&payment).await
    }

    pub async fn review_payment(&self, payment_id: &str, proof_status: ProofStatus) -> Result<Payment, AppError> {
        if self.payment_repo.find_by_id(payment_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Payment {} not found", payment_id)));
        }
        self.payment_repo.update_proof_status(payment_id, proof_status, self.clock.now()).await
    }

    async fn price_rooms(&self, stay: &StayRange, requests: &[RoomLineRequest]) -> Result<PricedRooms, AppError> {
        if requests.is_empty() {
            return Err(AppError::Validation("At least one room is required".into()));
        }

        let mut room_types: HashMap<String, RoomType> = HashMap::new();
        let mut quantities = BTreeMap::new();
        let mut lines = Vec::with_capacity(requests.len());

        for req in requests {
            if !room_types.contains_key(&req.room_type_id) {
                let room_type = self
                    .room_repo
                    .find_room_type(&req.room_type_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Room type {} not found", req.room_type_id)))?;
                room_types.insert(req.room_type_id.clone(), room_type);
            }
            let room_type = &room_types[&req.room_type_id];

            if req.adults < 1 || req.children < 0 {
                return Err(AppError::Validation("Each room needs at least one adult".into()));
            }
            if req.adults + req.children > room_type.capacity() {
                return Err(AppError::Validation(format!(
                    "{} takes at most {} guests", room_type.name, room_type.capacity()
                )));
            }
            if stay.is_day_tour() && room_type.day_tour_price.is_none() {
                warn!("Room type {} has no day-tour rate; charging the nightly rate", room_type.id);
            }

            let price = line_price(room_type, stay, req.adults + req.children);
            *quantities.entry(req.room_type_id.clone()).or_insert(0u32) += 1;
            lines.push((req.clone(), price));
        }

        Ok(PricedRooms { room_types, lines, quantities })
    }

    async fn ensure_available(&self, stay: &StayRange, priced: &PricedRooms, exclude_booking: Option<&str>) -> Result<(), AppError> {
        for (room_type_id, quantity) in &priced.quantities {
            let snapshot = self.availability.snapshot(room_type_id, stay, exclude_booking).await?;
            if snapshot.available < *quantity {
                let name = priced.room_types.get(room_type_id).map(|rt| rt.name.as_str()).unwrap_or(room_type_id.as_str());
                return Err(AppError::RoomUnavailable(format!(
                    "Only {} {} room(s) left for {}..{}, {} requested",
                    snapshot.available, name, stay.start, stay.end, quantity
                )));
            }
        }
        Ok(())
    }

    async fn apply_totals(
        &self,
        booking: &mut Booking,
        lines: &[BookingRoomLine],
        room_types: &HashMap<String, RoomType>,
    ) -> Result<(), AppError> {
        booking.adults = lines.iter().map(|l| l.adults).sum();
        booking.children = lines.iter().map(|l| l.children).sum();

        let booked: Vec<&RoomType> = lines.iter().filter_map(|l| room_types.get(&l.room_type_id)).collect();
        let quote = self
            .meals
            .quote(&booking.stay(), Party::new(booking.adults, booking.children, &booked))
            .await?;

        let room_subtotal: i64 = lines.iter().map(|l| l.line_price).sum();
        let discount = match booking.promo_code.as_deref() {
            Some(code) => self.discounts.discount_for(code, room_subtotal + quote.total).await?,
            None => 0,
        };

        let totals = BookingTotals::new(room_subtotal, quote.total, discount);
        booking.room_subtotal = totals.room_subtotal;
        booking.meal_total = totals.meal_total;
        booking.discount = totals.discount;
        booking.total_price = totals.total_price;
        booking.meal_quote = Some(Json(quote));
        Ok(())
    }

    /// Re-points a pending booking's hold at its current dates and rooms for whatever is
    /// left of its reservation window.
    async fn refresh_hold(&self, booking: &Booking, lines: &[BookingRoomLine], now: DateTime<Utc>) {
        if booking.status != BookingStatus::Pending {
            return;
        }
        let Some(remaining) = booking.reserved_until.map(|until| until - now) else { return };
        let Ok(ttl) = remaining.to_std() else { return };
        if ttl.is_zero() {
            return;
        }

        let payload = HoldPayload::from_lines(&booking.id, booking.stay(), lines);
        if let Err(e) = self.lock_store.hold(&booking.id, &payload, ttl).await {
            warn!("Could not refresh hold for booking {}: {}", booking.id, e);
        }
    }

    async fn release_hold(&self, booking_id: &str) {
        if let Err(e) = self.lock_store.release(booking_id).await {
            warn!("Could not release hold for booking {}: {}", booking_id, e);
        }
    }

    /// Sends on a detached task; the caller's transition is already committed.
    fn notify(&self, booking: &Booking, reason: &str) {
        let notifier = self.notifier.clone();
        let booking = booking.clone();
        let reason = reason.to_string();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&booking, &reason).await {
                warn!("Notification '{}' for booking {} failed: {}", reason, booking.id, e);
            }
        });
    }
}

fn to_std(duration: chrono::Duration) -> Result<std::time::Duration, AppError> {
    duration
        .to_std()
        .map_err(|_| AppError::InternalWithMsg(format!("invalid hold duration {}", duration)))
}
