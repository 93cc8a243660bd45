use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use sqlx::types::Json;
use rand::{distributions::Alphanumeric, Rng};
use super::meal::MealQuote;
use super::stay::StayRange;

text_enum!(
    BookingStatus {
        Pending => "pending",
        Downpayment => "downpayment",
        Paid => "paid",
        Cancelled => "cancelled",
        Failed => "failed",
    }
);

impl BookingStatus {
    pub fn can_become(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Downpayment | Paid | Cancelled | Failed)
                | (Downpayment, Paid | Cancelled)
                | (Failed, Cancelled)
        )
    }

    /// Statuses whose stay dates and rooms may still be changed.
    pub fn is_live(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Downpayment | BookingStatus::Paid)
    }
}

text_enum!(
    BookingType {
        Overnight => "overnight",
        DayTour => "day_tour",
    }
);

impl BookingType {
    pub fn for_stay(stay: &StayRange) -> Self {
        if stay.is_day_tour() { BookingType::DayTour } else { BookingType::Overnight }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub reference: String,
    pub guest_name: String,
    pub guest_email: String,
    #[sqlx(try_from = "String")]
    pub booking_type: BookingType,
    pub check_in_date: NaiveDate,
    pub check_in_time: NaiveTime,
    pub check_out_date: NaiveDate,
    pub check_out_time: NaiveTime,
    /// Exclusive end of occupancy; see [`StayRange::occupied_until`].
    pub occupied_until: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub reserved_until: Option<DateTime<Utc>>,
    pub adults: i32,
    pub children: i32,
    pub room_subtotal: i64,
    pub meal_total: i64,
    pub discount: i64,
    pub total_price: i64,
    pub promo_code: Option<String>,
    pub meal_quote: Option<Json<MealQuote>>,
    pub status_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub guest_name: String,
    pub guest_email: String,
    pub stay: StayRange,
    pub check_in_time: NaiveTime,
    pub check_out_time: NaiveTime,
    pub promo_code: Option<String>,
    pub hold_ttl: Duration,
    pub now: DateTime<Utc>,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let reference: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect::<String>()
            .to_uppercase();

        Self {
            id: Uuid::new_v4().to_string(),
            reference,
            guest_name: params.guest_name,
            guest_email: params.guest_email,
            booking_type: BookingType::for_stay(&params.stay),
            check_in_date: params.stay.start,
            check_in_time: params.check_in_time,
            check_out_date: params.stay.end,
            check_out_time: params.check_out_time,
            occupied_until: params.stay.occupied_until(),
            status: BookingStatus::Pending,
            reserved_until: Some(params.now + params.hold_ttl),
            adults: 0,
            children: 0,
            room_subtotal: 0,
            meal_total: 0,
            discount: 0,
            total_price: 0,
            promo_code: params.promo_code,
            meal_quote: None,
            status_reason: None,
            created_at: params.now,
            updated_at: params.now,
        }
    }

    pub fn stay(&self) -> StayRange {
        StayRange { start: self.check_in_date, end: self.check_out_date }
    }

    pub fn set_stay(&mut self, stay: StayRange) {
        self.check_in_date = stay.start;
        self.check_out_date = stay.end;
        self.occupied_until = stay.occupied_until();
        self.booking_type = BookingType::for_stay(&stay);
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct BookingRoomLine {
    pub id: String,
    pub booking_id: String,
    pub room_type_id: String,
    pub room_unit_id: Option<String>,
    /// Unit this line held before it was released by a cancellation.
    pub released_unit_id: Option<String>,
    pub adults: i32,
    pub children: i32,
    pub line_price: i64,
}

impl BookingRoomLine {
    pub fn new(booking_id: String, room_type_id: String, adults: i32, children: i32, line_price: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id,
            room_type_id,
            room_unit_id: None,
            released_unit_id: None,
            adults,
            children,
            line_price,
        }
    }

    pub fn guests(&self) -> i32 {
        self.adults + self.children
    }
}

/// Requested room within a create/modify call. Prices are never taken from the client.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoomLineRequest {
    pub room_type_id: String,
    pub adults: i32,
    #[serde(default)]
    pub children: i32,
}

/// One non-terminal line overlapping a queried interval, with enough of its booking and
/// payment state to decide whether it still occupies inventory.
#[derive(Debug, FromRow, Clone)]
pub struct LineOccupancy {
    pub line_id: String,
    pub booking_id: String,
    pub room_unit_id: Option<String>,
    pub check_in_date: NaiveDate,
    pub occupied_until: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub reserved_until: Option<DateTime<Utc>>,
    pub payment_total: i64,
    pub payment_open: i64,
    pub last_rejected_at: Option<DateTime<Utc>>,
}

impl LineOccupancy {
    pub fn overlaps(&self, query: &StayRange) -> bool {
        self.check_in_date < query.occupied_until() && query.start < self.occupied_until
    }

    pub fn is_occupying(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        match self.status {
            BookingStatus::Paid | BookingStatus::Downpayment => true,
            BookingStatus::Pending => {
                self.reserved_until.is_some_and(|until| until > now)
                    || self.payment_open > 0
                    || (self.payment_total > 0
                        && self.last_rejected_at.is_some_and(|at| at + grace > now))
            }
            BookingStatus::Cancelled | BookingStatus::Failed => false,
        }
    }
}

/// Lock-store payload for an in-flight booking.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HoldPayload {
    pub booking_id: String,
    pub stay: StayRange,
    pub lines: Vec<HeldLine>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HeldLine {
    pub room_type_id: String,
    pub room_unit_id: Option<String>,
}

impl HoldPayload {
    pub fn from_lines(booking_id: &str, stay: StayRange, lines: &[BookingRoomLine]) -> Self {
        Self {
            booking_id: booking_id.to_string(),
            stay,
            lines: lines
                .iter()
                .map(|l| HeldLine { room_type_id: l.room_type_id.clone(), room_unit_id: l.room_unit_id.clone() })
                .collect(),
        }
    }

    /// Held lines of `room_type_id` that intersect `query`.
    pub fn overlapping_count(&self, room_type_id: &str, query: &StayRange) -> u32 {
        if !self.stay.overlaps(query) {
            return 0;
        }
        self.lines.iter().filter(|l| l.room_type_id == room_type_id).count() as u32
    }
}
