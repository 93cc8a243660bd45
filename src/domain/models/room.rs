use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

text_enum!(
    /// Operational state of a physical unit. Only `Available` units are allocatable.
    UnitStatus {
        Available => "available",
        Maintenance => "maintenance",
        Blocked => "blocked",
    }
);

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct RoomType {
    pub id: String,
    pub name: String,
    pub max_guests: i32,
    /// Additional guests allowed on top of `max_guests` for a fee.
    pub extra_guests: Option<i32>,
    pub price_per_night: i64,
    pub extra_guest_fee: i64,
    pub day_tour_price: Option<i64>,
    pub created_at: DateTime<Utc>,
}

pub struct NewRoomTypeParams {
    pub name: String,
    pub max_guests: i32,
    pub extra_guests: Option<i32>,
    pub price_per_night: i64,
    pub extra_guest_fee: i64,
    pub day_tour_price: Option<i64>,
}

impl RoomType {
    pub fn new(params: NewRoomTypeParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: params.name,
            max_guests: params.max_guests,
            extra_guests: params.extra_guests,
            price_per_night: params.price_per_night,
            extra_guest_fee: params.extra_guest_fee,
            day_tour_price: params.day_tour_price,
            created_at: Utc::now(),
        }
    }

    /// Hard ceiling of guests a single unit of this type can take.
    pub fn capacity(&self) -> i32 {
        self.max_guests + self.extra_guests.unwrap_or(0)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct RoomUnit {
    pub id: String,
    pub room_type_id: String,
    pub unit_number: i32,
    pub label: String,
    #[sqlx(try_from = "String")]
    pub status: UnitStatus,
    pub blocked_until: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl RoomUnit {
    pub fn new(room_type_id: String, unit_number: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room_type_id,
            unit_number,
            label: unit_number.to_string(),
            status: UnitStatus::Available,
            blocked_until: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_allocatable(&self) -> bool {
        self.status == UnitStatus::Available
    }
}
