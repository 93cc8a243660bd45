use crate::domain::models::{room::RoomType, stay::StayRange};
use serde::Serialize;

/// Price of one room line from the room type's current rates.
///
/// Overnight stays pay per night; day tours pay the day-tour rate once (falling back to
/// the nightly rate when the type has none). Guests above `max_guests` add the extra
/// guest fee for every charged night.
pub fn line_price(room_type: &RoomType, stay: &StayRange, guests: i32) -> i64 {
    let extra = i64::from((guests - room_type.max_guests).max(0));
    let per_night_extra = extra * room_type.extra_guest_fee;

    if stay.is_day_tour() {
        room_type.day_tour_price.unwrap_or(room_type.price_per_night) + per_night_extra
    } else {
        stay.nights() * (room_type.price_per_night + per_night_extra)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookingTotals {
    pub room_subtotal: i64,
    pub meal_total: i64,
    pub discount: i64,
    pub total_price: i64,
}

impl BookingTotals {
    pub fn new(room_subtotal: i64, meal_total: i64, discount: i64) -> Self {
        let gross = room_subtotal + meal_total;
        let discount = discount.clamp(0, gross);
        Self {
            room_subtotal,
            meal_total,
            discount,
            total_price: gross - discount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::room::NewRoomTypeParams;
    use chrono::NaiveDate;

    fn garden_view() -> RoomType {
        RoomType::new(NewRoomTypeParams {
            name: "Garden View".into(),
            max_guests: 2,
            extra_guests: Some(2),
            price_per_night: 3_500_00,
            extra_guest_fee: 500_00,
            day_tour_price: Some(1_500_00),
        })
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn overnight_charges_every_night_with_extra_guests() {
        let stay = StayRange::new(d("2025-09-01"), d("2025-09-03")).unwrap();
        assert_eq!(line_price(&garden_view(), &stay, 2), 7_000_00);
        assert_eq!(line_price(&garden_view(), &stay, 3), 8_000_00);
    }

    #[test]
    fn day_tour_uses_day_rate() {
        let stay = StayRange::single_day(d("2025-09-01"));
        assert_eq!(line_price(&garden_view(), &stay, 1), 1_500_00);
    }

    #[test]
    fn discount_never_exceeds_gross() {
        let totals = BookingTotals::new(1000, 200, 5000);
        assert_eq!(totals.discount, 1200);
        assert_eq!(totals.total_price, 0);
    }
}
