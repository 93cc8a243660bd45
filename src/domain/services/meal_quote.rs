use crate::domain::models::{
    meal::{MealFallback, MealNight, MealPricingTier, MealQuote},
    room::RoomType,
    stay::StayRange,
};
use crate::domain::services::calendar::{CalendarResolver, DayClassification};
use crate::domain::services::pricing_tier::{select_tier, PricingTierResolver};
use crate::error::AppError;
use std::sync::Arc;
use tracing::debug;

/// Party composition a quote is priced for.
#[derive(Debug, Clone, Copy)]
pub struct Party {
    pub adults: i32,
    pub children: i32,
    /// Guests covered by the booked rooms' included breakfast.
    pub included_guests: i32,
}

impl Party {
    pub fn new(adults: i32, children: i32, room_types: &[&RoomType]) -> Self {
        Self {
            adults,
            children,
            included_guests: room_types.iter().map(|rt| rt.max_guests).sum(),
        }
    }

    pub fn extra_guests(&self) -> i32 {
        (self.adults + self.children - self.included_guests).max(0)
    }
}

/// Prices one service date. Buffet nights charge every guest; free-breakfast nights only
/// charge guests beyond the rooms' included count.
pub fn price_night(day: &DayClassification, tier: Option<&MealPricingTier>, party: Party) -> MealNight {
    let extra_guests = party.extra_guests();

    if day.program_id.is_none() {
        return MealNight::FreeBreakfast {
            date: day.date,
            extra_guest_breakfast_price: 0,
            extra_guests,
            charge: 0,
            fallback: Some(MealFallback::NoActiveProgram),
        };
    }

    let Some(tier) = tier else {
        return MealNight::FreeBreakfast {
            date: day.date,
            extra_guest_breakfast_price: 0,
            extra_guests,
            charge: 0,
            fallback: Some(MealFallback::NoPricingTier),
        };
    };

    if day.buffet_active {
        MealNight::Buffet {
            date: day.date,
            adult_price: tier.adult_buffet_price,
            child_price: tier.child_buffet_price,
            charge: i64::from(party.adults) * tier.adult_buffet_price
                + i64::from(party.children) * tier.child_buffet_price,
        }
    } else {
        MealNight::FreeBreakfast {
            date: day.date,
            extra_guest_breakfast_price: tier.extra_guest_breakfast_price,
            extra_guests,
            charge: i64::from(extra_guests) * tier.extra_guest_breakfast_price,
            fallback: None,
        }
    }
}

pub struct MealQuoteService {
    calendar: Arc<CalendarResolver>,
    tiers: Arc<PricingTierResolver>,
}

impl MealQuoteService {
    pub fn new(calendar: Arc<CalendarResolver>, tiers: Arc<PricingTierResolver>) -> Self {
        Self { calendar, tiers }
    }

    /// Meal charges for every service date of `stay`. Never fails on missing
    /// configuration; such nights fall back to free breakfast at no cost.
    pub async fn quote(&self, stay: &StayRange, party: Party) -> Result<MealQuote, AppError> {
        let dates = stay.service_dates();
        let (Some(first), Some(last)) = (dates.first().copied(), dates.last().copied()) else {
            return Ok(MealQuote { program_id: None, nights: Vec::new(), total: 0 });
        };

        let resolution = self.calendar.classify_range(first, last).await?;
        let program_id = resolution.days.first().and_then(|d| d.program_id.clone());

        let tiers = match &program_id {
            Some(id) => self.tiers.tiers(id).await?,
            None => Vec::new(),
        };

        let nights: Vec<MealNight> = resolution
            .days
            .iter()
            .filter(|day| dates.contains(&day.date))
            .map(|day| price_night(day, select_tier(&tiers, day.date), party))
            .collect();

        let total: i64 = nights.iter().map(MealNight::charge).sum();
        debug!("Meal quote {}..{}: {} nights, total {}", stay.start, stay.end, nights.len(), total);

        Ok(MealQuote { program_id, nights, total })
    }
}
