use crate::domain::models::meal::MealPricingTier;
use crate::domain::services::availability::AvailabilitySnapshot;
use crate::domain::services::pricing_tier::TierConflict;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub room_type_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(flatten)]
    pub snapshot: AvailabilitySnapshot,
}

#[derive(Serialize)]
pub struct TierLookupResponse {
    pub program_id: Option<String>,
    pub date: NaiveDate,
    pub tier: Option<MealPricingTier>,
    pub conflicts: Vec<TierConflict>,
}
