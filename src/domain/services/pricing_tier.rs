use crate::domain::models::meal::MealPricingTier;
use crate::domain::ports::MealRepository;
use crate::error::AppError;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Tier in force on `date`.
///
/// First a tier whose window contains the date (latest `effective_from` wins). Failing
/// that, the latest tier that had started by then, ignoring its end date, so a tier keeps
/// applying past its nominal end until something supersedes it.
pub fn select_tier(tiers: &[MealPricingTier], date: NaiveDate) -> Option<&MealPricingTier> {
    let newest = |a: &&MealPricingTier, b: &&MealPricingTier| {
        a.effective_from
            .cmp(&b.effective_from)
            .then_with(|| a.created_at.cmp(&b.created_at))
    };

    tiers
        .iter()
        .filter(|t| t.window_contains(date))
        .max_by(newest)
        .or_else(|| {
            tiers
                .iter()
                .filter(|t| t.effective_from.is_none_or(|from| from <= date))
                .max_by(newest)
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierConflict {
    pub first_tier_id: String,
    pub second_tier_id: String,
    pub open_ended: bool,
}

/// Pairs of tiers whose windows overlap. Any pair involving an open-ended tier is
/// reported.
pub fn window_conflicts(tiers: &[MealPricingTier]) -> Vec<TierConflict> {
    let mut conflicts = Vec::new();
    for (i, a) in tiers.iter().enumerate() {
        for b in &tiers[i + 1..] {
            let open_ended = a.is_open_ended() || b.is_open_ended();
            let overlaps = match (a.effective_from, a.effective_to, b.effective_from, b.effective_to) {
                (Some(a_from), Some(a_to), Some(b_from), Some(b_to)) => a_from <= b_to && b_from <= a_to,
                _ => true,
            };
            if open_ended || overlaps {
                conflicts.push(TierConflict {
                    first_tier_id: a.id.clone(),
                    second_tier_id: b.id.clone(),
                    open_ended,
                });
            }
        }
    }
    conflicts
}

pub struct PricingTierResolver {
    meal_repo: Arc<dyn MealRepository>,
}

impl PricingTierResolver {
    pub fn new(meal_repo: Arc<dyn MealRepository>) -> Self {
        Self { meal_repo }
    }

    /// All tiers of a program, logging any overlapping windows.
    pub async fn tiers(&self, program_id: &str) -> Result<Vec<MealPricingTier>, AppError> {
        let tiers = self.meal_repo.list_tiers(program_id).await?;
        for c in window_conflicts(&tiers) {
            warn!(
                "Meal pricing tiers {} and {} of program {} overlap (open-ended: {})",
                c.first_tier_id, c.second_tier_id, program_id, c.open_ended
            );
        }
        Ok(tiers)
    }

    pub async fn tier_for(&self, program_id: &str, date: NaiveDate) -> Result<Option<MealPricingTier>, AppError> {
        let tiers = self.tiers(program_id).await?;
        Ok(select_tier(&tiers, date).cloned())
    }

    pub async fn window_conflicts(&self, program_id: &str) -> Result<Vec<TierConflict>, AppError> {
        let tiers = self.meal_repo.list_tiers(program_id).await?;
        Ok(window_conflicts(&tiers))
    }
}
