use crate::domain::ports::DiscountProvider;
use crate::error::AppError;
use async_trait::async_trait;
use tracing::debug;

/// Used when no promo subsystem is wired in; every code is worth nothing.
pub struct NoDiscount;

#[async_trait]
impl DiscountProvider for NoDiscount {
    async fn discount_for(&self, promo_code: &str, _subtotal: i64) -> Result<i64, AppError> {
        debug!("Promo code {} ignored: no discount provider configured", promo_code);
        Ok(0)
    }
}
