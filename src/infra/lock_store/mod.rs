pub mod memory;
pub mod redis;

/// Key namespace shared by every lock-store backend.
pub const HOLD_KEY_PREFIX: &str = "booking-hold:";

pub fn hold_key(booking_id: &str) -> String {
    format!("{}{}", HOLD_KEY_PREFIX, booking_id)
}
