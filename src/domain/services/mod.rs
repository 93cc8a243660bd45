pub mod allocator;
pub mod availability;
pub mod booking_service;
pub mod calendar;
pub mod meal_quote;
pub mod pricing;
pub mod pricing_tier;
