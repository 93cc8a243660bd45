pub mod clock;
pub mod discount;
pub mod factory;
pub mod lock_store;
pub mod notification;
pub mod repositories;
