pub mod sqlite_booking_repo;
pub mod sqlite_meal_repo;
pub mod sqlite_payment_repo;
pub mod sqlite_room_repo;

pub mod postgres_booking_repo;
pub mod postgres_meal_repo;
pub mod postgres_payment_repo;
pub mod postgres_room_repo;
