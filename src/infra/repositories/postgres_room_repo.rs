use crate::domain::{models::room::{RoomType, RoomUnit, UnitStatus}, ports::RoomRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

pub struct PostgresRoomRepo {
    pool: PgPool,
}

impl PostgresRoomRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PostgresRoomRepo {
    async fn create_room_type(&self, rt: &RoomType) -> Result<RoomType, AppError> {
        sqlx::query_as::<_, RoomType>(
            "INSERT INTO room_types (id, name, max_guests, extra_guests, price_per_night, extra_guest_fee, day_tour_price, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *"
        )
            .bind(&rt.id).bind(&rt.name).bind(rt.max_guests).bind(rt.extra_guests)
            .bind(rt.price_per_night).bind(rt.extra_guest_fee).bind(rt.day_tour_price).bind(rt.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_room_type(&self, id: &str) -> Result<Option<RoomType>, AppError> {
        sqlx::query_as::<_, RoomType>("SELECT * FROM room_types WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_room_types(&self) -> Result<Vec<RoomType>, AppError> {
        sqlx::query_as::<_, RoomType>("SELECT * FROM room_types ORDER BY name ASC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn create_unit(&self, unit: &RoomUnit) -> Result<RoomUnit, AppError> {
        sqlx::query_as::<_, RoomUnit>(
            "INSERT INTO room_units (id, room_type_id, unit_number, label, status, blocked_until, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *"
        )
            .bind(&unit.id).bind(&unit.room_type_id).bind(unit.unit_number).bind(&unit.label)
            .bind(unit.status.as_str()).bind(unit.blocked_until).bind(unit.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_units(&self, room_type_id: &str) -> Result<Vec<RoomUnit>, AppError> {
        sqlx::query_as::<_, RoomUnit>("SELECT * FROM room_units WHERE room_type_id = $1 ORDER BY unit_number ASC").bind(room_type_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn count_allocatable_units(&self, room_type_id: &str) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM room_units WHERE room_type_id = $1 AND status = 'available'")
            .bind(room_type_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn set_unit_status(&self, unit_id: &str, status: UnitStatus, blocked_until: Option<NaiveDate>) -> Result<RoomUnit, AppError> {
        sqlx::query_as::<_, RoomUnit>("UPDATE room_units SET status = $1, blocked_until = $2 WHERE id = $3 RETURNING *")
            .bind(status.as_str()).bind(blocked_until).bind(unit_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Room unit {} not found", unit_id)))
    }

    async fn release_expired_blocks(&self, today: NaiveDate) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE room_units SET status = 'available', blocked_until = NULL
             WHERE status = 'blocked' AND blocked_until IS NOT NULL AND blocked_until < $1"
        )
            .bind(today)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
