use crate::domain::{
    models::{
        booking::{Booking, BookingRoomLine, BookingStatus, LineOccupancy},
        payment::Payment,
        room::RoomUnit,
        stay::StayRange,
    },
    ports::{BookingRepository, BookingTx},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;

/// Lines of one room type whose booking is not terminal and whose occupied span
/// `[check_in_date, occupied_until)` intersects the query, with payment aggregates.
/// Binds: room_type_id, query occupied_until, query start, excluded booking id ('' for none).
const OVERLAPPING_LINES_SQL: &str = "
    SELECT l.id AS line_id, l.booking_id, l.room_unit_id, b.check_in_date, b.occupied_until,
           b.status, b.reserved_until,
           (SELECT COUNT(*) FROM payments p WHERE p.booking_id = b.id) AS payment_total,
           (SELECT COUNT(*) FROM payments p WHERE p.booking_id = b.id AND p.proof_status <> 'rejected') AS payment_open,
           (SELECT MAX(p.proof_rejected_at) FROM payments p WHERE p.booking_id = b.id AND p.proof_status = 'rejected') AS last_rejected_at
    FROM booking_room_lines l
    JOIN bookings b ON b.id = l.booking_id
    WHERE l.room_type_id = ?
      AND b.status NOT IN ('cancelled', 'failed')
      AND b.check_in_date < ?
      AND b.occupied_until > ?
      AND b.id <> ?";

const INSERT_BOOKING_SQL: &str = "
    INSERT INTO bookings (id, reference, guest_name, guest_email, booking_type, check_in_date, check_in_time,
        check_out_date, check_out_time, occupied_until, status, reserved_until, adults, children,
        room_subtotal, meal_total, discount, total_price, promo_code, meal_quote, status_reason, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const UPDATE_BOOKING_SQL: &str = "
    UPDATE bookings SET booking_type = ?, check_in_date = ?, check_in_time = ?, check_out_date = ?, check_out_time = ?,
        occupied_until = ?, status = ?, reserved_until = ?, adults = ?, children = ?, room_subtotal = ?, meal_total = ?,
        discount = ?, total_price = ?, promo_code = ?, meal_quote = ?, status_reason = ?, updated_at = ?
    WHERE id = ?";

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn begin(&self) -> Result<Box<dyn BookingTx>, AppError> {
        let tx = self.pool.begin().await.map_err(AppError::Database)?;
        Ok(Box::new(SqliteBookingTx { tx }))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE reference = ?").bind(reference).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn lines_for_booking(&self, booking_id: &str) -> Result<Vec<BookingRoomLine>, AppError> {
        sqlx::query_as::<_, BookingRoomLine>("SELECT * FROM booking_room_lines WHERE booking_id = ? ORDER BY id").bind(booking_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn overlapping_lines(&self, room_type_id: &str, stay: &StayRange, exclude_booking: Option<&str>) -> Result<Vec<LineOccupancy>, AppError> {
        sqlx::query_as::<_, LineOccupancy>(OVERLAPPING_LINES_SQL)
            .bind(room_type_id).bind(stay.occupied_until()).bind(stay.start).bind(exclude_booking.unwrap_or(""))
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn statuses(&self, ids: &[String]) -> Result<HashMap<String, BookingStatus>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, status FROM bookings WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let rows: Vec<(String, String)> = qb.build_query_as().fetch_all(&self.pool).await.map_err(AppError::Database)?;
        rows.into_iter()
            .map(|(id, status)| {
                let status: BookingStatus = status.parse().map_err(|e| AppError::InternalWithMsg(format!("{}", e)))?;
                Ok::<_, AppError>((id, status))
            })
            .collect()
    }

    async fn find_expirable(&self, now: DateTime<Utc>, grace_cutoff: DateTime<Utc>, limit: i64) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT b.* FROM bookings b
             WHERE b.status = 'pending' AND b.reserved_until IS NOT NULL AND b.reserved_until < ?
               AND NOT EXISTS (
                   SELECT 1 FROM payments p
                   WHERE p.booking_id = b.id
                     AND (p.proof_status <> 'rejected' OR p.proof_rejected_at > ?)
               )
             ORDER BY b.reserved_until ASC LIMIT ?"
        )
            .bind(now).bind(grace_cutoff).bind(limit)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}

pub struct SqliteBookingTx {
    tx: Transaction<'static, Sqlite>,
}

// SQLite has no row locks. Each transaction opens with a write so it takes the database
// write lock up front; competing writers then wait on busy_timeout instead of failing a
// read-to-write upgrade.
#[async_trait]
impl BookingTx for SqliteBookingTx {
    async fn lock_booking(&mut self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query("UPDATE bookings SET id = id WHERE id = ?").bind(id).execute(&mut *self.tx).await.map_err(AppError::Database)?;
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?").bind(id).fetch_optional(&mut *self.tx).await.map_err(AppError::Database)
    }

    async fn lock_units(&mut self, room_type_id: &str) -> Result<Vec<RoomUnit>, AppError> {
        sqlx::query("UPDATE room_units SET status = status WHERE room_type_id = ?").bind(room_type_id).execute(&mut *self.tx).await.map_err(AppError::Database)?;
        sqlx::query_as::<_, RoomUnit>(
            "SELECT * FROM room_units WHERE room_type_id = ? AND status = 'available' ORDER BY unit_number ASC"
        )
            .bind(room_type_id)
            .fetch_all(&mut *self.tx).await.map_err(AppError::Database)
    }

    async fn overlapping_lines(&mut self, room_type_id: &str, stay: &StayRange, exclude_booking: Option<&str>) -> Result<Vec<LineOccupancy>, AppError> {
        sqlx::query_as::<_, LineOccupancy>(OVERLAPPING_LINES_SQL)
            .bind(room_type_id).bind(stay.occupied_until()).bind(stay.start).bind(exclude_booking.unwrap_or(""))
            .fetch_all(&mut *self.tx).await.map_err(AppError::Database)
    }

    async fn lines_for_booking(&mut self, booking_id: &str) -> Result<Vec<BookingRoomLine>, AppError> {
        sqlx::query_as::<_, BookingRoomLine>("SELECT * FROM booking_room_lines WHERE booking_id = ? ORDER BY id").bind(booking_id).fetch_all(&mut *self.tx).await.map_err(AppError::Database)
    }

    async fn payments_for_booking(&mut self, booking_id: &str) -> Result<Vec<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE booking_id = ? ORDER BY created_at").bind(booking_id).fetch_all(&mut *self.tx).await.map_err(AppError::Database)
    }

    async fn insert_booking(&mut self, b: &Booking) -> Result<(), AppError> {
        sqlx::query(INSERT_BOOKING_SQL)
            .bind(&b.id).bind(&b.reference).bind(&b.guest_name).bind(&b.guest_email).bind(b.booking_type.as_str())
            .bind(b.check_in_date).bind(b.check_in_time).bind(b.check_out_date).bind(b.check_out_time).bind(b.occupied_until)
            .bind(b.status.as_str()).bind(b.reserved_until).bind(b.adults).bind(b.children)
            .bind(b.room_subtotal).bind(b.meal_total).bind(b.discount).bind(b.total_price)
            .bind(&b.promo_code).bind(&b.meal_quote).bind(&b.status_reason).bind(b.created_at).bind(b.updated_at)
            .execute(&mut *self.tx).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn update_booking(&mut self, b: &Booking) -> Result<(), AppError> {
        let result = sqlx::query(UPDATE_BOOKING_SQL)
            .bind(b.booking_type.as_str()).bind(b.check_in_date).bind(b.check_in_time).bind(b.check_out_date).bind(b.check_out_time)
            .bind(b.occupied_until).bind(b.status.as_str()).bind(b.reserved_until).bind(b.adults).bind(b.children)
            .bind(b.room_subtotal).bind(b.meal_total).bind(b.discount).bind(b.total_price)
            .bind(&b.promo_code).bind(&b.meal_quote).bind(&b.status_reason).bind(b.updated_at)
            .bind(&b.id)
            .execute(&mut *self.tx).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Booking {} not found", b.id)));
        }
        Ok(())
    }

    async fn insert_line(&mut self, line: &BookingRoomLine) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO booking_room_lines (id, booking_id, room_type_id, room_unit_id, released_unit_id, adults, children, line_price)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
            .bind(&line.id).bind(&line.booking_id).bind(&line.room_type_id).bind(&line.room_unit_id)
            .bind(&line.released_unit_id).bind(line.adults).bind(line.children).bind(line.line_price)
            .execute(&mut *self.tx).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn set_line_unit(&mut self, line_id: &str, unit_id: Option<&str>) -> Result<(), AppError> {
        sqlx::query("UPDATE booking_room_lines SET room_unit_id = ? WHERE id = ?").bind(unit_id).bind(line_id).execute(&mut *self.tx).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn release_units(&mut self, booking_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE booking_room_lines SET released_unit_id = room_unit_id, room_unit_id = NULL
             WHERE booking_id = ? AND room_unit_id IS NOT NULL"
        )
            .bind(booking_id)
            .execute(&mut *self.tx).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn delete_lines(&mut self, booking_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM booking_room_lines WHERE booking_id = ?").bind(booking_id).execute(&mut *self.tx).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await.map_err(AppError::Database)
    }
}
