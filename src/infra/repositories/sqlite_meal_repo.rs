use crate::domain::{
    models::meal::{MealCalendarOverride, MealPricingTier, MealProgram, OverrideKind},
    ports::MealRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use sqlx::SqlitePool;

pub struct SqliteMealRepo {
    pool: SqlitePool,
}

impl SqliteMealRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn month_key(date: NaiveDate) -> i32 {
    date.year() * 100 + date.month() as i32
}

#[async_trait]
impl MealRepository for SqliteMealRepo {
    async fn create_program(&self, p: &MealProgram) -> Result<MealProgram, AppError> {
        sqlx::query_as::<_, MealProgram>(
            "INSERT INTO meal_programs (id, name, scope_type, date_start, date_end, months, weekdays, weekend_definition, status, inactive_label, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&p.id).bind(&p.name).bind(p.scope_type.as_str()).bind(p.date_start).bind(p.date_end)
            .bind(&p.months).bind(&p.weekdays).bind(p.weekend_definition.as_str()).bind(p.status.as_str())
            .bind(&p.inactive_label).bind(p.created_at).bind(p.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_program(&self, p: &MealProgram) -> Result<MealProgram, AppError> {
        sqlx::query_as::<_, MealProgram>(
            "UPDATE meal_programs SET name = ?, scope_type = ?, date_start = ?, date_end = ?, months = ?, weekdays = ?,
                weekend_definition = ?, status = ?, inactive_label = ?, updated_at = ?
             WHERE id = ?
             RETURNING *"
        )
            .bind(&p.name).bind(p.scope_type.as_str()).bind(p.date_start).bind(p.date_end)
            .bind(&p.months).bind(&p.weekdays).bind(p.weekend_definition.as_str()).bind(p.status.as_str())
            .bind(&p.inactive_label).bind(p.updated_at).bind(&p.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Meal program {} not found", p.id)))
    }

    async fn find_program(&self, id: &str) -> Result<Option<MealProgram>, AppError> {
        sqlx::query_as::<_, MealProgram>("SELECT * FROM meal_programs WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_active_programs(&self) -> Result<Vec<MealProgram>, AppError> {
        sqlx::query_as::<_, MealProgram>("SELECT * FROM meal_programs WHERE status = 'active' ORDER BY updated_at DESC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn upsert_override(&self, o: &MealCalendarOverride) -> Result<MealCalendarOverride, AppError> {
        let conflict_target = match o.kind {
            OverrideKind::Date => "(program_id, date)",
            OverrideKind::Month => "(program_id, year, month)",
        };
        let sql = format!(
            "INSERT INTO meal_calendar_overrides (id, program_id, kind, date, month, year, is_active, note, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT {} DO UPDATE SET is_active = excluded.is_active, note = excluded.note
             RETURNING *",
            conflict_target
        );
        sqlx::query_as::<_, MealCalendarOverride>(&sql)
            .bind(&o.id).bind(&o.program_id).bind(o.kind.as_str()).bind(o.date).bind(o.month).bind(o.year)
            .bind(o.is_active).bind(&o.note).bind(o.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn overrides_between(&self, program_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<MealCalendarOverride>, AppError> {
        sqlx::query_as::<_, MealCalendarOverride>(
            "SELECT * FROM meal_calendar_overrides
             WHERE program_id = ?
               AND ((kind = 'date' AND date BETWEEN ? AND ?)
                 OR (kind = 'month' AND (year * 100 + month) BETWEEN ? AND ?))"
        )
            .bind(program_id).bind(start).bind(end).bind(month_key(start)).bind(month_key(end))
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn create_tier(&self, t: &MealPricingTier) -> Result<MealPricingTier, AppError> {
        sqlx::query_as::<_, MealPricingTier>(
            "INSERT INTO meal_pricing_tiers (id, program_id, name, effective_from, effective_to, adult_buffet_price, child_buffet_price, extra_guest_breakfast_price, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&t.id).bind(&t.program_id).bind(&t.name).bind(t.effective_from).bind(t.effective_to)
            .bind(t.adult_buffet_price).bind(t.child_buffet_price).bind(t.extra_guest_breakfast_price).bind(t.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_tiers(&self, program_id: &str) -> Result<Vec<MealPricingTier>, AppError> {
        sqlx::query_as::<_, MealPricingTier>("SELECT * FROM meal_pricing_tiers WHERE program_id = ? ORDER BY effective_from ASC, created_at ASC").bind(program_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
