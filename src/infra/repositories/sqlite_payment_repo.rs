use crate::domain::{models::payment::{Payment, ProofStatus}, ports::PaymentRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqlitePaymentRepo {
    pool: SqlitePool,
}

impl SqlitePaymentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepo {
    async fn record(&self, payment: &Payment) -> Result<Payment, AppError> {
        sqlx::query_as::<_, Payment>(
            "INSERT INTO payments (id, booking_id, amount, proof_status, proof_rejected_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&payment.id).bind(&payment.booking_id).bind(payment.amount)
            .bind(payment.proof_status.as_str()).bind(payment.proof_rejected_at).bind(payment.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_for_booking(&self, booking_id: &str) -> Result<Vec<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE booking_id = ? ORDER BY created_at ASC").bind(booking_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_proof_status(&self, id: &str, status: ProofStatus, at: DateTime<Utc>) -> Result<Payment, AppError> {
        let rejected_at = (status == ProofStatus::Rejected).then_some(at);
        sqlx::query_as::<_, Payment>("UPDATE payments SET proof_status = ?, proof_rejected_at = ? WHERE id = ? RETURNING *")
            .bind(status.as_str()).bind(rejected_at).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", id)))
    }
}
