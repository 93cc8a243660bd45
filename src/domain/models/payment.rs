use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

text_enum!(
    /// Review state of the proof attached to a payment attempt.
    ProofStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
);

/// A payment attempt recorded by the payment subsystem against a booking.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Payment {
    pub id: String,
    pub booking_id: String,
    pub amount: i64,
    #[sqlx(try_from = "String")]
    pub proof_status: ProofStatus,
    pub proof_rejected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(booking_id: String, amount: i64, proof_status: ProofStatus, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id,
            amount,
            proof_status,
            proof_rejected_at: (proof_status == ProofStatus::Rejected).then_some(now),
            created_at: now,
        }
    }
}

/// What the core needs to know about a booking's payments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentSummary {
    pub total: i64,
    /// Attempts whose proof is still pending or approved.
    pub open: i64,
    pub last_rejected_at: Option<DateTime<Utc>>,
}

impl PaymentSummary {
    pub fn from_payments(payments: &[Payment]) -> Self {
        let open = payments.iter().filter(|p| p.proof_status != ProofStatus::Rejected).count() as i64;
        let last_rejected_at = payments
            .iter()
            .filter(|p| p.proof_status == ProofStatus::Rejected)
            .filter_map(|p| p.proof_rejected_at)
            .max();
        Self {
            total: payments.len() as i64,
            open,
            last_rejected_at,
        }
    }

    pub fn all_rejected(&self) -> bool {
        self.total > 0 && self.open == 0
    }
}
