use crate::domain::models::{booking::RoomLineRequest, payment::ProofStatus};
use crate::domain::services::booking_service::PaymentKind;
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct StayQuery {
    pub check_in: NaiveDate,
    /// Omitted for a day tour.
    pub check_out: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct DateRangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

#[derive(Deserialize)]
pub struct ConfirmPaymentRequest {
    pub kind: PaymentKind,
}

#[derive(Deserialize, Default)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct FailBookingRequest {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct RescheduleBookingRequest {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Deserialize)]
pub struct ModifyRoomsRequest {
    pub rooms: Vec<RoomLineRequest>,
}

#[derive(Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: i64,
    pub proof_status: Option<ProofStatus>,
}

#[derive(Deserialize)]
pub struct ReviewPaymentRequest {
    pub proof_status: ProofStatus,
}

#[derive(Deserialize)]
pub struct UpsertOverrideRequest {
    /// Set for a date override.
    pub date: Option<NaiveDate>,
    /// Set together with `month` for a month override.
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub is_active: bool,
    pub note: Option<String>,
}
