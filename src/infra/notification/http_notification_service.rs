use crate::domain::models::booking::Booking;
use crate::domain::ports::NotificationService;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts booking state changes to the mail service, which renders and sends the guest email.
pub struct HttpNotificationService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpNotificationService {
    pub fn new(api_url: String, api_key: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to build notification client: {}", e)))?;
        Ok(Self { client, api_url, api_key })
    }
}

#[derive(Serialize)]
struct NotificationPayload<'a> {
    from_alias: &'static str,
    to_addr: &'a str,
    guest_name: &'a str,
    template: &'a str,
    reference: &'a str,
    status: &'static str,
    check_in: NaiveDate,
    check_out: NaiveDate,
    total_price: i64,
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    async fn notify(&self, booking: &Booking, reason: &str) -> Result<(), AppError> {
        let payload = NotificationPayload {
            from_alias: "default",
            to_addr: &booking.guest_email,
            guest_name: &booking.guest_name,
            template: reason,
            reference: &booking.reference,
            status: booking.status.as_str(),
            check_in: booking.check_in_date,
            check_out: booking.check_out_date,
            total_price: booking.total_price,
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Notification service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Notification service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        info!("Sent '{}' notification for booking {}", reason, booking.reference);
        Ok(())
    }
}
