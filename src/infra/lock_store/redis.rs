use super::{hold_key, HOLD_KEY_PREFIX};
use crate::domain::models::booking::HoldPayload;
use crate::domain::ports::ReservationLockStore;
use crate::error::AppError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::warn;

const SCAN_BATCH: usize = 200;

/// Lock store backed by Redis keys with a native expiry (`SET ... PX`).
pub struct RedisLockStore {
    conn: ConnectionManager,
}

impl RedisLockStore {
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    fn decode(key: &str, raw: &str) -> Option<HoldPayload> {
        match serde_json::from_str(raw) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("Ignoring unreadable hold {}: {}", key, e);
                None
            }
        }
    }
}

#[async_trait]
impl ReservationLockStore for RedisLockStore {
    async fn hold(&self, booking_id: &str, payload: &HoldPayload, ttl: Duration) -> Result<(), AppError> {
        let body = serde_json::to_string(payload)
            .map_err(|e| AppError::InternalWithMsg(format!("hold payload encoding: {}", e)))?;
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let mut con = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(hold_key(booking_id))
            .arg(body)
            .arg("PX")
            .arg(millis)
            .query_async(&mut con)
            .await?;
        Ok(())
    }

    async fn peek(&self, booking_id: &str) -> Result<Option<HoldPayload>, AppError> {
        let key = hold_key(booking_id);
        let mut con = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET").arg(&key).query_async(&mut con).await?;
        Ok(raw.and_then(|r| Self::decode(&key, &r)))
    }

    async fn release(&self, booking_id: &str) -> Result<(), AppError> {
        let mut con = self.conn.clone();
        let _: i64 = redis::cmd("DEL").arg(hold_key(booking_id)).query_async(&mut con).await?;
        Ok(())
    }

    async fn remaining_ttl(&self, booking_id: &str) -> Result<Duration, AppError> {
        let mut con = self.conn.clone();
        // -2 when the key is missing, -1 when it has no expiry
        let millis: i64 = redis::cmd("PTTL").arg(hold_key(booking_id)).query_async(&mut con).await?;
        Ok(u64::try_from(millis).map(Duration::from_millis).unwrap_or(Duration::ZERO))
    }

    async fn active_holds(&self) -> Result<Vec<HoldPayload>, AppError> {
        let mut con = self.conn.clone();
        let pattern = format!("{}*", HOLD_KEY_PREFIX);
        let mut cursor: u64 = 0;
        let mut keys: Vec<String> = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut con)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        // keys may expire between SCAN and MGET; those come back as nil
        let values: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(&mut con).await?;
        Ok(keys
            .iter()
            .zip(values)
            .filter_map(|(key, raw)| raw.and_then(|r| Self::decode(key, &r)))
            .collect())
    }
}
