use super::hold_key;
use crate::domain::models::booking::HoldPayload;
use crate::domain::ports::{Clock, ReservationLockStore};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

struct Entry {
    payload: HoldPayload,
    expires_at: DateTime<Utc>,
}

/// Process-local lock store. Expiry is evaluated against the injected clock on every
/// read, so an entry past its deadline behaves exactly like a missing one.
pub struct InMemoryLockStore {
    entries: DashMap<String, Entry>,
    clock: Arc<dyn Clock>,
}

impl InMemoryLockStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { entries: DashMap::new(), clock }
    }

    fn live(&self, key: &str) -> Option<dashmap::mapref::one::Ref<'_, String, Entry>> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, e| e.expires_at <= now);
        }
        None
    }
}

#[async_trait]
impl ReservationLockStore for InMemoryLockStore {
    async fn hold(&self, booking_id: &str, payload: &HoldPayload, ttl: Duration) -> Result<(), AppError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| AppError::Validation(format!("hold TTL {:?} out of range", ttl)))?;
        self.entries.insert(
            hold_key(booking_id),
            Entry { payload: payload.clone(), expires_at: self.clock.now() + ttl },
        );
        Ok(())
    }

    async fn peek(&self, booking_id: &str) -> Result<Option<HoldPayload>, AppError> {
        Ok(self.live(&hold_key(booking_id)).map(|e| e.payload.clone()))
    }

    async fn release(&self, booking_id: &str) -> Result<(), AppError> {
        self.entries.remove(&hold_key(booking_id));
        Ok(())
    }

    async fn remaining_ttl(&self, booking_id: &str) -> Result<Duration, AppError> {
        let now = self.clock.now();
        Ok(self
            .live(&hold_key(booking_id))
            .and_then(|e| (e.expires_at - now).to_std().ok())
            .unwrap_or(Duration::ZERO))
    }

    async fn active_holds(&self) -> Result<Vec<HoldPayload>, AppError> {
        let now = self.clock.now();
        self.entries.retain(|_, e| e.expires_at > now);
        Ok(self.entries.iter().map(|e| e.payload.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::booking::HeldLine;
    use crate::domain::models::stay::StayRange;
    use crate::infra::clock::ManualClock;
    use chrono::NaiveDate;

    fn payload(id: &str) -> HoldPayload {
        let day = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        HoldPayload {
            booking_id: id.into(),
            stay: StayRange::single_day(day),
            lines: vec![HeldLine { room_type_id: "garden".into(), room_unit_id: None }],
        }
    }

    #[tokio::test]
    async fn entries_vanish_after_ttl() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = InMemoryLockStore::new(clock.clone());

        store.hold("b1", &payload("b1"), Duration::from_secs(15 * 60)).await.unwrap();
        assert_eq!(store.peek("b1").await.unwrap(), Some(payload("b1")));
        assert_eq!(store.remaining_ttl("b1").await.unwrap(), Duration::from_secs(15 * 60));

        clock.advance(chrono::Duration::minutes(15));
        assert!(store.peek("b1").await.unwrap().is_none());
        assert_eq!(store.remaining_ttl("b1").await.unwrap(), Duration::ZERO);
        assert!(store.active_holds().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn hold_overwrites_and_release_is_idempotent() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = InMemoryLockStore::new(clock.clone());

        store.hold("b1", &payload("b1"), Duration::from_secs(60)).await.unwrap();
        clock.advance(chrono::Duration::seconds(50));
        store.hold("b1", &payload("b1"), Duration::from_secs(60)).await.unwrap();
        clock.advance(chrono::Duration::seconds(50));
        assert!(store.peek("b1").await.unwrap().is_some());

        store.release("b1").await.unwrap();
        store.release("b1").await.unwrap();
        assert!(store.peek("b1").await.unwrap().is_none());
    }
}
