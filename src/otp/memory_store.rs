use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::sync::{Mutex, MutexGuard};

use super::store::{InsertOutcome, OtpStore};
use crate::models::OtpRecord;

/// Process local otp store used by the tests
#[derive(Debug, Default)]
pub struct MemoryOtpStore {
    records: Mutex<Vec<OtpRecord>>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record for an address, live or not
    pub fn records_for(&self, address: &str) -> anyhow::Result<Vec<OtpRecord>> {
        let records = self.lock()?;
        let records = records
            .iter()
            .filter(|record| record.address == address)
            .cloned()
            .collect();
        Ok(records)
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Vec<OtpRecord>>> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("Otp store lock poisoned"))
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn find_live_by_address(
        &self,
        address: &str,
        now: u64,
    ) -> anyhow::Result<Option<OtpRecord>> {
        let records = self.lock()?;
        let record = records
            .iter()
            .filter(|record| record.address == address && record.is_live(now))
            .max_by_key(|record| record.issued_at)
            .cloned();
        Ok(record)
    }

    async fn insert_unless_throttled(
        &self,
        record: &OtpRecord,
        throttle_since: u64,
    ) -> anyhow::Result<InsertOutcome> {
        let mut records = self.lock()?;
        let blocking = records
            .iter()
            .filter(|stored| {
                stored.address == record.address
                    && stored.is_live(record.issued_at)
                    && stored.issued_at > throttle_since
            })
            .max_by_key(|stored| stored.issued_at)
            .cloned();
        if let Some(blocking) = blocking {
            return Ok(InsertOutcome::Throttled(blocking));
        }
        let id = ObjectId::new();
        let mut record = record.clone();
        record.id = Some(id);
        records.push(record);
        Ok(InsertOutcome::Inserted(id))
    }

    async fn insert(&self, record: &OtpRecord) -> anyhow::Result<ObjectId> {
        let id = ObjectId::new();
        let mut record = record.clone();
        record.id = Some(id);
        self.lock()?.push(record);
        Ok(id)
    }

    async fn increment_attempts(&self, id: &ObjectId) -> anyhow::Result<Option<OtpRecord>> {
        let mut records = self.lock()?;
        let record = records.iter_mut().find(|record| record.id == Some(*id));
        let Some(record) = record else {
            return Ok(None);
        };
        record.attempts = record.attempts.saturating_add(1);
        Ok(Some(record.clone()))
    }

    async fn mark_consumed(&self, id: &ObjectId, now: u64) -> anyhow::Result<bool> {
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|record| record.id == Some(*id) && !record.consumed);
        let Some(record) = record else {
            return Ok(false);
        };
        record.consumed = true;
        record.consumed_at = Some(now);
        Ok(true)
    }

    async fn delete_by_id(&self, id: &ObjectId) -> anyhow::Result<bool> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|record| record.id != Some(*id));
        Ok(records.len() < before)
    }

    async fn delete_expired_before(&self, cut_off: u64) -> anyhow::Result<u64> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|record| record.expires_at >= cut_off);
        let deleted = before - records.len();
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }
}
