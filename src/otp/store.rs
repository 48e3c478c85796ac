use async_trait::async_trait;
use mockall_double::double;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Document},
    options::{FindOneAndUpdateOptions, FindOneOptions, ReturnDocument},
};
use std::sync::Arc;

use crate::{
    constants::*,
    database::connect,
    models::OtpRecord,
    utils::{env_or, to_bson_ts},
};

#[double]
use crate::database::AppDatabase;

/// Result of a conditional insert
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(ObjectId),
    /// Newest live record issued within the throttle window, nothing was inserted
    Throttled(OtpRecord),
}

/// Durable storage of otp records
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Newest record for the address which is neither consumed nor expired at `now`
    async fn find_live_by_address(
        &self,
        address: &str,
        now: u64,
    ) -> anyhow::Result<Option<OtpRecord>>;

    async fn insert(&self, record: &OtpRecord) -> anyhow::Result<ObjectId>;

    /// Insert `record` unless the address holds a record which is live at
    /// `record.issued_at` and was issued after `throttle_since`. Check and insert
    /// happen as one store operation.
    async fn insert_unless_throttled(
        &self,
        record: &OtpRecord,
        throttle_since: u64,
    ) -> anyhow::Result<InsertOutcome>;

    /// Atomically add one failed attempt and return the updated record
    async fn increment_attempts(&self, id: &ObjectId) -> anyhow::Result<Option<OtpRecord>>;

    /// Mark the record consumed. Returns false when it was already consumed or gone.
    async fn mark_consumed(&self, id: &ObjectId, now: u64) -> anyhow::Result<bool>;

    async fn delete_by_id(&self, id: &ObjectId) -> anyhow::Result<bool>;

    /// Remove records which expired before `cut_off` and return how many were removed
    async fn delete_expired_before(&self, cut_off: u64) -> anyhow::Result<u64>;
}

pub struct MongoOtpStore {
    db: Arc<AppDatabase>,
    db_name: String,
}

impl MongoOtpStore {
    pub fn new(db: Arc<AppDatabase>, db_name: &str) -> Self {
        Self {
            db,
            db_name: db_name.to_owned(),
        }
    }

    /// Connect to mongodb with the parameters found in the environment
    pub async fn connect() -> anyhow::Result<Self> {
        let client = connect().await?;
        let db = Arc::new(AppDatabase::from_client(client));
        let db_name = env_or("DB_NAME", DEFAULT_DB_NAME.to_owned());
        Ok(Self::new(db, &db_name))
    }
}

#[async_trait]
impl OtpStore for MongoOtpStore {
    async fn find_live_by_address(
        &self,
        address: &str,
        now: u64,
    ) -> anyhow::Result<Option<OtpRecord>> {
        let filter = doc! {
            "address": address,
            "consumed": false,
            "expiresAt": {"$gt": to_bson_ts(now)},
        };
        let mut options = FindOneOptions::default();
        options.sort = Some(newest_first());
        let record = self
            .db
            .find_one::<OtpRecord>(&self.db_name, COLL_OTP, Some(filter), Some(options))
            .await?;
        Ok(record)
    }

    async fn insert(&self, record: &OtpRecord) -> anyhow::Result<ObjectId> {
        let inserted_id = self
            .db
            .insert_one::<OtpRecord>(&self.db_name, COLL_OTP, record, None)
            .await?;
        let id = inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow::anyhow!("Unexpected otp id received: {inserted_id}"))?;
        Ok(id)
    }

    async fn insert_unless_throttled(
        &self,
        record: &OtpRecord,
        throttle_since: u64,
    ) -> anyhow::Result<InsertOutcome> {
        let filter = doc! {
            "address": record.address.as_str(),
            "consumed": false,
            "expiresAt": {"$gt": to_bson_ts(record.issued_at)},
            "issuedAt": {"$gt": to_bson_ts(throttle_since)},
        };
        // equality fields of the filter are copied into an upserted document
        let mut fields = bson::to_document(record)?;
        fields.remove("address");
        fields.remove("consumed");
        let update = doc! {"$setOnInsert": fields};
        let mut options = FindOneAndUpdateOptions::default();
        options.upsert = Some(true);
        options.sort = Some(newest_first());
        options.return_document = Some(ReturnDocument::After);
        let stored = self
            .db
            .find_one_and_update::<OtpRecord>(
                &self.db_name,
                COLL_OTP,
                filter,
                update,
                Some(options),
            )
            .await?
            .ok_or_else(|| anyhow::anyhow!("Upsert of otp for {} returned nothing", record.address))?;

        // salted hashes differ, so a matching hash is the document just inserted
        if stored.code_hash != record.code_hash {
            return Ok(InsertOutcome::Throttled(stored));
        }
        let id = stored
            .id
            .ok_or_else(|| anyhow::anyhow!("Otp record for {} has no id", record.address))?;
        Ok(InsertOutcome::Inserted(id))
    }

    async fn increment_attempts(&self, id: &ObjectId) -> anyhow::Result<Option<OtpRecord>> {
        let filter = doc! {"_id": *id};
        let update = doc! {"$inc": {"attempts": 1}};
        let mut options = FindOneAndUpdateOptions::default();
        options.return_document = Some(ReturnDocument::After);
        let record = self
            .db
            .find_one_and_update::<OtpRecord>(
                &self.db_name,
                COLL_OTP,
                filter,
                update,
                Some(options),
            )
            .await?;
        Ok(record)
    }

    async fn mark_consumed(&self, id: &ObjectId, now: u64) -> anyhow::Result<bool> {
        let filter = doc! {"_id": *id, "consumed": false};
        let update = doc! {"$set": {"consumed": true, "consumedAt": to_bson_ts(now)}};
        let matched = self
            .db
            .update_one(&self.db_name, COLL_OTP, filter, update, None)
            .await?;
        Ok(matched > 0)
    }

    async fn delete_by_id(&self, id: &ObjectId) -> anyhow::Result<bool> {
        let filter = doc! {"_id": *id};
        let deleted = self
            .db
            .delete_one(&self.db_name, COLL_OTP, filter, None)
            .await?;
        Ok(deleted > 0)
    }

    async fn delete_expired_before(&self, cut_off: u64) -> anyhow::Result<u64> {
        let filter = doc! {"expiresAt": {"$lt": to_bson_ts(cut_off)}};
        let deleted = self
            .db
            .delete_many(&self.db_name, COLL_OTP, filter, None)
            .await?;
        Ok(deleted)
    }
}

/// Newest record first, the later insert wins a tie
fn newest_first() -> Document {
    doc! {"issuedAt": -1, "_id": -1}
}

#[cfg(test)]
mod tests {
    use mockall::predicate::{eq, function};
    use mongodb::{
        bson::Bson,
        options::{DeleteOptions, UpdateOptions},
    };
    use std::time::Duration;

    use super::*;

    const TEST_DB: &str = "testdb";

    fn sample_record() -> OtpRecord {
        OtpRecord::new("user@venue.com", "hash".into(), 5_000, Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_find_live_by_address() {
        let filter = Some(doc! {
            "address": "user@venue.com",
            "consumed": false,
            "expiresAt": {"$gt": 5_000_i64},
        });
        let check_options = function(|options: &Option<FindOneOptions>| {
            options
                .as_ref()
                .and_then(|option| option.sort.clone())
                .map(|sort| sort == doc! {"issuedAt": -1, "_id": -1})
                .unwrap_or(false)
        });
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_find_one::<OtpRecord>()
            .with(eq(TEST_DB), eq(COLL_OTP), eq(filter), check_options)
            .times(1)
            .returning(|_, _, _, _| Ok(Some(sample_record())));
        let store = MongoOtpStore::new(Arc::new(mock_db), TEST_DB);
        let record = store
            .find_live_by_address("user@venue.com", 5_000)
            .await
            .unwrap();
        assert_eq!(record, Some(sample_record()));
    }

    #[tokio::test]
    async fn test_insert_returns_object_id() {
        let oid = ObjectId::new();
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_insert_one::<OtpRecord>()
            .withf(|_, _, record, options| {
                record.address == "user@venue.com" && record.attempts == 0 && options.is_none()
            })
            .times(1)
            .returning(move |_, _, _, _| Ok(Bson::ObjectId(oid)));
        let store = MongoOtpStore::new(Arc::new(mock_db), TEST_DB);
        let id = store.insert(&sample_record()).await.unwrap();
        assert_eq!(id, oid);
    }

    #[tokio::test]
    async fn test_insert_unexpected_id() {
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_insert_one::<OtpRecord>()
            .times(1)
            .returning(|_, _, _, _| Ok(Bson::String("abc".into())));
        let store = MongoOtpStore::new(Arc::new(mock_db), TEST_DB);
        let result = store.insert(&sample_record()).await;
        assert_eq!(result.is_err(), true);
    }

    fn check_upsert_options() -> impl Fn(&Option<FindOneAndUpdateOptions>) -> bool {
        |options: &Option<FindOneAndUpdateOptions>| {
            options
                .as_ref()
                .map(|option| {
                    option.upsert == Some(true)
                        && option.sort == Some(doc! {"issuedAt": -1, "_id": -1})
                        && matches!(option.return_document, Some(ReturnDocument::After))
                })
                .unwrap_or(false)
        }
    }

    #[tokio::test]
    async fn test_insert_unless_throttled_inserts() {
        let oid = ObjectId::new();
        let filter = doc! {
            "address": "user@venue.com",
            "consumed": false,
            "expiresAt": {"$gt": 5_000_i64},
            "issuedAt": {"$gt": 1_000_i64},
        };
        let check_update = function(|update: &Document| {
            update
                .get_document("$setOnInsert")
                .map(|fields| {
                    fields.get_str("codeHash").map(|hash| hash == "hash").unwrap_or(false)
                        && !fields.contains_key("address")
                        && !fields.contains_key("consumed")
                        && !fields.contains_key("_id")
                })
                .unwrap_or(false)
        });
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_find_one_and_update::<OtpRecord>()
            .with(
                eq(TEST_DB),
                eq(COLL_OTP),
                eq(filter),
                check_update,
                function(check_upsert_options()),
            )
            .times(1)
            .returning(move |_, _, _, _, _| {
                let mut record = sample_record();
                record.id = Some(oid);
                Ok(Some(record))
            });
        let store = MongoOtpStore::new(Arc::new(mock_db), TEST_DB);
        let outcome = store
            .insert_unless_throttled(&sample_record(), 1_000)
            .await
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted(oid));
    }

    #[tokio::test]
    async fn test_insert_unless_throttled_returns_existing() {
        let mut existing = sample_record();
        existing.id = Some(ObjectId::new());
        existing.code_hash = "other hash".into();
        let returned = existing.clone();
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_find_one_and_update::<OtpRecord>()
            .times(1)
            .returning(move |_, _, _, _, _| Ok(Some(returned.clone())));
        let store = MongoOtpStore::new(Arc::new(mock_db), TEST_DB);
        let outcome = store
            .insert_unless_throttled(&sample_record(), 1_000)
            .await
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Throttled(existing));
    }

    #[tokio::test]
    async fn test_increment_attempts() {
        let oid = ObjectId::new();
        let filter = doc! {"_id": oid};
        let update = doc! {"$inc": {"attempts": 1}};
        let check_options = function(|options: &Option<FindOneAndUpdateOptions>| {
            options
                .as_ref()
                .and_then(|option| option.return_document.as_ref())
                .map(|rd| matches!(rd, ReturnDocument::After))
                .unwrap_or(false)
        });
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_find_one_and_update::<OtpRecord>()
            .with(eq(TEST_DB), eq(COLL_OTP), eq(filter), eq(update), check_options)
            .times(1)
            .returning(|_, _, _, _, _| {
                let mut record = sample_record();
                record.attempts = 1;
                Ok(Some(record))
            });
        let store = MongoOtpStore::new(Arc::new(mock_db), TEST_DB);
        let record = store.increment_attempts(&oid).await.unwrap().unwrap();
        assert_eq!(record.attempts, 1);
    }

    #[tokio::test]
    async fn test_mark_consumed() {
        let oid = ObjectId::new();
        let filter = doc! {"_id": oid, "consumed": false};
        let update = doc! {"$set": {"consumed": true, "consumedAt": 9_000_i64}};
        let check_none = function(|options: &Option<UpdateOptions>| options.is_none());
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_update_one()
            .with(eq(TEST_DB), eq(COLL_OTP), eq(filter), eq(update), check_none)
            .times(2)
            .returning({
                let mut calls = 0;
                move |_, _, _, _, _| {
                    calls += 1;
                    // second caller loses the race
                    Ok(if calls == 1 { 1 } else { 0 })
                }
            });
        let store = MongoOtpStore::new(Arc::new(mock_db), TEST_DB);
        assert_eq!(store.mark_consumed(&oid, 9_000).await.unwrap(), true);
        assert_eq!(store.mark_consumed(&oid, 9_000).await.unwrap(), false);
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let oid = ObjectId::new();
        let filter = doc! {"_id": oid};
        let check_none = function(|options: &Option<DeleteOptions>| options.is_none());
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_delete_one()
            .with(eq(TEST_DB), eq(COLL_OTP), eq(filter), check_none)
            .times(1)
            .returning(|_, _, _, _| Ok(1));
        let store = MongoOtpStore::new(Arc::new(mock_db), TEST_DB);
        assert_eq!(store.delete_by_id(&oid).await.unwrap(), true);
    }

    #[tokio::test]
    async fn test_delete_expired_before() {
        let filter = doc! {"expiresAt": {"$lt": 42_000_i64}};
        let check_none = function(|options: &Option<DeleteOptions>| options.is_none());
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_delete_many()
            .with(eq(TEST_DB), eq(COLL_OTP), eq(filter), check_none)
            .times(1)
            .returning(|_, _, _, _| Ok(3));
        let store = MongoOtpStore::new(Arc::new(mock_db), TEST_DB);
        assert_eq!(store.delete_expired_before(42_000).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_find_one::<OtpRecord>()
            .times(1)
            .returning(|_, _, _, _| {
                let err = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
                Err(mongodb::error::Error::from(err))
            });
        let store = MongoOtpStore::new(Arc::new(mock_db), TEST_DB);
        let result = store.find_live_by_address("user@venue.com", 0).await;
        assert_eq!(result.is_err(), true);
    }
}
