use anyhow::Context;
use mongodb::bson::{Bson, Document};
use mongodb::error::Result as MongoResult;
use mongodb::options::{
    ClientOptions, DeleteOptions, FindOneAndUpdateOptions, FindOneOptions, InsertOneOptions,
    UpdateOptions,
};
use mongodb::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use crate::{constants::*, utils::env_or};

/// Create the mongodb client from the environment parameters
pub async fn connect() -> anyhow::Result<Client> {
    let uri = std::env::var("MONGODB_URI").context("MONGODB_URI not found in .env file")?;
    let min_pool = env_or("MONGODB_MIN_POOL_SIZE", MONGO_MIN_POOL_SIZE);
    let max_pool = env_or("MONGODB_MAX_POOL_SIZE", MONGO_MAX_POOL_SIZE);
    let timeout = Duration::from_secs(MONGO_CONN_TIMEOUT);
    let mut client_options = ClientOptions::parse(uri).await?;
    client_options.max_pool_size = Some(max_pool);
    client_options.min_pool_size = Some(min_pool);
    client_options.connect_timeout = Some(timeout);
    let client = Client::with_options(client_options)?;
    Ok(client)
}

/// Thin wrapper over the mongodb client.
/// Results are reduced to plain values so that the wrapper can be mocked in tests.
pub struct AppDatabase(Client);

#[cfg_attr(test, automock)]
impl AppDatabase {
    pub fn from_client(client: Client) -> Self {
        Self(client)
    }

    pub async fn find_one<T>(
        &self,
        db: &str,
        coll: &str,
        filter: Option<Document>,
        options: Option<FindOneOptions>,
    ) -> MongoResult<Option<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync + 'static,
    {
        let coll = self.0.database(db).collection::<T>(coll);
        coll.find_one(filter, options).await
    }

    /// Insert a document and return the generated `_id`
    pub async fn insert_one<T>(
        &self,
        db: &str,
        coll: &str,
        doc: &T,
        options: Option<InsertOneOptions>,
    ) -> MongoResult<Bson>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let coll = self.0.database(db).collection::<T>(coll);
        let result = coll.insert_one(doc, options).await?;
        Ok(result.inserted_id)
    }

    pub async fn find_one_and_update<T>(
        &self,
        db: &str,
        coll: &str,
        filter: Document,
        update: Document,
        options: Option<FindOneAndUpdateOptions>,
    ) -> MongoResult<Option<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync + 'static,
    {
        let coll = self.0.database(db).collection::<T>(coll);
        coll.find_one_and_update(filter, update, options).await
    }

    /// Update one document and return the matched count
    pub async fn update_one(
        &self,
        db: &str,
        coll: &str,
        filter: Document,
        update: Document,
        options: Option<UpdateOptions>,
    ) -> MongoResult<u64> {
        let coll = self.0.database(db).collection::<Document>(coll);
        let result = coll.update_one(filter, update, options).await?;
        Ok(result.matched_count)
    }

    /// Delete one document and return the deleted count
    pub async fn delete_one(
        &self,
        db: &str,
        coll: &str,
        filter: Document,
        options: Option<DeleteOptions>,
    ) -> MongoResult<u64> {
        let coll = self.0.database(db).collection::<Document>(coll);
        let result = coll.delete_one(filter, options).await?;
        Ok(result.deleted_count)
    }

    pub async fn delete_many(
        &self,
        db: &str,
        coll: &str,
        filter: Document,
        options: Option<DeleteOptions>,
    ) -> MongoResult<u64> {
        let coll = self.0.database(db).collection::<Document>(coll);
        let result = coll.delete_many(filter, options).await?;
        Ok(result.deleted_count)
    }
}
