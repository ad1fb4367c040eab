//! MongoDB implementation of ThreadStore

use async_trait::async_trait;
use database::IndexSpec;
use mongodb::{Collection, Database, bson::doc};
use tracing::instrument;

use crate::error::AssistantResult;
use crate::models::Thread;
use crate::repository::ThreadStore;

pub const COLLECTION: &str = "threads";

pub struct MongoThreadStore {
    collection: Collection<Thread>,
}

impl MongoThreadStore {
    pub fn new(db: Database) -> Self {
        Self {
            collection: db.collection::<Thread>(COLLECTION),
        }
    }

    pub fn indexes() -> Vec<IndexSpec> {
        vec![IndexSpec::new(COLLECTION, doc! { "updated_at": -1 })]
    }
}

#[async_trait]
impl ThreadStore for MongoThreadStore {
    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> AssistantResult<Option<Thread>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    #[instrument(skip(self, thread), fields(thread_id = %thread.id))]
    async fn save(&self, thread: Thread) -> AssistantResult<()> {
        self.collection
            .replace_one(doc! { "_id": thread.id.as_str() }, &thread)
            .upsert(true)
            .await?;
        Ok(())
    }
}
