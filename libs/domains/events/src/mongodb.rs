//! MongoDB implementation of EventRepository

use async_trait::async_trait;
use database::{IndexSpec, stored_bson};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{self, Bson, Document, doc},
    options::FindOptions,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{EventError, EventResult};
use crate::models::{ChatMessage, Event, EventFilter, ScoredEvent};
use crate::repository::EventRepository;

pub const COLLECTION: &str = "events";

/// Atlas vector search index over `summary_embedding`
pub const VECTOR_INDEX: &str = "event_summary_index";

pub struct MongoEventRepository {
    collection: Collection<Event>,
    vector_index: String,
}

impl MongoEventRepository {
    pub fn new(db: Database) -> Self {
        Self::with_collection(db, COLLECTION)
    }

    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<Event>(collection_name),
            vector_index: VECTOR_INDEX.to_string(),
        }
    }

    pub fn with_vector_index(mut self, index: impl Into<String>) -> Self {
        self.vector_index = index.into();
        self
    }

    pub fn collection(&self) -> &Collection<Event> {
        &self.collection
    }

    pub fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::new(COLLECTION, doc! { "name": 1 }).unique(),
            IndexSpec::new(COLLECTION, doc! { "event_type": 1, "date": 1 }),
            IndexSpec::new(COLLECTION, doc! { "organizer": 1 }),
            IndexSpec::new(COLLECTION, doc! { "location": 1 }),
        ]
    }

    fn id_filter(id: Uuid) -> Document {
        doc! { "_id": stored_bson(&id) }
    }

    fn build_filter(filter: &EventFilter) -> Document {
        let mut doc = doc! {};

        if let Some(ref search) = filter.search {
            doc.insert(
                "name",
                doc! { "$regex": regex::escape(search), "$options": "i" },
            );
        }
        if let Some(event_type) = filter.event_type {
            doc.insert("event_type", event_type.to_string());
        }

        let mut price = Document::new();
        if let Some(min) = filter.min_price {
            price.insert("$gte", min);
        }
        if let Some(max) = filter.max_price {
            price.insert("$lte", max);
        }
        if !price.is_empty() {
            doc.insert("price", price);
        }

        if let Some((start, end)) = filter.day_bounds() {
            doc.insert(
                "date",
                doc! {
                    "$gte": bson::DateTime::from_chrono(start),
                    "$lt": bson::DateTime::from_chrono(end),
                },
            );
        }

        if let Some(organizer) = filter.organizer {
            doc.insert("organizer", stored_bson(&organizer));
        }
        if let Some(location) = filter.location {
            doc.insert("location", stored_bson(&location));
        }
        doc
    }

    fn vector_pipeline(&self, embedding: &[f32], limit: usize) -> Vec<Document> {
        let query: Vec<Bson> = embedding
            .iter()
            .map(|v| Bson::Double(f64::from(*v)))
            .collect();
        vec![
            doc! {
                "$vectorSearch": {
                    "index": self.vector_index.as_str(),
                    "path": "summary_embedding",
                    "queryVector": query,
                    "numCandidates": (limit * 10) as i64,
                    "limit": limit as i64,
                }
            },
            doc! { "$addFields": { "score": { "$meta": "vectorSearchScore" } } },
        ]
    }

    fn newest_first() -> Document {
        doc! { "created_at": -1, "_id": -1 }
    }
}

#[async_trait]
impl EventRepository for MongoEventRepository {
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn create(&self, event: Event) -> EventResult<Event> {
        self.collection.insert_one(&event).await?;
        tracing::info!("Event created");
        Ok(event)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> EventResult<Option<Event>> {
        Ok(self.collection.find_one(Self::id_filter(id)).await?)
    }

    #[instrument(skip(self))]
    async fn name_exists(&self, name: &str, except: Option<Uuid>) -> EventResult<bool> {
        let mut filter = doc! { "name": name };
        if let Some(id) = except {
            filter.insert("_id", doc! { "$ne": stored_bson(&id) });
        }
        Ok(self.collection.count_documents(filter).await? > 0)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: EventFilter) -> EventResult<Vec<Event>> {
        let options = FindOptions::builder()
            .limit(filter.limit as i64)
            .skip(filter.skip())
            .sort(Self::newest_first())
            .build();

        let cursor = self
            .collection
            .find(Self::build_filter(&filter))
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: EventFilter) -> EventResult<u64> {
        Ok(self
            .collection
            .count_documents(Self::build_filter(&filter))
            .await?)
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn update(&self, event: Event) -> EventResult<Event> {
        let result = self
            .collection
            .replace_one(Self::id_filter(event.id), &event)
            .await?;

        if result.matched_count == 0 {
            return Err(EventError::NotFound(event.id));
        }

        tracing::info!("Event updated");
        Ok(event)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> EventResult<bool> {
        let result = self.collection.delete_one(Self::id_filter(id)).await?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self, message))]
    async fn push_message(&self, id: Uuid, message: ChatMessage) -> EventResult<bool> {
        let message = stored_bson(&message);
        let result = self
            .collection
            .update_one(Self::id_filter(id), doc! { "$push": { "messages": message } })
            .await?;
        Ok(result.matched_count > 0)
    }

    #[instrument(skip(self, embedding), fields(dimensions = embedding.len()))]
    async fn search_similar(
        &self,
        embedding: Vec<f32>,
        limit: usize,
    ) -> EventResult<Vec<ScoredEvent>> {
        if embedding.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let cursor = self
            .collection
            .aggregate(self.vector_pipeline(&embedding, limit))
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        documents
            .into_iter()
            .map(|document| {
                let score = document.get_f64("score").unwrap_or_default();
                let event: Event = bson::from_document(document)
                    .map_err(|e| EventError::Internal(format!("decode event: {e}")))?;
                Ok(ScoredEvent { event, score })
            })
            .collect()
    }
}
