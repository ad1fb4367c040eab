//! MongoDB implementation of LocationRepository

use async_trait::async_trait;
use database::{IndexSpec, stored_bson};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Document, doc},
    options::FindOptions,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{LocationError, LocationResult};
use crate::models::{CoordinateSearch, Location, LocationFilter};
use crate::repository::LocationRepository;

pub const COLLECTION: &str = "locations";

/// Fields a free-text address token is matched against.
const ADDRESS_FIELDS: [&str; 7] = [
    "country",
    "city",
    "post_code",
    "district",
    "ward",
    "street",
    "address_number",
];

pub struct MongoLocationRepository {
    collection: Collection<Location>,
}

impl MongoLocationRepository {
    pub fn new(db: Database) -> Self {
        Self::with_collection(db, COLLECTION)
    }

    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<Location>(collection_name),
        }
    }

    pub fn collection(&self) -> &Collection<Location> {
        &self.collection
    }

    pub fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::new(COLLECTION, doc! { "country": 1, "city": 1 }),
            IndexSpec::new(COLLECTION, doc! { "latitude": 1, "longitude": 1 }),
        ]
    }

    fn id_filter(id: Uuid) -> Document {
        doc! { "_id": stored_bson(&id) }
    }

    fn exact_ci(value: &str) -> Document {
        let pattern = format!("^{}$", regex::escape(value.trim()));
        doc! { "$regex": pattern, "$options": "i" }
    }

    fn build_filter(filter: &LocationFilter) -> Document {
        let mut doc = doc! {};
        if let Some(ref country) = filter.country {
            doc.insert("country", Self::exact_ci(country));
        }
        if let Some(ref city) = filter.city {
            doc.insert("city", Self::exact_ci(city));
        }
        doc
    }

    /// `$and` over tokens, each an `$or` over the address fields.
    fn address_filter(tokens: &[String]) -> Document {
        let clauses: Vec<Document> = tokens
            .iter()
            .map(|token| {
                let pattern = regex::escape(token);
                let any_field: Vec<Document> = ADDRESS_FIELDS
                    .iter()
                    .map(|field| {
                        let mut clause = Document::new();
                        clause.insert(*field, doc! { "$regex": pattern.as_str(), "$options": "i" });
                        clause
                    })
                    .collect();
                doc! { "$or": any_field }
            })
            .collect();
        doc! { "$and": clauses }
    }

    fn coordinate_filter(search: &CoordinateSearch) -> Document {
        let mut doc = doc! {};
        if let Some(lat) = search.latitude {
            doc.insert(
                "latitude",
                doc! { "$gte": lat - search.tolerance, "$lte": lat + search.tolerance },
            );
        }
        if let Some(lng) = search.longitude {
            doc.insert(
                "longitude",
                doc! { "$gte": lng - search.tolerance, "$lte": lng + search.tolerance },
            );
        }
        doc
    }

    fn newest_first() -> Document {
        doc! { "created_at": -1, "_id": -1 }
    }
}

#[async_trait]
impl LocationRepository for MongoLocationRepository {
    #[instrument(skip(self, location), fields(location_id = %location.id))]
    async fn create(&self, location: Location) -> LocationResult<Location> {
        self.collection.insert_one(&location).await?;
        tracing::info!("Location created");
        Ok(location)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> LocationResult<Option<Location>> {
        Ok(self.collection.find_one(Self::id_filter(id)).await?)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: LocationFilter) -> LocationResult<Vec<Location>> {
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
    async fn count(&self, filter: LocationFilter) -> LocationResult<u64> {
        Ok(self
            .collection
            .count_documents(Self::build_filter(&filter))
            .await?)
    }

    #[instrument(skip(self))]
    async fn find_by_address(&self, tokens: Vec<String>) -> LocationResult<Vec<Location>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(Self::address_filter(&tokens))
            .sort(Self::newest_first())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn find_by_coordinates(&self, search: CoordinateSearch) -> LocationResult<Vec<Location>> {
        let cursor = self
            .collection
            .find(Self::coordinate_filter(&search))
            .sort(Self::newest_first())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self, location), fields(location_id = %location.id))]
    async fn update(&self, location: Location) -> LocationResult<Location> {
        let result = self
            .collection
            .replace_one(Self::id_filter(location.id), &location)
            .await?;

        if result.matched_count == 0 {
            return Err(LocationError::NotFound(location.id));
        }

        tracing::info!("Location updated");
        Ok(location)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> LocationResult<bool> {
        let result = self.collection.delete_one(Self::id_filter(id)).await?;
        Ok(result.deleted_count > 0)
    }
}
