//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use database::{IndexSpec, is_duplicate_key, stored_bson};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Document, doc},
    options::FindOptions,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{User, UserFilter, normalize_email};
use crate::repository::UserRepository;

pub const COLLECTION: &str = "users";

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: Database) -> Self {
        Self::with_collection(db, COLLECTION)
    }

    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<User>(collection_name),
        }
    }

    pub fn collection(&self) -> &Collection<User> {
        &self.collection
    }

    /// Unique email, unique (sparse) Google id, reset-token lookup.
    pub fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::new(COLLECTION, doc! { "email": 1 }).unique(),
            IndexSpec::new(COLLECTION, doc! { "google_id": 1 }).unique().sparse(),
            IndexSpec::new(COLLECTION, doc! { "reset_token": 1 }).sparse(),
        ]
    }

    fn id_filter(id: Uuid) -> Document {
        doc! { "_id": stored_bson(&id) }
    }

    fn build_filter(filter: &UserFilter) -> Document {
        let mut doc = doc! {};

        if let Some(role) = filter.role {
            doc.insert("role", role.to_string());
        }

        if let Some(ref search) = filter.search {
            let pattern = regex::escape(search.trim());
            doc.insert(
                "$or",
                vec![
                    doc! { "name": { "$regex": pattern.as_str(), "$options": "i" } },
                    doc! { "email": { "$regex": pattern.as_str(), "$options": "i" } },
                ],
            );
        }

        doc
    }

    fn map_write_error(err: mongodb::error::Error) -> UserError {
        if is_duplicate_key(&err) {
            UserError::DuplicateEmail
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create(&self, user: User) -> UserResult<User> {
        self.collection
            .insert_one(&user)
            .await
            .map_err(Self::map_write_error)?;

        tracing::info!("User created");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        Ok(self.collection.find_one(Self::id_filter(id)).await?)
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let filter = doc! { "email": normalize_email(email) };
        Ok(self.collection.find_one(filter).await?)
    }

    #[instrument(skip(self))]
    async fn get_by_google_id(&self, google_id: &str) -> UserResult<Option<User>> {
        Ok(self.collection.find_one(doc! { "google_id": google_id }).await?)
    }

    #[instrument(skip_all)]
    async fn get_by_reset_token(&self, digest: &str) -> UserResult<Option<User>> {
        Ok(self.collection.find_one(doc! { "reset_token": digest }).await?)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        let options = FindOptions::builder()
            .limit(filter.limit as i64)
            .skip(filter.skip())
            .sort(doc! { "created_at": -1, "_id": -1 })
            .build();

        let cursor = self
            .collection
            .find(Self::build_filter(&filter))
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: UserFilter) -> UserResult<u64> {
        Ok(self
            .collection
            .count_documents(Self::build_filter(&filter))
            .await?)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update(&self, user: User) -> UserResult<User> {
        let result = self
            .collection
            .replace_one(Self::id_filter(user.id), &user)
            .await
            .map_err(Self::map_write_error)?;

        if result.matched_count == 0 {
            return Err(UserError::NotFound(user.id));
        }

        tracing::info!("User updated");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let result = self.collection.delete_one(Self::id_filter(id)).await?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        let count = self
            .collection
            .count_documents(doc! { "email": normalize_email(email) })
            .await?;
        Ok(count > 0)
    }
}
