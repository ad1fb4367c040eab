use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{User, UserFilter};

/// Repository trait for User persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; a taken email fails with `DuplicateEmail`
    async fn create(&self, user: User) -> UserResult<User>;

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// Case-insensitive lookup
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    async fn get_by_google_id(&self, google_id: &str) -> UserResult<Option<User>>;

    /// Lookup by stored reset-token digest
    async fn get_by_reset_token(&self, digest: &str) -> UserResult<Option<User>>;

    /// One page of users, newest first
    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>>;

    /// Number of users matching the filter, ignoring pagination
    async fn count(&self, filter: UserFilter) -> UserResult<u64>;

    /// Replace a stored user; `NotFound` if it is gone
    async fn update(&self, user: User) -> UserResult<User>;

    async fn delete(&self, id: Uuid) -> UserResult<bool>;

    async fn email_exists(&self, email: &str) -> UserResult<bool>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(user: &User, filter: &UserFilter) -> bool {
        if let Some(role) = filter.role {
            if user.role != role {
                return false;
            }
        }
        if let Some(ref search) = filter.search {
            let needle = search.to_lowercase();
            if !user.name.to_lowercase().contains(&needle)
                && !user.email.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(UserError::DuplicateEmail);
        }

        users.insert(user.id, user.clone());
        tracing::info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    async fn get_by_google_id(&self, google_id: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.google_id.as_deref() == Some(google_id))
            .cloned())
    }

    async fn get_by_reset_token(&self, digest: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.reset_token.as_deref() == Some(digest))
            .cloned())
    }

    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        let users = self.users.read().await;

        let mut result: Vec<User> = users
            .values()
            .filter(|u| Self::matches(u, &filter))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(result
            .into_iter()
            .skip(filter.skip() as usize)
            .take(filter.limit as usize)
            .collect())
    }

    async fn count(&self, filter: UserFilter) -> UserResult<u64> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| Self::matches(u, &filter)).count() as u64)
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id));
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(UserError::DuplicateEmail);
        }

        users.insert(user.id, user.clone());
        tracing::info!(user_id = %user.id, "Updated user");
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let removed = self.users.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(user_id = %id, "Deleted user");
        }
        Ok(removed)
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user(name: &str, email: &str, role: Role) -> User {
        User::new(name.to_string(), email.to_string(), Some("hash".to_string()), role)
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = InMemoryUserRepository::new();
        let created = repo.create(user("Test User", "test@example.com", Role::User)).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "test@example.com");

        assert!(repo.get_by_email("TEST@EXAMPLE.COM").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_error() {
        let repo = InMemoryUserRepository::new();
        repo.create(user("User 1", "test@example.com", Role::User)).await.unwrap();

        let result = repo.create(user("User 2", "Test@example.com", Role::User)).await;
        assert!(matches!(result, Err(UserError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let repo = InMemoryUserRepository::new();
        for i in 0..5 {
            repo.create(user(&format!("Member {i}"), &format!("m{i}@example.com"), Role::User))
                .await
                .unwrap();
        }
        repo.create(user("Olga Organizer", "olga@example.com", Role::Organizer))
            .await
            .unwrap();

        let filter = UserFilter {
            page: 2,
            limit: 2,
            ..Default::default()
        };
        assert_eq!(repo.list(filter.clone()).await.unwrap().len(), 2);
        assert_eq!(repo.count(filter).await.unwrap(), 6);

        let organizers = UserFilter {
            role: Some(Role::Organizer),
            ..Default::default()
        };
        assert_eq!(repo.count(organizers).await.unwrap(), 1);

        let search = UserFilter {
            search: Some("OLGA".to_string()),
            ..Default::default()
        };
        let found = repo.list(search).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].email, "olga@example.com");
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = InMemoryUserRepository::new();
        let result = repo.update(user("Ghost", "ghost@example.com", Role::User)).await;
        assert!(matches!(result, Err(UserError::NotFound(_))));
    }
}
