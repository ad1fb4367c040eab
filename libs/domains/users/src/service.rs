//! User Service - profile CRUD and password changes

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, UpdateUser, User, UserFilter, UserList, UserResponse};
use crate::password::{hash_password, verify_password};
use crate::repository::UserRepository;
use crate::validation::{check, validate_password};

pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    /// Share one repository between this service and [`AuthService`](crate::AuthService).
    pub fn from_shared(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> Arc<R> {
        Arc::clone(&self.repository)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: CreateUser) -> UserResult<UserResponse> {
        input.validate()?;

        if self.repository.email_exists(&input.email).await? {
            return Err(UserError::DuplicateEmail);
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(input.name, input.email, Some(password_hash), input.role);

        let created = self.repository.create(user).await?;
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> UserResult<UserResponse> {
        Ok(self.find(id).await?.into())
    }

    /// Whether a user with this id exists; used to resolve references from other domains.
    #[instrument(skip(self))]
    pub async fn find_user(&self, id: Uuid) -> UserResult<Option<UserResponse>> {
        Ok(self.repository.get_by_id(id).await?.map(Into::into))
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self, filter: UserFilter) -> UserResult<UserList> {
        let filter = filter.normalized();
        let total = self.repository.count(filter.clone()).await?;
        let users = self.repository.list(filter.clone()).await?;

        Ok(UserList {
            users: users.into_iter().map(Into::into).collect(),
            total,
            page: filter.page,
            limit: filter.limit,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> UserResult<UserResponse> {
        input.validate()?;

        let mut user = self.find(id).await?;

        if let Some(ref new_email) = input.email {
            if !new_email.trim().eq_ignore_ascii_case(&user.email)
                && self.repository.email_exists(new_email).await?
            {
                return Err(UserError::DuplicateEmail);
            }
        }

        user.apply_update(input);
        let updated = self.repository.update(user).await?;
        Ok(updated.into())
    }

    /// Change the password after checking the current one. On any failure the
    /// stored hash is left untouched.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn update_password(
        &self,
        id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> UserResult<UserResponse> {
        if current_password.trim().is_empty() || new_password.trim().is_empty() {
            return Err(UserError::Validation(
                "Please provide current and new passwords".to_string(),
            ));
        }

        let mut user = self.find(id).await?;

        let stored = user.password.as_deref().ok_or_else(|| {
            UserError::Validation(
                "This user has no password set. Please set a password first.".to_string(),
            )
        })?;

        if !verify_password(current_password, stored)? {
            return Err(UserError::IncorrectPassword);
        }

        check(validate_password(new_password))?;

        user.set_password_hash(hash_password(new_password)?);
        let updated = self.repository.update(user).await?;

        tracing::info!(user_id = %id, "Password updated");
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> UserResult<()> {
        if !self.repository.delete(id).await? {
            return Err(UserError::NotFound(id));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
