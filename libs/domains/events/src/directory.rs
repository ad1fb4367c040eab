//! Resolution of the users and locations an event points at.
//!
//! Events only store ids. Creation and summaries need to know that the
//! referenced records exist and how to describe them, and reads embed them.

use async_trait::async_trait;
use domain_locations::{LocationRepository, LocationResponse, LocationService};
use domain_users::{Role, UserRepository, UserService};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{EventError, EventResult};

/// Public view of a user referenced by an event (organizer or attendee)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct Venue {
    /// `number, street, ward, district, city, post_code, country`, blanks omitted
    pub address: String,
    pub location: LocationResponse,
}

impl Venue {
    pub fn id(&self) -> Uuid {
        self.location.id
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PeopleDirectory: Send + Sync {
    async fn person(&self, id: Uuid) -> EventResult<Option<Person>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VenueDirectory: Send + Sync {
    async fn venue(&self, id: Uuid) -> EventResult<Option<Venue>>;
}

#[async_trait]
impl<R: UserRepository> PeopleDirectory for UserService<R> {
    async fn person(&self, id: Uuid) -> EventResult<Option<Person>> {
        let user = self
            .find_user(id)
            .await
            .map_err(|e| EventError::Lookup(e.to_string()))?;
        Ok(user.map(|u| Person {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
        }))
    }
}

#[async_trait]
impl<R: LocationRepository> VenueDirectory for LocationService<R> {
    async fn venue(&self, id: Uuid) -> EventResult<Option<Venue>> {
        let location = self
            .find_location(id)
            .await
            .map_err(|e| EventError::Lookup(e.to_string()))?;
        Ok(location.map(|l| Venue {
            address: l.address().query_string(),
            location: l.into(),
        }))
    }
}

#[cfg(test)]
impl Person {
    pub(crate) fn stub(id: Uuid, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role: Role::Organizer,
        }
    }
}

#[cfg(test)]
impl Venue {
    pub(crate) fn stub(id: Uuid, city: &str) -> Self {
        let now = chrono::Utc::now();
        Self {
            address: format!("{city}, Finland"),
            location: LocationResponse {
                id,
                country: "Finland".to_string(),
                city: city.to_string(),
                post_code: None,
                district: None,
                ward: None,
                street: None,
                address_number: None,
                latitude: 60.17,
                longitude: 24.94,
                created_at: now,
                updated_at: now,
            },
        }
    }
}
