use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{LocationError, LocationResult};
use crate::models::{CoordinateSearch, Location, LocationFilter};

/// Repository trait for Location persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn create(&self, location: Location) -> LocationResult<Location>;

    async fn get_by_id(&self, id: Uuid) -> LocationResult<Option<Location>>;

    /// One page of locations, newest first
    async fn list(&self, filter: LocationFilter) -> LocationResult<Vec<Location>>;

    async fn count(&self, filter: LocationFilter) -> LocationResult<u64>;

    /// Locations where every token is a case-insensitive substring of at
    /// least one address field
    async fn find_by_address(&self, tokens: Vec<String>) -> LocationResult<Vec<Location>>;

    async fn find_by_coordinates(&self, search: CoordinateSearch) -> LocationResult<Vec<Location>>;

    /// Replace a stored location; `NotFound` if it is gone
    async fn update(&self, location: Location) -> LocationResult<Location>;

    async fn delete(&self, id: Uuid) -> LocationResult<bool>;
}

/// In-memory implementation of LocationRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryLocationRepository {
    locations: Arc<RwLock<HashMap<Uuid, Location>>>,
}

impl InMemoryLocationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(location: &Location, filter: &LocationFilter) -> bool {
        let same = |wanted: &Option<String>, actual: &str| {
            wanted
                .as_deref()
                .is_none_or(|w| w.trim().eq_ignore_ascii_case(actual))
        };
        same(&filter.country, &location.country) && same(&filter.city, &location.city)
    }

    fn matches_tokens(location: &Location, tokens: &[String]) -> bool {
        let address = location.address();
        let fields: Vec<String> = [
            Some(address.country),
            Some(address.city),
            address.post_code,
            address.district,
            address.ward,
            address.street,
            address.address_number,
        ]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .collect();

        tokens.iter().all(|token| {
            let token = token.to_lowercase();
            fields.iter().any(|field| field.contains(&token))
        })
    }

    fn sorted(mut locations: Vec<Location>) -> Vec<Location> {
        locations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        locations
    }
}

#[async_trait]
impl LocationRepository for InMemoryLocationRepository {
    async fn create(&self, location: Location) -> LocationResult<Location> {
        self.locations
            .write()
            .await
            .insert(location.id, location.clone());
        tracing::info!(location_id = %location.id, "Created location");
        Ok(location)
    }

    async fn get_by_id(&self, id: Uuid) -> LocationResult<Option<Location>> {
        Ok(self.locations.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: LocationFilter) -> LocationResult<Vec<Location>> {
        let locations = self.locations.read().await;
        let matching = locations
            .values()
            .filter(|l| Self::matches(l, &filter))
            .cloned()
            .collect();

        Ok(Self::sorted(matching)
            .into_iter()
            .skip(filter.skip() as usize)
            .take(filter.limit as usize)
            .collect())
    }

    async fn count(&self, filter: LocationFilter) -> LocationResult<u64> {
        let locations = self.locations.read().await;
        Ok(locations
            .values()
            .filter(|l| Self::matches(l, &filter))
            .count() as u64)
    }

    async fn find_by_address(&self, tokens: Vec<String>) -> LocationResult<Vec<Location>> {
        let locations = self.locations.read().await;
        Ok(Self::sorted(
            locations
                .values()
                .filter(|l| Self::matches_tokens(l, &tokens))
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_coordinates(&self, search: CoordinateSearch) -> LocationResult<Vec<Location>> {
        let locations = self.locations.read().await;
        Ok(Self::sorted(
            locations
                .values()
                .filter(|l| search.matches(l))
                .cloned()
                .collect(),
        ))
    }

    async fn update(&self, location: Location) -> LocationResult<Location> {
        let mut locations = self.locations.write().await;
        if !locations.contains_key(&location.id) {
            return Err(LocationError::NotFound(location.id));
        }
        locations.insert(location.id, location.clone());
        tracing::info!(location_id = %location.id, "Updated location");
        Ok(location)
    }

    async fn delete(&self, id: Uuid) -> LocationResult<bool> {
        let removed = self.locations.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(location_id = %id, "Deleted location");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{COORDINATE_TOLERANCE, Coordinates, CreateLocation};

    fn location(country: &str, city: &str, street: Option<&str>, lat: f64, lng: f64) -> Location {
        Location::new(
            CreateLocation {
                country: country.into(),
                city: city.into(),
                street: street.map(Into::into),
                ..Default::default()
            },
            Coordinates {
                latitude: lat,
                longitude: lng,
            },
        )
    }

    #[tokio::test]
    async fn test_address_tokens_must_all_match() {
        let repo = InMemoryLocationRepository::new();
        repo.create(location("Finland", "Helsinki", Some("Mannerheimintie"), 60.17, 24.94))
            .await
            .unwrap();
        repo.create(location("Finland", "Espoo", Some("Tapiontori"), 60.17, 24.80))
            .await
            .unwrap();

        let hits = repo
            .find_by_address(vec!["mannerheim".into(), "FINLAND".into()])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].city, "Helsinki");

        let hits = repo.find_by_address(vec!["finland".into()]).await.unwrap();
        assert_eq!(hits.len(), 2);

        let hits = repo
            .find_by_address(vec!["helsinki".into(), "tapiontori".into()])
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_coordinate_search() {
        let repo = InMemoryLocationRepository::new();
        repo.create(location("Finland", "Helsinki", None, 60.17, 24.94))
            .await
            .unwrap();
        repo.create(location("Finland", "Tampere", None, 61.50, 23.76))
            .await
            .unwrap();

        let hits = repo
            .find_by_coordinates(CoordinateSearch {
                latitude: Some(60.0),
                longitude: None,
                tolerance: COORDINATE_TOLERANCE,
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].city, "Helsinki");
    }

    #[tokio::test]
    async fn test_list_filter_and_count() {
        let repo = InMemoryLocationRepository::new();
        for city in ["Helsinki", "Espoo", "Turku"] {
            repo.create(location("Finland", city, None, 60.0, 24.0))
                .await
                .unwrap();
        }
        repo.create(location("Sweden", "Stockholm", None, 59.3, 18.0))
            .await
            .unwrap();

        let finland = LocationFilter {
            country: Some("finland".into()),
            limit: 2,
            ..Default::default()
        };
        assert_eq!(repo.count(finland.clone()).await.unwrap(), 3);
        assert_eq!(repo.list(finland).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_location() {
        let repo = InMemoryLocationRepository::new();
        let err = repo
            .update(location("Finland", "Oulu", None, 65.0, 25.4))
            .await
            .unwrap_err();
        assert!(matches!(err, LocationError::NotFound(_)));
    }
}
