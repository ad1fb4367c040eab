//! Location Service - validation, geocoding and lookups

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{LocationError, LocationResult};
use crate::geocoder::Geocoder;
use crate::models::{
    COORDINATE_TOLERANCE, CoordinateSearch, CreateLocation, Location, LocationFilter,
    LocationList, LocationResponse, UpdateLocation,
};
use crate::repository::LocationRepository;
use crate::validation::address_tokens;

pub struct LocationService<R: LocationRepository> {
    repository: Arc<R>,
    geocoder: Arc<dyn Geocoder>,
}

impl<R: LocationRepository> LocationService<R> {
    pub fn new(repository: R, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            repository: Arc::new(repository),
            geocoder,
        }
    }

    /// Validate, geocode, then persist. Nothing is stored if geocoding fails.
    #[instrument(skip(self, input), fields(country = %input.country, city = %input.city))]
    pub async fn create_location(&self, input: CreateLocation) -> LocationResult<LocationResponse> {
        input.validate()?;

        let draft = Location::new(input, Default::default());
        let coordinates = self.geocoder.geocode(&draft.address().query_string()).await?;

        let mut location = draft;
        location.set_coordinates(coordinates);
        let created = self.repository.create(location).await?;
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn get_location(&self, id: Uuid) -> LocationResult<LocationResponse> {
        Ok(self.find(id).await?.into())
    }

    /// The stored location, if any; used to resolve event references.
    #[instrument(skip(self))]
    pub async fn find_location(&self, id: Uuid) -> LocationResult<Option<Location>> {
        self.repository.get_by_id(id).await
    }

    #[instrument(skip(self))]
    pub async fn list_locations(&self, filter: LocationFilter) -> LocationResult<LocationList> {
        let filter = filter.normalized();
        let total = self.repository.count(filter.clone()).await?;
        let locations = self.repository.list(filter.clone()).await?;

        Ok(LocationList {
            locations: locations.into_iter().map(Into::into).collect(),
            total,
            page: filter.page,
            limit: filter.limit,
        })
    }

    #[instrument(skip(self))]
    pub async fn find_by_address(&self, address: &str) -> LocationResult<Vec<LocationResponse>> {
        let tokens = address_tokens(address);
        if tokens.is_empty() {
            return Err(LocationError::Validation(
                "Address information is required".to_string(),
            ));
        }

        let found = self.repository.find_by_address(tokens).await?;
        if found.is_empty() {
            return Err(LocationError::NoMatch(
                "No locations found matching the given address information.".to_string(),
            ));
        }
        Ok(found.into_iter().map(Into::into).collect())
    }

    /// Locations within ±0.5° of the given latitude and/or longitude.
    #[instrument(skip(self))]
    pub async fn find_by_coordinates(
        &self,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> LocationResult<Vec<LocationResponse>> {
        if latitude.is_none() && longitude.is_none() {
            return Err(LocationError::Validation(
                "Latitude or longitude is required".to_string(),
            ));
        }

        let search = CoordinateSearch {
            latitude,
            longitude,
            tolerance: COORDINATE_TOLERANCE,
        };
        let found = self.repository.find_by_coordinates(search).await?;
        if found.is_empty() {
            return Err(LocationError::NoMatch(
                "No locations found near the given coordinates.".to_string(),
            ));
        }
        Ok(found.into_iter().map(Into::into).collect())
    }

    /// Partial update; coordinates are recomputed when the address changes.
    #[instrument(skip(self, input))]
    pub async fn update_location(
        &self,
        id: Uuid,
        input: UpdateLocation,
    ) -> LocationResult<LocationResponse> {
        input.validate()?;

        let mut location = self.find(id).await?;
        if location.apply_update(input) {
            let coordinates = self
                .geocoder
                .geocode(&location.address().query_string())
                .await?;
            location.set_coordinates(coordinates);
            tracing::debug!(location_id = %id, "address changed, coordinates refreshed");
        }

        let updated = self.repository.update(location).await?;
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_location(&self, id: Uuid) -> LocationResult<()> {
        if !self.repository.delete(id).await? {
            return Err(LocationError::NotFound(id));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> LocationResult<Location> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(LocationError::NotFound(id))
    }
}

impl<R: LocationRepository> Clone for LocationService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            geocoder: Arc::clone(&self.geocoder),
        }
    }
}
