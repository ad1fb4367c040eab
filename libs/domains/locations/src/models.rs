use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::countries::canonical_country;
use crate::validation::{validate_address_part, validate_city, validate_country, validate_post_code};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Search window around a coordinate, in degrees.
pub const COORDINATE_TOLERANCE: f64 = 0.5;

/// Location document as stored in MongoDB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub country: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_number: Option<String>,
    /// Always derived from the address by the geocoder
    pub latitude: f64,
    pub longitude: f64,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Location {
    pub fn new(input: CreateLocation, coordinates: Coordinates) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            country: country_name(&input.country),
            city: input.city.trim().to_string(),
            post_code: clean(input.post_code),
            district: clean(input.district),
            ward: clean(input.ward),
            street: clean(input.street),
            address_number: clean(input.address_number),
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update. Returns whether any address field changed, in which
    /// case the caller must re-geocode.
    pub fn apply_update(&mut self, update: UpdateLocation) -> bool {
        let before = self.clone();

        if let Some(country) = update.country {
            self.country = country_name(&country);
        }
        if let Some(city) = update.city {
            self.city = city.trim().to_string();
        }
        if update.post_code.is_some() {
            self.post_code = clean(update.post_code);
        }
        if update.district.is_some() {
            self.district = clean(update.district);
        }
        if update.ward.is_some() {
            self.ward = clean(update.ward);
        }
        if update.street.is_some() {
            self.street = clean(update.street);
        }
        if update.address_number.is_some() {
            self.address_number = clean(update.address_number);
        }
        self.updated_at = Utc::now();

        self.address() != before.address()
    }

    pub fn set_coordinates(&mut self, coordinates: Coordinates) {
        self.latitude = coordinates.latitude;
        self.longitude = coordinates.longitude;
    }

    /// Address parts from most to least specific.
    pub fn address(&self) -> Address<'_> {
        Address {
            address_number: self.address_number.as_deref(),
            street: self.street.as_deref(),
            ward: self.ward.as_deref(),
            district: self.district.as_deref(),
            city: &self.city,
            post_code: self.post_code.as_deref(),
            country: &self.country,
        }
    }
}

/// Reference spelling when the country is known.
fn country_name(raw: &str) -> String {
    canonical_country(raw).unwrap_or(raw.trim()).to_string()
}

/// Empty strings become `None`.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Borrowed view of a location's address
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Address<'a> {
    pub address_number: Option<&'a str>,
    pub street: Option<&'a str>,
    pub ward: Option<&'a str>,
    pub district: Option<&'a str>,
    pub city: &'a str,
    pub post_code: Option<&'a str>,
    pub country: &'a str,
}

impl Address<'_> {
    /// `number, street, ward, district, city, post_code, country`, blanks omitted.
    pub fn query_string(&self) -> String {
        [
            self.address_number,
            self.street,
            self.ward,
            self.district,
            Some(self.city),
            self.post_code,
            Some(self.country),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Location as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationResponse {
    pub id: Uuid,
    pub country: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_number: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Location> for LocationResponse {
    fn from(location: Location) -> Self {
        Self {
            id: location.id,
            country: location.country,
            city: location.city,
            post_code: location.post_code,
            district: location.district,
            ward: location.ward,
            street: location.street,
            address_number: location.address_number,
            latitude: location.latitude,
            longitude: location.longitude,
            created_at: location.created_at,
            updated_at: location.updated_at,
        }
    }
}

/// DTO for creating a location. Coordinates are not accepted; they are geocoded.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateLocation {
    #[serde(default)]
    #[validate(custom(function = "validate_country"))]
    pub country: String,
    #[serde(default)]
    #[validate(custom(function = "validate_city"))]
    pub city: String,
    #[validate(custom(function = "validate_post_code"))]
    pub post_code: Option<String>,
    #[validate(custom(function = "validate_address_part"))]
    pub district: Option<String>,
    #[validate(custom(function = "validate_address_part"))]
    pub ward: Option<String>,
    #[validate(custom(function = "validate_address_part"))]
    pub street: Option<String>,
    #[validate(custom(function = "validate_address_part"))]
    pub address_number: Option<String>,
}

/// DTO for a partial update
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLocation {
    #[validate(custom(function = "validate_country"))]
    pub country: Option<String>,
    #[validate(custom(function = "validate_city"))]
    pub city: Option<String>,
    #[validate(custom(function = "validate_post_code"))]
    pub post_code: Option<String>,
    #[validate(custom(function = "validate_address_part"))]
    pub district: Option<String>,
    #[validate(custom(function = "validate_address_part"))]
    pub ward: Option<String>,
    #[validate(custom(function = "validate_address_part"))]
    pub street: Option<String>,
    #[validate(custom(function = "validate_address_part"))]
    pub address_number: Option<String>,
}

/// Query filters for listing locations
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct LocationFilter {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Exact country, case-insensitive
    pub country: Option<String>,
    /// Exact city, case-insensitive
    pub city: Option<String>,
}

impl Default for LocationFilter {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            country: None,
            city: None,
        }
    }
}

fn default_page() -> u64 {
    DEFAULT_PAGE
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl LocationFilter {
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_LIMIT);
        self
    }

    pub fn skip(&self) -> u64 {
        database::page_skip(self.page, self.limit)
    }
}

/// Paginated list of locations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationList {
    pub locations: Vec<LocationResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AddressQuery {
    /// Free text, e.g. `Mannerheimintie 5, Helsinki`
    pub address: Option<String>,
}

/// Raw query values; parsed by the handler so non-numbers map to 400
#[derive(Debug, Deserialize, IntoParams)]
pub struct CoordinatesQuery {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

/// Bounding-box search around one or both coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSearch {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tolerance: f64,
}

impl CoordinateSearch {
    pub fn matches(&self, location: &Location) -> bool {
        let within = |wanted: Option<f64>, actual: f64| {
            wanted.is_none_or(|w| (actual - w).abs() <= self.tolerance)
        };
        within(self.latitude, location.latitude) && within(self.longitude, location.longitude)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helsinki() -> Location {
        Location::new(
            CreateLocation {
                country: " Finland ".into(),
                city: "Helsinki".into(),
                post_code: Some("00100".into()),
                street: Some("Mannerheimintie".into()),
                address_number: Some("5".into()),
                district: Some("  ".into()),
                ..Default::default()
            },
            Coordinates {
                latitude: 60.17,
                longitude: 24.94,
            },
        )
    }

    #[test]
    fn test_country_uses_reference_spelling() {
        let mut location = helsinki();
        assert_eq!(location.country, "Finland");
        location.apply_update(UpdateLocation {
            country: Some("SWEDEN".into()),
            ..Default::default()
        });
        assert_eq!(location.country, "Sweden");
    }

    #[test]
    fn test_query_string_skips_blanks() {
        assert_eq!(
            helsinki().address().query_string(),
            "5, Mannerheimintie, Helsinki, 00100, Finland"
        );
    }

    #[test]
    fn test_apply_update_reports_address_change() {
        let mut location = helsinki();
        assert!(!location.apply_update(UpdateLocation::default()));
        assert!(!location.apply_update(UpdateLocation {
            city: Some("Helsinki".into()),
            ..Default::default()
        }));
        assert!(location.apply_update(UpdateLocation {
            street: Some("Aleksanterinkatu".into()),
            ..Default::default()
        }));
        assert_eq!(location.street.as_deref(), Some("Aleksanterinkatu"));
    }

    #[test]
    fn test_coordinate_search_window() {
        let location = helsinki();
        let near = CoordinateSearch {
            latitude: Some(60.5),
            longitude: None,
            tolerance: COORDINATE_TOLERANCE,
        };
        let far = CoordinateSearch {
            latitude: Some(60.0),
            longitude: Some(25.5),
            tolerance: COORDINATE_TOLERANCE,
        };
        assert!(near.matches(&location));
        assert!(!far.matches(&location));
    }

    #[test]
    fn test_create_requires_country_and_city() {
        let err = CreateLocation::default().validate().unwrap_err();
        let fields = err.field_errors();
        assert!(fields.contains_key("country"));
        assert!(fields.contains_key("city"));
    }
}
