//! Locations Domain
//!
//! Venues that events take place at. Every location carries coordinates
//! resolved from its address by a [`Geocoder`]; clients never set them.
//!
//! - CRUD with paginated listing filtered by country/city
//! - Free-text address lookup (`Mannerheimintie 5, Helsinki`)
//! - Bounding-box lookup around a latitude and/or longitude
//!
//! ```rust,ignore
//! use domain_locations::{handlers, InMemoryLocationRepository, LocationService, OpenCageGeocoder};
//!
//! let geocoder = Arc::new(OpenCageGeocoder::from_env()?);
//! let service = LocationService::new(InMemoryLocationRepository::new(), geocoder);
//! let router = handlers::router(service, jwt_auth);
//! ```

pub mod countries;
pub mod error;
pub mod geocoder;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod validation;

pub use error::{LocationError, LocationResult};
pub use geocoder::{Geocoder, OpenCageGeocoder};
pub use models::{
    Coordinates, CreateLocation, Location, LocationFilter, LocationList, LocationResponse,
    UpdateLocation,
};
pub use mongodb::MongoLocationRepository;
pub use repository::{InMemoryLocationRepository, LocationRepository};
pub use service::LocationService;
