use domain_locations::{LocationService, MongoLocationRepository, OpenCageGeocoder};
use std::sync::Arc;

use crate::state::AppState;

pub type Locations = LocationService<MongoLocationRepository>;

pub fn service(state: &AppState) -> eyre::Result<Locations> {
    let geocoder = OpenCageGeocoder::from_env()?;
    Ok(LocationService::new(
        MongoLocationRepository::new(state.db.clone()),
        Arc::new(geocoder),
    ))
}
