use const_format::concatcp;

pub mod store;

pub use store::trip_store::*;

pub const DATA_DIR: &str = "data/";
pub const TRIPS_CSV_PATH: &str = concatcp!(DATA_DIR, "trips.csv");
/// Overrides the location of the trips CSV.
pub const TRIPS_CSV_ENV: &str = "MOP_TRIPS_CSV";

#[derive(Debug, thiserror::Error)]
pub enum TripStoreError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("invalid trip: {0}")]
    InvalidTrip(String),
}
