pub mod constants;
pub mod trip_store;
