pub const ID: &str = "id";
pub const COUNTRY: &str = "country";
pub const ISO_ALPHA3: &str = "isoAlpha3";
pub const CITY: &str = "city";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const DATE: &str = "date";
pub const CONTINENT: &str = "continent";

/// Column order of the trips CSV.
pub const HEADER: [&str; 8] = [ID, COUNTRY, ISO_ALPHA3, CITY, LATITUDE, LONGITUDE, DATE, CONTINENT];

pub const CORRUPT_SUFFIX: &str = "corrupt";
