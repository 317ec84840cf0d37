use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::trip::{Continent, Trip};

/// Approximate number of countries in the world.
pub const TOTAL_COUNTRIES: usize = 195;

pub fn haversine_distance(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    const R: f64 = 6372.8; // Radius of the earth in km

    let d_lat = (p2.0 - p1.0).to_radians();
    let d_lon = (p2.1 - p1.1).to_radians();
    let lat1 = p1.0.to_radians();
    let lat2 = p2.0.to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);
    let c = 2. * f64::asin(f64::sqrt(a));

    R * c
}

/// Numbers shown on the dashboard's KPI cards and progress panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub countries: usize,
    pub cities: usize,
    pub trips: usize,
    pub continents: usize,
    pub distance_km: f64,
    pub world_progress: f64,
    pub continent_progress: f64,
}

impl TripSummary {
    pub fn from_trips(trips: &[Trip]) -> Self {
        let countries: HashSet<String> = trips.iter()
            .map(|trip| trip.country.trim().to_lowercase())
            .filter(|country| !country.is_empty())
            .collect();

        let cities: HashSet<(String, String)> = trips.iter()
            .filter(|trip| !trip.city.trim().is_empty())
            .map(|trip| (trip.city.trim().to_lowercase(), trip.country.trim().to_lowercase()))
            .collect();

        let continents: HashSet<Continent> = trips.iter()
            .filter_map(Trip::continent)
            .collect();

        Self {
            countries: countries.len(),
            cities: cities.len(),
            trips: trips.len(),
            continents: continents.len(),
            distance_km: travelled_distance(trips),
            world_progress: 100. * countries.len() as f64 / TOTAL_COUNTRIES as f64,
            continent_progress: 100. * continents.len() as f64 / Continent::ALL.len() as f64,
        }
    }
}

/// Length of the path through all trips in chronological order.
/// Undated trips keep their row order and come after the dated ones.
pub fn travelled_distance(trips: &[Trip]) -> f64 {
    let mut ordered: Vec<&Trip> = trips.iter().collect();
    // Stable sort, None sorts last
    ordered.sort_by_key(|trip| (trip.parsed_date().is_none(), trip.parsed_date()));

    ordered.windows(2)
        .map(|pair| haversine_distance(
            (pair[0].latitude, pair[0].longitude),
            (pair[1].latitude, pair[1].longitude),
        ))
        .sum()
}

#[cfg(test)]
fn trip(city: &str, country: &str, latitude: f64, longitude: f64, date: &str, continent: &str) -> Trip {
    Trip {
        id: "0".into(),
        country: country.into(),
        iso_alpha3: None,
        city: city.into(),
        latitude,
        longitude,
        date: date.into(),
        continent: continent.into(),
    }
}

#[test]
fn haversine_paris_to_london() {
    let distance = haversine_distance((48.8566, 2.3522), (51.5074, -0.1278));
    assert!((distance - 344.).abs() < 2., "got {distance}");
    assert_eq!(haversine_distance((10., 10.), (10., 10.)), 0.);
}

#[test]
fn summary_counts_distinct_values() {
    let trips = vec![
        trip("Paris", "France", 48.8566, 2.3522, "2024-01-01", "Europa"),
        trip("paris", "France", 48.8566, 2.3522, "2024-02-01", "Europe"),
        trip("Lyon", "France", 45.764, 4.8357, "2024-03-01", "Europe"),
        trip("Tokyo", "Japan", 35.6762, 139.6503, "2024-04-01", "Asia"),
        trip("Atlantis", "", 0., 0., "", "Nowhere"),
    ];
    let summary = TripSummary::from_trips(&trips);

    assert_eq!(summary.trips, 5);
    assert_eq!(summary.countries, 2);
    assert_eq!(summary.cities, 4);
    assert_eq!(summary.continents, 2);
    assert!((summary.world_progress - 100. * 2. / 195.).abs() < 1e-9);
    assert!((summary.continent_progress - 100. / 3.).abs() < 1e-9);
}

#[test]
fn distance_follows_dates_not_rows() {
    let paris = trip("Paris", "France", 48.8566, 2.3522, "2024-01-01", "Europe");
    let london = trip("London", "United Kingdom", 51.5074, -0.1278, "2024-02-01", "Europe");
    let lyon = trip("Lyon", "France", 45.764, 4.8357, "2023-12-01", "Europe");

    let chronological = haversine_distance((45.764, 4.8357), (48.8566, 2.3522))
        + haversine_distance((48.8566, 2.3522), (51.5074, -0.1278));
    let distance = travelled_distance(&[paris, london, lyon]);

    assert!((distance - chronological).abs() < 1e-9);
}

#[test]
fn empty_summary_is_zero() {
    let summary = TripSummary::from_trips(&[]);
    assert_eq!(summary.trips, 0);
    assert_eq!(summary.distance_km, 0.);
    assert_eq!(summary.world_progress, 0.);
}
