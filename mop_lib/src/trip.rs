use std::{fmt::Display, str::FromStr};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// One recorded visit. Only rows with numeric coordinates ever become a `Trip`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Trip {
    pub id: String,
    pub country: String,
    pub iso_alpha3: Option<String>,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date: String,
    pub continent: String,
}

impl Trip {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let date = self.date.trim();
        DATE_FORMATS.iter()
            .find_map(|format| NaiveDate::parse_from_str(date, format).ok())
    }

    pub fn continent(&self) -> Option<Continent> {
        self.continent.parse().ok()
    }

    /// "{city}, {country}", used as the marker label on the map.
    pub fn label(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Continent {
    America,
    Europe,
    Asia,
    Africa,
    Oceania,
    Antarctica,
}

impl Continent {
    pub const ALL: [Continent; 6] = [
        Continent::America,
        Continent::Europe,
        Continent::Asia,
        Continent::Africa,
        Continent::Oceania,
        Continent::Antarctica,
    ];
}

impl FromStr for Continent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s.trim().to_lowercase().chars()
            .map(|c| match c {
                'á' => 'a',
                'é' => 'e',
                'í' => 'i',
                'ó' => 'o',
                'ú' => 'u',
                c => c,
            })
            .collect();

        match folded.as_str() {
            "america" | "americas" => Ok(Continent::America),
            "europe" | "europa" => Ok(Continent::Europe),
            "asia" => Ok(Continent::Asia),
            "africa" => Ok(Continent::Africa),
            "oceania" => Ok(Continent::Oceania),
            "antarctica" | "antartida" => Ok(Continent::Antarctica),
            _ => Err(format!("Unknown continent: {}", s)),
        }
    }
}

impl Display for Continent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Continent::America => "America",
            Continent::Europe => "Europe",
            Continent::Asia => "Asia",
            Continent::Africa => "Africa",
            Continent::Oceania => "Oceania",
            Continent::Antarctica => "Antarctica",
        };
        write!(f, "{}", name)
    }
}

/// A trip submitted by a user, before an id has been assigned.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewTrip {
    pub country: String,
    #[serde(default)]
    pub iso_alpha3: Option<String>,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub continent: Option<Continent>,
}

impl NewTrip {
    /// Range checks only apply to new data. Rows already on disk are never rejected for this.
    pub fn validate(&self) -> Result<(), String> {
        if self.city.trim().is_empty() {
            return Err("City must not be empty".into());
        }
        if self.country.trim().is_empty() {
            return Err("Country must not be empty".into());
        }
        if !self.latitude.is_finite() || !(-90. ..=90.).contains(&self.latitude) {
            return Err(format!("Latitude {} is outside [-90, 90]", self.latitude));
        }
        if !self.longitude.is_finite() || !(-180. ..=180.).contains(&self.longitude) {
            return Err(format!("Longitude {} is outside [-180, 180]", self.longitude));
        }
        Ok(())
    }

    pub fn into_trip(self, id: i64) -> Trip {
        let date = self.date
            .filter(|date| !date.trim().is_empty())
            .unwrap_or_else(|| Utc::now().date_naive().format("%Y-%m-%d").to_string());

        Trip {
            id: id.to_string(),
            country: self.country.trim().to_owned(),
            iso_alpha3: self.iso_alpha3
                .map(|iso| iso.trim().to_uppercase())
                .filter(|iso| !iso.is_empty()),
            city: self.city.trim().to_owned(),
            latitude: self.latitude,
            longitude: self.longitude,
            date,
            continent: self.continent.map(|c| c.to_string()).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
fn new_trip(latitude: f64, longitude: f64) -> NewTrip {
    NewTrip {
        country: "France".into(),
        iso_alpha3: Some(" fra ".into()),
        city: "Paris".into(),
        latitude,
        longitude,
        date: None,
        continent: Some(Continent::Europe),
    }
}

#[test]
fn continent_accepts_spanish_and_english_names() {
    assert_eq!("Oceanía".parse::<Continent>(), Ok(Continent::Oceania));
    assert_eq!("ÁFRICA".parse::<Continent>(), Ok(Continent::Africa));
    assert_eq!("Antártida".parse::<Continent>(), Ok(Continent::Antarctica));
    assert_eq!(" europe ".parse::<Continent>(), Ok(Continent::Europe));
    assert!("Atlantis".parse::<Continent>().is_err());
}

#[test]
fn parsed_date_accepts_both_formats() {
    let mut trip = new_trip(48.85, 2.35).into_trip(1);
    trip.date = "2024-03-01".into();
    assert_eq!(trip.parsed_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
    trip.date = "01/03/2024".into();
    assert_eq!(trip.parsed_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
    trip.date = "last summer".into();
    assert_eq!(trip.parsed_date(), None);
}

#[test]
fn validate_rejects_out_of_range_coordinates() {
    assert!(new_trip(48.85, 2.35).validate().is_ok());
    assert!(new_trip(90.5, 2.35).validate().is_err());
    assert!(new_trip(48.85, -180.1).validate().is_err());
    assert!(new_trip(f64::NAN, 2.35).validate().is_err());

    let mut blank_city = new_trip(48.85, 2.35);
    blank_city.city = "  ".into();
    assert!(blank_city.validate().is_err());
}

#[test]
fn into_trip_normalizes_fields() {
    let trip = new_trip(48.85, 2.35).into_trip(7);
    assert_eq!(trip.id, "7");
    assert_eq!(trip.iso_alpha3.as_deref(), Some("FRA"));
    assert_eq!(trip.continent, "Europe");
    assert!(trip.parsed_date().is_some());
    assert_eq!(trip.label(), "Paris, France");
}
