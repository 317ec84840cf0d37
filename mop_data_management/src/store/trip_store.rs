use std::{
    ffi::OsString,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use celes::Country;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use mop_lib::trip::{NewTrip, Trip};

use crate::{TripStoreError, TRIPS_CSV_ENV, TRIPS_CSV_PATH};

use super::constants::*;

/// The trips CSV. Loading never fails on bad data: bad rows are dropped and an
/// unreadable file is moved aside and recreated. Only I/O errors are returned.
#[derive(Debug, Clone)]
pub struct TripStore {
    path: PathBuf,
}

struct Snapshot {
    trips: Vec<Trip>,
    max_id: Option<i64>,
    headers: StringRecord,
}

enum ReadFailure {
    Io(String),
    Corrupt(String),
}

impl From<csv::Error> for ReadFailure {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            ReadFailure::Io(err.to_string())
        } else {
            ReadFailure::Corrupt(err.to_string())
        }
    }
}

impl TripStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$MOP_TRIPS_CSV` if set, otherwise `data/trips.csv` under the project root.
    pub fn default_location() -> Result<Self, TripStoreError> {
        if let Ok(path) = std::env::var(TRIPS_CSV_ENV) {
            return Ok(Self::new(path));
        }

        let root = project_root::get_project_root()
            .map_err(|err| TripStoreError::Storage(format!("Failed to find project root: {}", err)))?;
        Ok(Self::new(root.join(TRIPS_CSV_PATH)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Trip>, TripStoreError> {
        self.snapshot().map(|snapshot| snapshot.trips)
    }

    pub fn append(&self, new_trip: NewTrip) -> Result<Trip, TripStoreError> {
        new_trip.validate().map_err(TripStoreError::InvalidTrip)?;

        if let Some(iso) = new_trip.iso_alpha3.as_deref().map(str::trim).filter(|iso| !iso.is_empty()) {
            if Country::from_alpha3(iso).is_err() {
                return Err(TripStoreError::InvalidTrip(format!("Unknown ISO alpha-3 code: {}", iso)));
            }
        }

        let snapshot = self.snapshot()?;
        let id = match snapshot.max_id {
            None => 1,
            Some(max_id) => max_id.checked_add(1)
                .ok_or_else(|| TripStoreError::Storage(format!("No trip ids left after {} in {:?}", max_id, self.path)))?,
        };
        let trip = new_trip.into_trip(id);

        let needs_newline = fs::read(&self.path)
            .map(|bytes| bytes.last().is_some_and(|last| *last != b'\n'))
            .map_err(|_| TripStoreError::Storage(format!("Failed to read trip file: {:?}", self.path)))?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|_| TripStoreError::Storage(format!("Failed to open trip file: {:?}", self.path)))?;

        if needs_newline {
            file.write_all(b"\n")
                .map_err(|_| TripStoreError::Storage(format!("Failed to write trip file: {:?}", self.path)))?;
        }

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(trip_record(&trip, &snapshot.headers).iter())
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|err| TripStoreError::Storage(format!("Failed to append trip to {:?}: {}", self.path, err)))?;

        tracing::info!("Added trip {} ({})", trip.id, trip.label());
        Ok(trip)
    }

    fn snapshot(&self) -> Result<Snapshot, TripStoreError> {
        if !self.path.exists() {
            tracing::info!("No trip file at {:?}, creating an empty one", self.path);
            self.create_empty()?;
        }

        match self.read() {
            Ok(snapshot) => Ok(snapshot),
            Err(ReadFailure::Io(err)) => Err(TripStoreError::Storage(format!("Failed to read {:?}: {}", self.path, err))),
            Err(ReadFailure::Corrupt(reason)) => {
                tracing::warn!("Trip file {:?} is unreadable ({}), starting over", self.path, reason);
                self.quarantine()?;
                self.create_empty()?;
                Ok(Snapshot { trips: Vec::new(), max_id: None, headers: StringRecord::from(HEADER.to_vec()) })
            }
        }
    }

    fn read(&self) -> Result<Snapshot, ReadFailure> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let headers = reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|header| header.trim() == name);

        let (Some(latitude), Some(longitude)) = (column(LATITUDE), column(LONGITUDE)) else {
            return Err(ReadFailure::Corrupt(format!("header is missing {} or {}", LATITUDE, LONGITUDE)));
        };
        let id = column(ID);
        let country = column(COUNTRY);
        let iso_alpha3 = column(ISO_ALPHA3);
        let city = column(CITY);
        let date = column(DATE);
        let continent = column(CONTINENT);

        let mut trips = Vec::new();
        let mut max_id = None;
        let mut dropped = 0;

        for (row, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => {
                    tracing::debug!("Dropping row {}: {}", row + 1, err);
                    dropped += 1;
                    continue;
                }
            };

            let raw_id = field(&record, id);
            if let Ok(numeric_id) = raw_id.trim().parse::<i64>() {
                max_id = max_id.max(Some(numeric_id));
            }

            let (Some(lat), Some(lon)) = (coerce_coordinate(field(&record, Some(latitude))), coerce_coordinate(field(&record, Some(longitude)))) else {
                tracing::debug!("Dropping row {}: missing or non-numeric coordinates", row + 1);
                dropped += 1;
                continue;
            };

            trips.push(Trip {
                id: raw_id.to_owned(),
                country: field(&record, country).to_owned(),
                iso_alpha3: Some(field(&record, iso_alpha3).trim())
                    .filter(|iso| !iso.is_empty())
                    .map(String::from),
                city: field(&record, city).to_owned(),
                latitude: lat,
                longitude: lon,
                date: field(&record, date).to_owned(),
                continent: field(&record, continent).to_owned(),
            });
        }

        if dropped > 0 {
            tracing::debug!("Loaded {} trips from {:?}, dropped {}", trips.len(), self.path, dropped);
        }

        Ok(Snapshot { trips, max_id, headers })
    }

    fn create_empty(&self) -> Result<(), TripStoreError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|_| TripStoreError::Storage(format!("Failed to create data directory: {:?}", parent)))?;
        }

        let mut writer = WriterBuilder::new()
            .from_path(&self.path)
            .map_err(|err| TripStoreError::Storage(format!("Failed to create {:?}: {}", self.path, err)))?;
        writer.write_record(HEADER)
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|err| TripStoreError::Storage(format!("Failed to write header to {:?}: {}", self.path, err)))
    }

    /// Moves the file to `<file>.corrupt`, or `<file>.corrupt.N` if earlier ones exist.
    fn quarantine(&self) -> Result<(), TripStoreError> {
        let mut base = OsString::from(self.path.as_os_str());
        base.push(".");
        base.push(CORRUPT_SUFFIX);

        let mut target = PathBuf::from(&base);
        let mut attempt = 0;
        while target.exists() {
            attempt += 1;
            let mut numbered = base.clone();
            numbered.push(format!(".{}", attempt));
            target = PathBuf::from(numbered);
        }

        fs::rename(&self.path, &target)
            .map_err(|_| TripStoreError::Storage(format!("Failed to move aside unreadable trip file: {:?}", self.path)))?;
        tracing::warn!("Moved unreadable trip file to {:?}", target);
        Ok(())
    }
}

fn field(record: &StringRecord, column: Option<usize>) -> &str {
    column.and_then(|index| record.get(index)).unwrap_or("")
}

/// Text to coordinate. Empty, non-numeric and NaN all count as missing.
fn coerce_coordinate(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|value| !value.is_nan())
}

/// Fields of `trip` in the column order of `headers`. Unknown columns stay empty.
fn trip_record(trip: &Trip, headers: &StringRecord) -> Vec<String> {
    headers.iter()
        .map(|header| match header.trim() {
            ID => trip.id.clone(),
            COUNTRY => trip.country.clone(),
            ISO_ALPHA3 => trip.iso_alpha3.clone().unwrap_or_default(),
            CITY => trip.city.clone(),
            LATITUDE => trip.latitude.to_string(),
            LONGITUDE => trip.longitude.to_string(),
            DATE => trip.date.clone(),
            CONTINENT => trip.continent.clone(),
            _ => String::new(),
        })
        .collect()
}

#[cfg(test)]
fn store_with(contents: &str) -> (tempfile::TempDir, TripStore) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trips.csv");
    fs::write(&path, contents).unwrap();
    (dir, TripStore::new(path))
}

#[cfg(test)]
fn new_trip(city: &str, iso: Option<&str>) -> NewTrip {
    NewTrip {
        country: "France".into(),
        iso_alpha3: iso.map(String::from),
        city: city.into(),
        latitude: 48.85,
        longitude: 2.35,
        date: Some("2024-05-01".into()),
        continent: None,
    }
}

#[test]
fn missing_file_is_created_with_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("trips.csv");
    let store = TripStore::new(&path);

    assert!(store.load().unwrap().is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), "id,country,isoAlpha3,city,latitude,longitude,date,continent\n");

    assert!(store.load().unwrap().is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), "id,country,isoAlpha3,city,latitude,longitude,date,continent\n");
}

#[test]
fn non_numeric_coordinates_are_dropped() {
    let (_dir, store) = store_with("\
id,country,isoAlpha3,city,latitude,longitude,date,continent
1,France,FRA,Paris,48.85,2.35,2024-01-01,Europa
2,Spain,ESP,Madrid,abc,-3.7,2024-02-01,Europa
3,Japan,JPN,Tokyo,35.68,,2024-03-01,Asia
4,Peru,,Lima,-12.04,-77.04,2024-04-01,América
5,Chile,CHL,Santiago,NaN,-70.6,2024-05-01,América
");
    let trips = store.load().unwrap();

    assert_eq!(trips.iter().map(|trip| trip.id.as_str()).collect::<Vec<_>>(), vec!["1", "4"]);
    assert_eq!(trips[0].iso_alpha3.as_deref(), Some("FRA"));
    assert_eq!(trips[1].iso_alpha3, None);
    assert_eq!(trips[1].label(), "Lima, Peru");
}

#[test]
fn out_of_range_coordinates_pass_through() {
    let (_dir, store) = store_with("\
id,country,isoAlpha3,city,latitude,longitude,date,continent
1,Nowhere,,Void,123.5,-400,2024-01-01,
");
    let trips = store.load().unwrap();

    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].latitude, 123.5);
    assert_eq!(trips[0].longitude, -400.);
}

#[test]
fn load_is_idempotent() {
    let (_dir, store) = store_with("\
id,country,isoAlpha3,city,latitude,longitude,date,continent
1,France,FRA,Paris,48.85,2.35,2024-01-01,Europa
2,Spain,ESP,Madrid,40.42,-3.7,2024-02-01,Europa
");
    assert_eq!(store.load().unwrap(), store.load().unwrap());
}

#[test]
fn short_rows_and_reordered_columns_are_read_by_name() {
    let (_dir, store) = store_with("\
city,latitude,longitude,id
Oslo,59.91,10.75,9
Bergen,60.39
");
    let trips = store.load().unwrap();

    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].city, "Oslo");
    assert_eq!(trips[0].id, "9");
    assert_eq!(trips[0].country, "");
    assert_eq!(trips[0].iso_alpha3, None);
}

#[test]
fn corrupt_file_is_moved_aside_and_recreated() {
    let (dir, store) = store_with("this is not,a trip table\n1,2\n");

    assert!(store.load().unwrap().is_empty());
    assert!(dir.path().join("trips.csv.corrupt").exists());
    assert_eq!(
        fs::read_to_string(store.path()).unwrap(),
        "id,country,isoAlpha3,city,latitude,longitude,date,continent\n"
    );
}

#[test]
fn empty_file_is_recreated() {
    let (_dir, store) = store_with("");

    assert!(store.load().unwrap().is_empty());
    assert!(fs::read_to_string(store.path()).unwrap().starts_with("id,country"));
}

#[test]
fn append_assigns_next_id_and_is_loaded_back() {
    let (_dir, store) = store_with("\
id,country,isoAlpha3,city,latitude,longitude,date,continent
3,France,FRA,Paris,48.85,2.35,2024-01-01,Europa
7,Spain,ESP,Madrid,bad,-3.7,2024-02-01,Europa");

    let trip = store.append(new_trip("Lyon", Some("fra"))).unwrap();
    assert_eq!(trip.id, "8");
    assert_eq!(trip.iso_alpha3.as_deref(), Some("FRA"));

    let trips = store.load().unwrap();
    assert_eq!(trips.len(), 2);
    assert_eq!(trips[1], trip);
}

#[test]
fn append_to_missing_file_starts_at_one() {
    let dir = tempfile::tempdir().unwrap();
    let store = TripStore::new(dir.path().join("trips.csv"));

    let trip = store.append(new_trip("Paris", None)).unwrap();
    assert_eq!(trip.id, "1");
    assert_eq!(store.load().unwrap(), vec![trip]);
}

#[test]
fn append_rejects_invalid_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = TripStore::new(dir.path().join("trips.csv"));

    let mut out_of_range = new_trip("Paris", None);
    out_of_range.latitude = 91.;
    assert!(matches!(store.append(out_of_range), Err(TripStoreError::InvalidTrip(_))));
    assert!(matches!(store.append(new_trip("Paris", Some("XYZ"))), Err(TripStoreError::InvalidTrip(_))));
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn append_follows_the_file_column_order() {
    let (_dir, store) = store_with("\
city,latitude,longitude,id,notes
Oslo,59.91,10.75,9,fjords
");
    let trip = store.append(new_trip("Lyon", Some("FRA"))).unwrap();
    assert_eq!(trip.id, "10");

    let contents = fs::read_to_string(store.path()).unwrap();
    assert!(contents.ends_with("Lyon,48.85,2.35,10,\n"), "got {contents:?}");

    let cities: Vec<String> = store.load().unwrap().into_iter().map(|trip| trip.city).collect();
    assert_eq!(cities, vec!["Oslo", "Lyon"]);
}

#[test]
fn append_refuses_when_ids_run_out() {
    let (_dir, store) = store_with("\
id,country,isoAlpha3,city,latitude,longitude,date,continent
9223372036854775807,France,FRA,Paris,48.85,2.35,2024-01-01,Europa
");
    assert!(matches!(store.append(new_trip("Lyon", None)), Err(TripStoreError::Storage(_))));
    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn repeated_corruption_keeps_every_quarantined_file() {
    let (dir, store) = store_with("garbage A\n");
    assert!(store.load().unwrap().is_empty());

    fs::write(store.path(), "garbage B\n").unwrap();
    assert!(store.load().unwrap().is_empty());

    assert_eq!(fs::read_to_string(dir.path().join("trips.csv.corrupt")).unwrap(), "garbage A\n");
    assert_eq!(fs::read_to_string(dir.path().join("trips.csv.corrupt.1")).unwrap(), "garbage B\n");
}
