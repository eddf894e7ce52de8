//! Known stations from CSV files with a `name,lon,lat,line` header

use std::fs::File;
use std::io::Read;
use std::path::Path;

use geo::Point;
use log::{debug, warn};
use serde::Deserialize;

use crate::{Error, model::KnownStation};

#[derive(Debug, Deserialize)]
struct StationRecord {
    name: String,
    lon: f64,
    lat: f64,
    line: String,
}

impl From<StationRecord> for KnownStation {
    fn from(record: StationRecord) -> Self {
        KnownStation::new(record.name, Point::new(record.lon, record.lat), record.line)
    }
}

/// Parse known stations from CSV data.
///
/// Rows that fail to deserialize are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the header cannot be read
pub fn stations_from_csv_reader<R: Read>(reader: R) -> Result<Vec<KnownStation>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    reader.headers()?;

    let stations: Vec<KnownStation> = reader
        .deserialize::<StationRecord>()
        .filter_map(|row| match row {
            Ok(record) => Some(record.into()),
            Err(err) => {
                warn!("Skipping station row: {err}");
                None
            }
        })
        .collect();

    debug!("Read {} known stations", stations.len());
    Ok(stations)
}

/// Read known stations from a CSV file
///
/// # Errors
///
/// Returns an error if the file cannot be opened or has no header
pub fn read_stations_csv(path: impl AsRef<Path>) -> Result<Vec<KnownStation>, Error> {
    let file = File::open(path.as_ref())?;
    stations_from_csv_reader(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_and_skips_malformed_ones() {
        let data = "name,lon,lat,line\n\
                    Central, -87.63, 41.88, Red\n\
                    Broken,east,41.9,Red\n\
                    Harbor,-87.60,41.89,Blue Line\n";
        let stations = stations_from_csv_reader(data.as_bytes()).unwrap();

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name, "Central");
        assert_eq!(stations[0].geometry, Point::new(-87.63, 41.88));
        assert_eq!(stations[1].line, "Blue Line");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = read_stations_csv("/definitely/not/here.csv");
        assert!(matches!(result, Err(Error::IoError(_))));
    }
}
