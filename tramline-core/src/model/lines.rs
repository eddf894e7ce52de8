//! Input lines, known stations and the registry of lines kept in a network

use std::fmt;
use std::str::FromStr;

use geo::{LineString, Point};
use serde::{Deserialize, Serialize};

use crate::{LineId, Miles};

/// Service class used to pick a default speed for a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    Express,
    #[default]
    Local,
    Streetcar,
}

impl FromStr for SpeedClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "express" => Ok(SpeedClass::Express),
            "local" => Ok(SpeedClass::Local),
            "streetcar" | "tram" | "trolley" => Ok(SpeedClass::Streetcar),
            other => Err(format!("unknown speed class '{other}'")),
        }
    }
}

impl fmt::Display for SpeedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpeedClass::Express => "express",
            SpeedClass::Local => "local",
            SpeedClass::Streetcar => "streetcar",
        };
        f.write_str(name)
    }
}

/// A line as supplied by the caller: a name and its polyline
#[derive(Debug, Clone, PartialEq)]
pub struct TransitLine {
    pub name: String,
    pub geometry: LineString<f64>,
    pub speed_class: Option<SpeedClass>,
    /// Explicit average speed, takes precedence over the class
    pub speed_mph: Option<f64>,
}

impl TransitLine {
    pub fn new(name: impl Into<String>, geometry: impl Into<LineString<f64>>) -> Self {
        Self {
            name: name.into(),
            geometry: geometry.into(),
            speed_class: None,
            speed_mph: None,
        }
    }

    #[must_use]
    pub fn with_speed_class(mut self, class: SpeedClass) -> Self {
        self.speed_class = Some(class);
        self
    }

    #[must_use]
    pub fn with_speed(mut self, mph: f64) -> Self {
        self.speed_mph = Some(mph);
        self
    }
}

/// A named station known to lie on a line
#[derive(Debug, Clone, PartialEq)]
pub struct KnownStation {
    pub name: String,
    pub geometry: Point<f64>,
    /// Name of the line serving the station
    pub line: String,
}

impl KnownStation {
    pub fn new(name: impl Into<String>, geometry: Point<f64>, line: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry,
            line: line.into(),
        }
    }
}

/// A line kept in a built network
#[derive(Debug, Clone, PartialEq)]
pub struct LineInfo {
    pub id: LineId,
    pub name: String,
    pub speed_mph: f64,
    /// Cleaned polyline (no repeated vertices)
    pub geometry: LineString<f64>,
    pub length_miles: Miles,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_speed_classes_case_insensitively() {
        assert_eq!("Express".parse::<SpeedClass>(), Ok(SpeedClass::Express));
        assert_eq!(" local ".parse::<SpeedClass>(), Ok(SpeedClass::Local));
        assert_eq!("tram".parse::<SpeedClass>(), Ok(SpeedClass::Streetcar));
        assert!("monorail".parse::<SpeedClass>().is_err());
    }

    #[test]
    fn builder_methods_set_speeds() {
        let line = TransitLine::new("Red", vec![(0.0, 0.0), (0.01, 0.0)])
            .with_speed_class(SpeedClass::Express)
            .with_speed(42.0);
        assert_eq!(line.speed_class, Some(SpeedClass::Express));
        assert_eq!(line.speed_mph, Some(42.0));
        assert_eq!(line.geometry.0.len(), 2);
    }
}
