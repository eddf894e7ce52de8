use std::fmt;
use std::str::FromStr;

use geo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Miles,
    geometry::{distance, is_valid_coord},
    loading::RoutingConfig,
};

/// Start and end closer than this are treated as the same place
const SAME_LOCATION_MILES: Miles = 0.001;

/// Walking distance used when a query does not ask for one
pub const DEFAULT_MAX_WALKING_MILES: Miles = 0.5;

/// Objective minimised by a route search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizeFor {
    #[default]
    Time,
    Distance,
    Transfers,
}

impl FromStr for OptimizeFor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time" | "fastest" => Ok(OptimizeFor::Time),
            "distance" | "shortest" => Ok(OptimizeFor::Distance),
            "transfers" | "fewest_transfers" => Ok(OptimizeFor::Transfers),
            _ => Err(ValidationError::UnknownOptimization(s.to_string())),
        }
    }
}

impl fmt::Display for OptimizeFor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptimizeFor::Time => "time",
            OptimizeFor::Distance => "distance",
            OptimizeFor::Transfers => "transfers",
        };
        f.write_str(name)
    }
}

/// Side of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryEndpoint {
    Start,
    End,
}

impl fmt::Display for QueryEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryEndpoint::Start => f.write_str("start"),
            QueryEndpoint::End => f.write_str("end"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Start location is missing")]
    MissingStart,
    #[error("End location is missing")]
    MissingEnd,
    #[error("The {endpoint} location has invalid coordinates")]
    InvalidCoordinate { endpoint: QueryEndpoint },
    #[error("Start and end are the same location")]
    SameStartAndEnd,
    #[error("Maximum walking distance {value} mi must be greater than 0 and at most {max} mi")]
    WalkingDistanceOutOfRange { value: f64, max: f64 },
    #[error("Unknown optimization mode '{0}'")]
    UnknownOptimization(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Invalid query: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
    #[error("No station within walking distance of the {0} location")]
    NoAccessibleStation(QueryEndpoint),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Query as received from a caller, before validation.
///
/// Coordinates are `[longitude, latitude]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRouteQuery {
    pub start: Option<[f64; 2]>,
    pub end: Option<[f64; 2]>,
    pub optimize_for: Option<String>,
    pub max_walking_distance_miles: Option<f64>,
}

impl RawRouteQuery {
    /// Check every field and collect all problems at once
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Invalid`] listing each problem found
    pub fn validate(&self, config: &RoutingConfig) -> Result<RouteQuery, QueryError> {
        let mut errors = Vec::new();

        let start = checked_point(self.start, QueryEndpoint::Start, &mut errors);
        let end = checked_point(self.end, QueryEndpoint::End, &mut errors);

        let optimize_for = match self.optimize_for.as_deref() {
            None => OptimizeFor::default(),
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                errors.push(err);
                OptimizeFor::default()
            }),
        };

        let query = RouteQuery {
            start: start.unwrap_or_else(|| Point::new(0.0, 0.0)),
            end: end.unwrap_or_else(|| Point::new(0.0, 0.0)),
            optimize_for,
            max_walking_distance_miles: self
                .max_walking_distance_miles
                .unwrap_or(DEFAULT_MAX_WALKING_MILES),
        };

        errors.extend(query.problems(config, start.is_some(), end.is_some()));

        if errors.is_empty() {
            Ok(query)
        } else {
            Err(QueryError::Invalid(errors))
        }
    }
}

fn checked_point(
    raw: Option<[f64; 2]>,
    endpoint: QueryEndpoint,
    errors: &mut Vec<ValidationError>,
) -> Option<Point<f64>> {
    match raw {
        None => {
            errors.push(match endpoint {
                QueryEndpoint::Start => ValidationError::MissingStart,
                QueryEndpoint::End => ValidationError::MissingEnd,
            });
            None
        }
        Some([lon, lat]) => Some(Point::new(lon, lat)),
    }
}

/// Validated route query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteQuery {
    pub start: Point<f64>,
    pub end: Point<f64>,
    pub optimize_for: OptimizeFor,
    pub max_walking_distance_miles: Miles,
}

impl RouteQuery {
    pub fn new(start: Point<f64>, end: Point<f64>) -> Self {
        Self {
            start,
            end,
            optimize_for: OptimizeFor::default(),
            max_walking_distance_miles: DEFAULT_MAX_WALKING_MILES,
        }
    }

    #[must_use]
    pub fn optimize_for(mut self, mode: OptimizeFor) -> Self {
        self.optimize_for = mode;
        self
    }

    #[must_use]
    pub fn max_walking_distance(mut self, miles: Miles) -> Self {
        self.max_walking_distance_miles = miles;
        self
    }

    /// # Errors
    ///
    /// Returns [`QueryError::Invalid`] listing each problem found
    pub fn validate(&self, config: &RoutingConfig) -> Result<(), QueryError> {
        let errors = self.problems(config, true, true);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(QueryError::Invalid(errors))
        }
    }

    /// Problems of the fields that were supplied
    fn problems(
        &self,
        config: &RoutingConfig,
        has_start: bool,
        has_end: bool,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let start_ok = is_valid_coord(self.start.0);
        let end_ok = is_valid_coord(self.end.0);
        if has_start && !start_ok {
            errors.push(ValidationError::InvalidCoordinate {
                endpoint: QueryEndpoint::Start,
            });
        }
        if has_end && !end_ok {
            errors.push(ValidationError::InvalidCoordinate {
                endpoint: QueryEndpoint::End,
            });
        }
        let both_usable = has_start && has_end && start_ok && end_ok;
        if both_usable && distance(self.start, self.end) < SAME_LOCATION_MILES {
            errors.push(ValidationError::SameStartAndEnd);
        }
        errors.extend(self.walking_problem(config));
        errors
    }

    fn walking_problem(&self, config: &RoutingConfig) -> Option<ValidationError> {
        let value = self.max_walking_distance_miles;
        let max = config.max_walking_limit_miles;
        (!(value.is_finite() && value > 0.0 && value <= max))
            .then_some(ValidationError::WalkingDistanceOutOfRange { value, max })
    }
}
