use std::fmt;

use crate::Miles;

/// Problem found in the input that the builder worked around
#[derive(Debug, Clone, PartialEq)]
pub enum BuildWarning {
    /// Fewer than two distinct coordinates
    TooFewCoordinates { line: String, count: usize },
    NonFiniteCoordinate { line: String },
    InvalidSpeed { line: String, speed_mph: f64 },
    /// Every node of the line merged into one, so it has no edges
    CollapsedLine { line: String },
    UnknownStationLine { station: String, line: String },
    InvalidStationCoordinate { station: String },
    /// A component left disconnected because no other one is close enough
    UnbridgedComponent {
        size: usize,
        nearest_miles: Option<Miles>,
    },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::TooFewCoordinates { line, count } => {
                write!(f, "line '{line}' has {count} usable coordinate(s), skipped")
            }
            BuildWarning::NonFiniteCoordinate { line } => {
                write!(f, "line '{line}' has a non-finite coordinate, skipped")
            }
            BuildWarning::InvalidSpeed { line, speed_mph } => {
                write!(f, "line '{line}' has unusable speed {speed_mph} mph, skipped")
            }
            BuildWarning::CollapsedLine { line } => {
                write!(f, "line '{line}' collapsed into a single node, skipped")
            }
            BuildWarning::UnknownStationLine { station, line } => {
                write!(f, "station '{station}' references unknown line '{line}'")
            }
            BuildWarning::InvalidStationCoordinate { station } => {
                write!(f, "station '{station}' has invalid coordinates")
            }
            BuildWarning::UnbridgedComponent {
                size,
                nearest_miles: Some(miles),
            } => write!(
                f,
                "component of {size} node(s) left disconnected, nearest other component is {miles:.2} mi away"
            ),
            BuildWarning::UnbridgedComponent {
                size,
                nearest_miles: None,
            } => write!(f, "component of {size} node(s) left disconnected"),
        }
    }
}

/// Outcome of a network build besides the graph itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub warnings: Vec<BuildWarning>,
    /// Nodes removed because no edge reached them
    pub dropped_nodes: usize,
    pub connectors_added: usize,
    /// Connected components left after repair
    pub components: usize,
}

impl BuildReport {
    pub(crate) fn warn(&mut self, warning: BuildWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn is_connected(&self) -> bool {
        self.components <= 1
    }
}
