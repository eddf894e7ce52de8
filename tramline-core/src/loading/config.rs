use std::path::Path;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Miles, Minutes, model::SpeedClass};

/// Speeds and fixed penalties used to weight edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedProfile {
    pub express_mph: f64,
    pub local_mph: f64,
    pub streetcar_mph: f64,
    /// Class used for lines that carry neither a speed nor a class
    pub default_class: SpeedClass,
    /// Per-line speed overrides keyed by line name
    pub line_speeds: HashMap<String, f64>,
    pub walking_speed_mph: f64,
    pub transfer_penalty_minutes: Minutes,
    pub connector_penalty_minutes: Minutes,
    /// Stop time paid at every interpolated station passed through
    pub dwell_minutes: Minutes,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self {
            express_mph: 35.0,
            local_mph: 20.0,
            streetcar_mph: 12.0,
            default_class: SpeedClass::Local,
            line_speeds: HashMap::new(),
            walking_speed_mph: 3.0,
            transfer_penalty_minutes: 5.0,
            connector_penalty_minutes: 5.0,
            dwell_minutes: 0.5,
        }
    }
}

impl SpeedProfile {
    pub fn class_speed(&self, class: SpeedClass) -> f64 {
        match class {
            SpeedClass::Express => self.express_mph,
            SpeedClass::Local => self.local_mph,
            SpeedClass::Streetcar => self.streetcar_mph,
        }
    }

    /// Average speed of a line: per-line override, then the line's own
    /// speed, then its class, then the default class
    pub fn speed_for_line(
        &self,
        name: &str,
        own_speed: Option<f64>,
        class: Option<SpeedClass>,
    ) -> f64 {
        self.line_speeds
            .get(name)
            .copied()
            .or(own_speed)
            .unwrap_or_else(|| self.class_speed(class.unwrap_or(self.default_class)))
    }

    pub fn walking_minutes(&self, miles: Miles) -> Minutes {
        miles / self.walking_speed_mph * 60.0
    }

    pub fn validate(&self) -> Result<(), Error> {
        positive("express_mph", self.express_mph)?;
        positive("local_mph", self.local_mph)?;
        positive("streetcar_mph", self.streetcar_mph)?;
        positive("walking_speed_mph", self.walking_speed_mph)?;
        for (line, &speed) in &self.line_speeds {
            positive(&format!("line_speeds.{line}"), speed)?;
        }
        non_negative("transfer_penalty_minutes", self.transfer_penalty_minutes)?;
        non_negative("connector_penalty_minutes", self.connector_penalty_minutes)?;
        non_negative("dwell_minutes", self.dwell_minutes)
    }
}

/// Parameters of network construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub speeds: SpeedProfile,
    /// Candidates closer than this collapse into one node
    pub merge_radius_miles: Miles,
    /// Arc length between interpolated stations
    pub station_spacing_miles: Miles,
    /// Gap still treated as a crossing between two lines
    pub intersection_tolerance_miles: Miles,
    /// Walking distance covered by transfer edges
    pub transfer_radius_miles: Miles,
    /// Longest connector added to join disconnected components
    pub bridge_cutoff_miles: Miles,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            speeds: SpeedProfile::default(),
            merge_radius_miles: 0.0125,
            station_spacing_miles: 0.5,
            intersection_tolerance_miles: 0.0062,
            transfer_radius_miles: 0.25,
            bridge_cutoff_miles: 1.0,
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<(), Error> {
        self.speeds.validate()?;
        positive("merge_radius_miles", self.merge_radius_miles)?;
        positive("station_spacing_miles", self.station_spacing_miles)?;
        non_negative(
            "intersection_tolerance_miles",
            self.intersection_tolerance_miles,
        )?;
        non_negative("transfer_radius_miles", self.transfer_radius_miles)?;
        non_negative("bridge_cutoff_miles", self.bridge_cutoff_miles)
    }
}

/// Parameters of route queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Access candidates kept per query side
    pub max_candidates: usize,
    pub timeout_ms: u64,
    /// Cost of one transfer in `transfers` mode
    pub transfer_weight: f64,
    /// Costs closer than this are compared by transfer count
    pub tie_epsilon: f64,
    /// Largest walking distance a query may ask for
    pub max_walking_limit_miles: Miles,
    /// Guide the search with a straight-line estimate (A*)
    pub use_heuristic: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_candidates: crate::MAX_CANDIDATE_STOPS,
            timeout_ms: 2000,
            transfer_weight: 1000.0,
            tie_epsilon: 1e-6,
            max_walking_limit_miles: 5.0,
            use_heuristic: true,
        }
    }
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_candidates == 0 {
            return Err(Error::InvalidConfig(
                "max_candidates must be at least 1".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "timeout_ms must be at least 1".to_string(),
            ));
        }
        positive("transfer_weight", self.transfer_weight)?;
        non_negative("tie_epsilon", self.tie_epsilon)?;
        positive("max_walking_limit_miles", self.max_walking_limit_miles)
    }
}

/// Complete engine configuration, as read from a TOML file:
///
/// ```toml
/// [network]
/// station_spacing_miles = 0.25
///
/// [network.speeds]
/// walking_speed_mph = 2.5
/// line_speeds = { "Blue Line" = 28.0 }
///
/// [routing]
/// timeout_ms = 500
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub network: NetworkConfig,
    pub routing: RoutingConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or holds invalid values
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid config
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.network.validate()?;
        self.routing.validate()
    }
}

fn positive(name: &str, value: f64) -> Result<(), Error> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), Error> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be zero or positive, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn speed_resolution_order() {
        let mut profile = SpeedProfile::default();
        profile.line_speeds.insert("Blue".to_string(), 28.0);

        assert_eq!(
            profile.speed_for_line("Blue", Some(50.0), Some(SpeedClass::Express)),
            28.0
        );
        assert_eq!(
            profile.speed_for_line("Red", Some(50.0), Some(SpeedClass::Express)),
            50.0
        );
        assert_eq!(
            profile.speed_for_line("Red", None, Some(SpeedClass::Streetcar)),
            12.0
        );
        assert_eq!(profile.speed_for_line("Red", None, None), 20.0);
    }

    #[test]
    fn walking_minutes_at_three_mph() {
        let profile = SpeedProfile::default();
        assert!((profile.walking_minutes(0.2) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [network]
            station_spacing_miles = 0.25

            [network.speeds]
            default_class = "express"
            line_speeds = { "Blue Line" = 28.0 }

            [routing]
            timeout_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.network.station_spacing_miles, 0.25);
        assert_eq!(config.network.merge_radius_miles, 0.0125);
        assert_eq!(config.network.speeds.default_class, SpeedClass::Express);
        assert_eq!(config.network.speeds.line_speeds.get("Blue Line"), Some(&28.0));
        assert_eq!(config.routing.timeout_ms, 500);
        assert_eq!(config.routing.max_candidates, crate::MAX_CANDIDATE_STOPS);
    }

    #[test]
    fn rejects_non_positive_speeds() {
        let err = EngineConfig::from_toml_str("[network.speeds]\nwalking_speed_mph = 0.0\n")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(msg) if msg.contains("walking_speed_mph")));
    }

    #[test]
    fn malformed_toml_is_a_toml_error() {
        let err = EngineConfig::from_toml_str("[network\n").unwrap_err();
        assert!(matches!(err, Error::TomlError(_)));
    }
}
