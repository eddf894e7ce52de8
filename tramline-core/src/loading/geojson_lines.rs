//! Lines from `GeoJSON` documents

use std::path::Path;

use geo::LineString;
use geojson::{Feature, GeoJson};
use log::{debug, warn};
use serde_json::Value as JsonValue;

use crate::{
    Error,
    model::{SpeedClass, TransitLine},
};

/// Parse lines from a `FeatureCollection`, a single `Feature` or a bare
/// geometry.
///
/// Each `LineString` feature becomes one line; each part of a
/// `MultiLineString` becomes its own line, numbered from the second part on.
/// Recognised properties are `name` (or `line`, or `id`), `speed_class` and
/// `speed_mph`. Other geometry types are ignored.
///
/// # Errors
///
/// Returns an error if the document is not valid `GeoJSON`
pub fn lines_from_geojson_str(source: &str) -> Result<Vec<TransitLine>, Error> {
    let document: GeoJson = source.parse()?;
    let features = match document {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature::from(geometry)],
    };

    let mut lines = Vec::new();
    for (index, feature) in features.into_iter().enumerate() {
        lines.extend(lines_from_feature(index, feature)?);
    }
    debug!("Read {} lines from GeoJSON", lines.len());
    Ok(lines)
}

/// Read lines from a `GeoJSON` file
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed
pub fn read_lines_geojson(path: impl AsRef<Path>) -> Result<Vec<TransitLine>, Error> {
    let source = std::fs::read_to_string(path.as_ref())?;
    lines_from_geojson_str(&source)
}

fn lines_from_feature(index: usize, feature: Feature) -> Result<Vec<TransitLine>, Error> {
    let name = feature_name(&feature).unwrap_or_else(|| format!("Line {}", index + 1));
    let speed_class = feature
        .property("speed_class")
        .and_then(JsonValue::as_str)
        .and_then(|raw| match raw.parse::<SpeedClass>() {
            Ok(class) => Some(class),
            Err(message) => {
                warn!("Line '{name}': {message}, using the default class");
                None
            }
        });
    let speed_mph = feature.property("speed_mph").and_then(JsonValue::as_f64);

    let Some(geometry) = feature.geometry else {
        debug!("Feature {index} has no geometry, skipped");
        return Ok(Vec::new());
    };

    let parts: Vec<LineString<f64>> = match geo::Geometry::<f64>::try_from(geometry)? {
        geo::Geometry::LineString(line) => vec![line],
        geo::Geometry::MultiLineString(multi) => multi.0,
        _ => {
            debug!("Feature '{name}' is not a line, skipped");
            return Ok(Vec::new());
        }
    };

    Ok(parts
        .into_iter()
        .enumerate()
        .map(|(part, geometry)| {
            let part_name = if part == 0 {
                name.clone()
            } else {
                format!("{name} ({})", part + 1)
            };
            TransitLine {
                name: part_name,
                geometry,
                speed_class,
                speed_mph,
            }
        })
        .collect())
}

fn feature_name(feature: &Feature) -> Option<String> {
    ["name", "line", "id"]
        .iter()
        .filter_map(|key| feature.property(key))
        .find_map(|value| match value {
            JsonValue::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            JsonValue::Number(number) => Some(number.to_string()),
            _ => None,
        })
}
