use geo::line_string;
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use super::{RouteResult, RouteSegment, SegmentKind, WalkLeg};
use crate::Error;

impl WalkLeg {
    fn to_feature(&self, leg_type: &str) -> Result<Feature, Error> {
        let coordinates = line_string![
            (x: self.from.x(), y: self.from.y()),
            (x: self.to.x(), y: self.to.y()),
        ];

        let value = json!({
            "type": "Feature",
            "geometry": Geometry::new((&coordinates).into()),
            "properties": {
                "leg_type": leg_type,
                "distance_miles": self.distance_miles,
                "duration_minutes": self.time_minutes,
            }
        });

        Ok(Feature::from_json_value(value)?)
    }
}

impl RouteSegment {
    fn to_feature(&self, leg_index: usize) -> Result<Feature, Error> {
        let (leg_type, line) = match &self.kind {
            SegmentKind::Ride { line_name, .. } => ("ride", Some(line_name.as_str())),
            SegmentKind::Walk => ("walk", None),
        };

        let value = json!({
            "type": "Feature",
            "geometry": Geometry::new(GeoJsonValue::from(&self.geometry)),
            "properties": {
                "leg_type": leg_type,
                "leg_index": leg_index,
                "line": line,
                "from": self.from,
                "to": self.to,
                "from_name": self.from_name,
                "to_name": self.to_name,
                "hops": self.hops,
                "distance_miles": self.distance_miles,
                "duration_minutes": self.time_minutes,
            }
        });

        Ok(Feature::from_json_value(value)?)
    }
}

impl RouteResult {
    /// Converts the route to a `GeoJSON` `FeatureCollection`: the access walk,
    /// one feature per consolidated segment, then the egress walk.
    ///
    /// # Errors
    ///
    /// Returns an error if a feature cannot be built from its JSON value
    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        let mut features = Vec::with_capacity(self.segments.len() + 2);

        features.push(self.access.to_feature("access_walk")?);
        for (index, segment) in self.segments.iter().enumerate() {
            features.push(segment.to_feature(index)?);
        }
        features.push(self.egress.to_feature("egress_walk")?);

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the collection cannot be built or serialized
    pub fn to_geojson_string(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.to_geojson()?)?)
    }
}
