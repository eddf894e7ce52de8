use geo::Point;
use log::debug;
use tramline_core::prelude::*;

use crate::model::TransitNetwork;

/// Holds the start and end placement of a journey search and runs it
/// against a network.
///
/// Whatever places markers or reads form input owns a controller and calls
/// its methods; the controller is the only place the query state lives.
#[derive(Debug, Clone)]
pub struct RouteController<'a> {
    network: &'a TransitNetwork,
    start: Option<Point<f64>>,
    end: Option<Point<f64>>,
    optimize_for: OptimizeFor,
    max_walking_distance_miles: Miles,
}

impl<'a> RouteController<'a> {
    pub fn new(network: &'a TransitNetwork) -> Self {
        Self {
            network,
            start: None,
            end: None,
            optimize_for: OptimizeFor::default(),
            max_walking_distance_miles: tramline_core::routing::DEFAULT_MAX_WALKING_MILES,
        }
    }

    pub fn network(&self) -> &'a TransitNetwork {
        self.network
    }

    pub fn start(&self) -> Option<Point<f64>> {
        self.start
    }

    pub fn end(&self) -> Option<Point<f64>> {
        self.end
    }

    pub fn optimization(&self) -> OptimizeFor {
        self.optimize_for
    }

    pub fn max_walking_distance(&self) -> Miles {
        self.max_walking_distance_miles
    }

    pub fn place_start(&mut self, point: Point<f64>) {
        self.start = Some(point);
    }

    pub fn place_end(&mut self, point: Point<f64>) {
        self.end = Some(point);
    }

    /// Remove both placements, keeping the search settings
    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
    }

    pub fn swap_endpoints(&mut self) {
        std::mem::swap(&mut self.start, &mut self.end);
    }

    pub fn set_optimization(&mut self, mode: OptimizeFor) {
        self.optimize_for = mode;
    }

    pub fn set_max_walking_distance(&mut self, miles: Miles) {
        self.max_walking_distance_miles = miles;
    }

    /// Current placement and settings as an unvalidated query
    pub fn to_raw_query(&self) -> RawRouteQuery {
        RawRouteQuery {
            start: self.start.map(|p| [p.x(), p.y()]),
            end: self.end.map(|p| [p.x(), p.y()]),
            optimize_for: Some(self.optimize_for.to_string()),
            max_walking_distance_miles: Some(self.max_walking_distance_miles),
        }
    }

    /// Validate the current placement and plan the journey
    ///
    /// # Errors
    ///
    /// Returns every validation problem of the placement at once, or
    /// [`QueryError::NoAccessibleStation`] when a marker is out of walking
    /// range. An unreachable destination is `Ok(None)`.
    pub fn search(&self) -> Result<Option<RouteResult>, QueryError> {
        let raw = self.to_raw_query();
        debug!("Searching {raw:?}");
        self.network.plan_raw(&raw)
    }
}
