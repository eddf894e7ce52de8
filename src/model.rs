use std::fmt;
use std::path::Path;

use log::info;
use tramline_core::prelude::*;
use tramline_core::{Error, loading::stations_from_csv_reader};

/// TransitNetwork
///
/// A routable snapshot of a transit system: the engine configuration plus the
/// network graph built from line geometries and optional known stations.
///
/// The network is immutable once built. Queries never modify it, each one
/// layers its temporary access nodes on a private overlay, so any number of
/// them can run at the same time against a shared `&TransitNetwork`.
#[derive(Debug, Clone)]
pub struct TransitNetwork {
    config: EngineConfig,
    graph: NetworkGraph,
}

impl TransitNetwork {
    /// Build a network from lines and stations already in memory
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the lines yield no
    /// usable network
    pub fn from_lines(
        lines: &[TransitLine],
        stations: &[KnownStation],
        config: EngineConfig,
    ) -> Result<Self, Error> {
        config.validate()?;
        let graph = build_network(lines, stations, &config.network)?;
        Ok(Self { config, graph })
    }

    /// Build a network from a GeoJSON line file and an optional station CSV
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or parsed, or if building
    /// the network fails
    pub fn load(
        lines_geojson: impl AsRef<Path>,
        stations_csv: Option<&Path>,
        config: EngineConfig,
    ) -> Result<Self, Error> {
        let lines_path = lines_geojson.as_ref();
        let lines = read_lines_geojson(lines_path)?;
        let stations = match stations_csv {
            Some(path) => read_stations_csv(path)?,
            None => Vec::new(),
        };
        info!(
            "Loaded {} lines from {} and {} known stations",
            lines.len(),
            lines_path.display(),
            stations.len()
        );
        Self::from_lines(&lines, &stations, config)
    }

    /// Build a network from in-memory GeoJSON and CSV documents
    ///
    /// # Errors
    ///
    /// Returns an error if a document cannot be parsed or building the
    /// network fails
    pub fn from_sources(
        lines_geojson: &str,
        stations_csv: Option<&str>,
        config: EngineConfig,
    ) -> Result<Self, Error> {
        let lines = tramline_core::loading::lines_from_geojson_str(lines_geojson)?;
        let stations = match stations_csv {
            Some(source) => stations_from_csv_reader(source.as_bytes())?,
            None => Vec::new(),
        };
        Self::from_lines(&lines, &stations, config)
    }

    pub fn graph(&self) -> &NetworkGraph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn report(&self) -> &BuildReport {
        self.graph.report()
    }

    pub fn node_count(&self) -> usize {
        self.graph.nodes().len()
    }

    /// Number of physical links (each stored as two directed edges)
    pub fn link_count(&self) -> usize {
        self.graph.edge_count() / 2
    }

    pub fn line_count(&self) -> usize {
        self.graph.lines().len()
    }

    /// Plan a validated query with this network's routing settings
    ///
    /// # Errors
    ///
    /// See [`plan_route`]
    pub fn plan(&self, query: &RouteQuery) -> Result<Option<RouteResult>, QueryError> {
        plan_route(&self.graph, query, &self.config.routing)
    }

    /// Validate a raw query and plan it
    ///
    /// # Errors
    ///
    /// Returns every validation problem at once, or the planning error
    pub fn plan_raw(&self, raw: &RawRouteQuery) -> Result<Option<RouteResult>, QueryError> {
        let query = raw.validate(&self.config.routing)?;
        self.plan(&query)
    }
}

impl fmt::Display for TransitNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransitNetwork with {} nodes, {} links and {} lines",
            self.node_count(),
            self.link_count(),
            self.line_count()
        )?;
        let report = self.report();
        if !report.warnings.is_empty() {
            write!(f, " ({} build warnings)", report.warnings.len())?;
        }
        Ok(())
    }
}
