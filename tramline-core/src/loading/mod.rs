//! This module is responsible for loading line and station data and building
//! a routable transit network from it.

mod builder;
mod cancel;
mod candidates;
mod config;
mod connectivity;
mod edges;
pub mod geojson_lines;
mod merge;
mod report;
pub mod stations;
mod transfers;

pub use builder::{build_network, build_network_with};
pub use cancel::{BuildOptions, BuildPhase, CancellationToken};
pub use config::{EngineConfig, NetworkConfig, RoutingConfig, SpeedProfile};
pub use geojson_lines::{lines_from_geojson_str, read_lines_geojson};
pub use report::{BuildReport, BuildWarning};
pub use stations::{read_stations_csv, stations_from_csv_reader};
