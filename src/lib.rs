pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Commands};

pub use config::ConnectorConfig;
pub use core::{
    client::SkodaClient,
    connector::VehicleConnector,
    snapshot_store::{LocalStorage, SnapshotWriter},
};
pub use domain::endpoint::{ApiBase, Endpoint};
pub use utils::error::{ConnectorError, Result};
