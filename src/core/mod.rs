pub mod auth;
pub mod catalog;
pub mod client;
pub mod connector;
pub mod snapshot_store;

pub use crate::domain::endpoint::{ApiBase, Endpoint};
pub use crate::domain::model::{Garage, GarageVehicle, VehicleSnapshot};
pub use crate::domain::ports::{ApiRequest, ApiResponse, ApiTransport, ConfigProvider, Storage};
pub use crate::utils::error::Result;
