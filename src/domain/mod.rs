// Domain layer: endpoint catalog, raw API models and ports (interfaces).

pub mod endpoint;
pub mod model;
pub mod ports;
