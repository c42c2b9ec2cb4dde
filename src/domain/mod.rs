// Domain layer: models and ports shared by the adapters and the core.

pub mod model;
pub mod ports;
