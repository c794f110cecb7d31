// Domain layer: report models and ports (storage, configuration, pipeline, narrative).

pub mod model;
pub mod ports;
