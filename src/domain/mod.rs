// Domain layer: data model and ports. Depends on nothing above it.

pub mod model;
pub mod ports;
