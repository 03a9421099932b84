// Domain layer: comparison models and ports (interfaces) the core depends on.

pub mod model;
pub mod ports;
