// Domain layer: ad models, permissive wire readers and storage ports.

pub mod lenient;
pub mod model;
pub mod ports;
