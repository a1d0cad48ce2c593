pub mod api;
pub mod config;
pub mod currency;
pub mod error;
mod extractors;
pub mod pipeline;
pub mod telemetry;
