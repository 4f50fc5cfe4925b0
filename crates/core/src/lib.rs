//! Shared data model, configuration and error types for the funnel
//! diagnostics and financial projection engine.

pub mod config;
pub mod error;
pub mod math;
pub mod types;

pub use config::AppConfig;
pub use error::{GrowthError, GrowthResult};
