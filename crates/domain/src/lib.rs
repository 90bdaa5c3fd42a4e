//! Domain-level building blocks shared by the gateway, store and console
//! crates.
//!
//! The service record model, the gateway port that reaches the registry
//! backend, environment configuration and telemetry wiring all live here so
//! adapters only depend on one crate for the shared contract.

pub mod config;
pub mod gateway;
pub mod model;
pub mod services;

pub use config::*;
pub use gateway::*;
pub use model::*;
