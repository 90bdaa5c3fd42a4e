//! HTTP adapter for the service registry: implements the domain
//! `ServiceGateway` port with `reqwest` against `<ARIES_API>/api/services`.

mod builder;
mod gateway;

#[cfg(test)]
mod tests;

pub use builder::GatewayBuilder;
pub use gateway::{HttpServiceGateway, SERVICES_PATH};
