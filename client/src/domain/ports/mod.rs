//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod user_gateway;

#[cfg(test)]
pub use user_gateway::MockUserGateway;
pub use user_gateway::{DataAccessError, FixtureUserGateway, UserGateway};
