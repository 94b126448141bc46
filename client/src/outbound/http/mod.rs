//! HTTP outbound adapters.
//!
//! This module provides the reqwest implementation of the `UserGateway`
//! port against the fixed `/users` REST contract.

mod user_gateway;

pub use user_gateway::{HttpGatewayBuildError, HttpUserGateway};
