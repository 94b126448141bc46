//! Schema-driven client core for administering user records over REST.
//!
//! - `domain`: record schema, validation, form controller, and record cache.
//! - `outbound`: adapters implementing the domain's gateway port.
//! - `config`: layered settings for the backend connection.

pub mod config;
pub mod domain;
pub mod outbound;
