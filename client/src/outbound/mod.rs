//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed gateway to the user REST backend
//!
//! Adapters are thin translators between domain types and wire
//! representations. They contain no business logic.

pub mod http;
