//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the domain interacts with the exchange.

/// Port interfaces for the exchange trade feed and token source.
pub mod ports;

/// Application services for price snapshots and the token catalog.
pub mod services;
