//! HTTP/REST API adapter.
//!
//! Inbound adapter exposing the price, token and calculator endpoints,
//! plus health and metrics, behind request-context and rate-limit
//! middleware.

mod controller;
mod middleware;
mod request;
mod response;

pub use controller::{AppState, create_router};
pub use middleware::{
    REQUEST_ID_HEADER, RATE_LIMIT_LIMIT_HEADER, RATE_LIMIT_REMAINING_HEADER, client_identifier,
};
pub use request::*;
pub use response::*;
