//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `PriceService`: Resolves a symbol and aggregates its recent trades
//! - `TokenListService`: Loads the token catalog with local fallback

mod price_service;
mod token_service;

pub use price_service::PriceService;
pub use token_service::{TokenListOutcome, TokenListService, TokenOrigin, TokenSource, read_token_file};
