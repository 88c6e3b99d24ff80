//! Domain Layer - Pricing arithmetic and token identity.
//!
//! Pure types and functions with no I/O. Everything that touches money is a
//! `rust_decimal::Decimal`; quantization to output precision happens here,
//! once, at the edge of each calculation.

/// Decimal conversion and output quantization.
pub mod precision;

/// Trade aggregation into last, average and VWAP prices.
pub mod pricing;

/// Fee/waste model inversion into a price-difference range.
pub mod diff_range;

/// Alpha identifier to pair symbol resolution.
pub mod symbol;

/// Token catalog entries and payload normalization.
pub mod token;
