//! Symbol Resolution
//!
//! Maps an alpha token identifier (`ALPHA_118`, `koge`, `KOGEUSDT`) to the
//! tradable pair symbol used by the exchange's trade endpoints.
//!
//! Rules, in order:
//! 1. Trim and uppercase the identifier.
//! 2. If it already ends with the quote suffix, it is a pair symbol.
//! 3. If the lookup table maps it to a base asset, use that base.
//! 4. Otherwise the identifier itself is the base asset.

use std::collections::HashMap;

use crate::domain::token::TokenEntry;
use crate::error::AlphaError;

/// Default quote currency suffix.
pub const DEFAULT_QUOTE_SUFFIX: &str = "USDT";

/// Resolves alpha identifiers to pair symbols.
#[derive(Debug, Clone)]
pub struct SymbolResolver {
    suffix: String,
    /// Uppercased alpha identifier → uppercased base symbol.
    table: HashMap<String, String>,
}

impl Default for SymbolResolver {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTE_SUFFIX)
    }
}

impl SymbolResolver {
    /// Create a resolver with an empty lookup table.
    #[must_use]
    pub fn new(suffix: &str) -> Self {
        Self {
            suffix: suffix.trim().to_uppercase(),
            table: HashMap::new(),
        }
    }

    /// Add identifier → base mappings from token entries.
    #[must_use]
    pub fn with_entries<'a>(mut self, entries: impl IntoIterator<Item = &'a TokenEntry>) -> Self {
        for entry in entries {
            let base = entry.symbol.trim().to_uppercase();
            if base.is_empty() {
                continue;
            }
            self.table
                .insert(entry.alpha_id.trim().to_uppercase(), base);
        }
        self
    }

    /// Quote suffix appended to base symbols.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Number of identifiers in the lookup table.
    #[must_use]
    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    /// Resolve an identifier to a pair symbol.
    ///
    /// # Errors
    ///
    /// Returns [`AlphaError::InvalidIdentifier`] if the identifier is empty
    /// after trimming.
    pub fn resolve(&self, alpha_id: &str) -> Result<String, AlphaError> {
        let id = alpha_id.trim().to_uppercase();
        if id.is_empty() {
            return Err(AlphaError::InvalidIdentifier);
        }

        if !self.suffix.is_empty() && id.ends_with(&self.suffix) {
            return Ok(id);
        }

        let base = self.table.get(&id).map_or(id.as_str(), String::as_str);
        Ok(format!("{base}{}", self.suffix))
    }
}
