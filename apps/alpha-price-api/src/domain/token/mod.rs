//! Alpha Token Catalog
//!
//! Token list sources disagree on shape. Three are accepted:
//!
//! ```text
//! [{"alphaId": "ALPHA_1", "symbol": "KOGE"}, ...]        list
//! {"code": "000000", "data": <list or mapping>}          wrapped
//! {"ALPHA_1": "KOGE", ...}                               mapping
//! ```
//!
//! [`TokenListPayload::classify`] turns raw JSON into one of these shapes and
//! [`TokenListPayload::into_entries`] flattens it to [`TokenEntry`] pairs,
//! dropping anything malformed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tradable alpha token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Alpha identifier, e.g. `ALPHA_118`.
    #[serde(rename = "alphaId")]
    pub alpha_id: String,
    /// Base asset symbol, e.g. `KOGE`.
    pub symbol: String,
}

impl TokenEntry {
    /// Create a token entry.
    #[must_use]
    pub fn new(alpha_id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            alpha_id: alpha_id.into(),
            symbol: symbol.into(),
        }
    }
}

/// Accepted token list shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenListPayload {
    /// A sequence of token objects.
    List(Vec<Value>),
    /// An envelope whose `data` field holds the real payload.
    Wrapped(Box<TokenListPayload>),
    /// A flat `alphaId → symbol` object.
    Mapping(Map<String, Value>),
    /// Anything else (scalar, null).
    Unsupported,
}

impl TokenListPayload {
    /// Classify raw JSON into a payload shape.
    #[must_use]
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::List(items),
            Value::Object(mut map) => match map.remove("data") {
                Some(inner) => Self::Wrapped(Box::new(Self::classify(inner))),
                None => Self::Mapping(map),
            },
            _ => Self::Unsupported,
        }
    }

    /// Flatten into token entries, skipping malformed items.
    #[must_use]
    pub fn into_entries(self) -> Vec<TokenEntry> {
        match self {
            Self::List(items) => items.iter().filter_map(entry_from_object).collect(),
            Self::Wrapped(inner) => inner.into_entries(),
            Self::Mapping(map) => map
                .into_iter()
                .filter_map(|(alpha_id, symbol)| {
                    scalar_to_string(&symbol).map(|symbol| TokenEntry::new(alpha_id, symbol))
                })
                .collect(),
            Self::Unsupported => Vec::new(),
        }
    }
}

/// Normalize raw JSON of any accepted shape into token entries.
#[must_use]
pub fn normalize_token_list(value: Value) -> Vec<TokenEntry> {
    TokenListPayload::classify(value).into_entries()
}

fn entry_from_object(item: &Value) -> Option<TokenEntry> {
    let obj = item.as_object()?;
    let symbol = first_field(obj, &["symbol", "baseSymbol", "name"])?;
    let alpha_id = first_field(obj, &["alphaId", "id"]).unwrap_or_else(|| symbol.clone());
    Some(TokenEntry::new(alpha_id, symbol))
}

fn first_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(scalar_to_string)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
