//! Token List Service
//!
//! Loads the alpha token catalog from the configured source: a remote URL
//! fetched through [`TokenSourcePort`], or a local JSON file. Failures
//! degrade to the local fallback file and finally to an empty list; this
//! service never fails a request.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::application::ports::TokenSourcePort;
use crate::domain::token::{TokenEntry, normalize_token_list};
use crate::error::AlphaError;

/// Where the primary catalog lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// An `http://` or `https://` URL.
    Remote(String),
    /// A JSON file on disk.
    File(PathBuf),
}

impl TokenSource {
    /// Interpret a configured location. Blank input disables the source.
    #[must_use]
    pub fn parse(location: &str) -> Option<Self> {
        let location = location.trim();
        if location.is_empty() {
            return None;
        }
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Some(Self::Remote(location.to_string()));
        }
        Some(Self::File(expand_home(location)))
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

/// Which source produced a token list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    /// The remote catalog URL.
    Remote,
    /// The configured catalog file.
    File,
    /// The local fallback file, after the primary source failed.
    Fallback,
    /// Nothing could be loaded.
    Empty,
}

impl TokenOrigin {
    /// Get the origin as a label value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::File => "file",
            Self::Fallback => "fallback",
            Self::Empty => "empty",
        }
    }

    /// Whether the primary source failed.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Fallback | Self::Empty)
    }
}

/// A loaded token list and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenListOutcome {
    /// Normalized entries.
    pub entries: Vec<TokenEntry>,
    /// Source that produced them.
    pub origin: TokenOrigin,
}

/// Read and normalize a token file.
///
/// # Errors
///
/// Returns [`AlphaError::Internal`] if the file cannot be read or is not
/// valid JSON.
pub async fn read_token_file(path: &Path) -> Result<Vec<TokenEntry>, AlphaError> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| AlphaError::Internal(format!("read {}: {e}", path.display())))?;
    let value: Value = serde_json::from_slice(&raw)
        .map_err(|e| AlphaError::Internal(format!("parse {}: {e}", path.display())))?;
    Ok(normalize_token_list(value))
}

/// Serves the token catalog with graceful degradation.
pub struct TokenListService<S: TokenSourcePort> {
    source_port: Arc<S>,
    source: Option<TokenSource>,
    fallback_path: PathBuf,
}

impl<S: TokenSourcePort> TokenListService<S> {
    /// Create a token list service.
    #[must_use]
    pub const fn new(source_port: Arc<S>, source: Option<TokenSource>, fallback_path: PathBuf) -> Self {
        Self {
            source_port,
            source,
            fallback_path,
        }
    }

    /// Load the catalog. Never fails.
    pub async fn fetch_tokens(&self) -> TokenListOutcome {
        match &self.source {
            Some(TokenSource::Remote(url)) => match self.source_port.fetch_token_list(url).await {
                Ok(value) => {
                    return TokenListOutcome {
                        entries: normalize_token_list(value),
                        origin: TokenOrigin::Remote,
                    };
                }
                Err(e) => error!(url = %url, error = %e, "Token list fetch failed, using fallback"),
            },
            Some(TokenSource::File(path)) => match read_token_file(path).await {
                Ok(entries) => {
                    return TokenListOutcome {
                        entries,
                        origin: TokenOrigin::File,
                    };
                }
                Err(e) => error!(error = %e, "Token file unreadable, using fallback"),
            },
            None => debug!("No token source configured"),
        }

        self.load_fallback().await
    }

    async fn load_fallback(&self) -> TokenListOutcome {
        if !tokio::fs::try_exists(&self.fallback_path).await.unwrap_or(false) {
            warn!(path = %self.fallback_path.display(), "Token fallback file missing");
            return TokenListOutcome {
                entries: Vec::new(),
                origin: TokenOrigin::Empty,
            };
        }

        match read_token_file(&self.fallback_path).await {
            Ok(entries) => TokenListOutcome {
                entries,
                origin: TokenOrigin::Fallback,
            },
            Err(e) => {
                error!(error = %e, "Token fallback file unreadable");
                TokenListOutcome {
                    entries: Vec::new(),
                    origin: TokenOrigin::Empty,
                }
            }
        }
    }
}
