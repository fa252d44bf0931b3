//! Editor configuration
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | MENU_API_URL | http://localhost:8080 | Backend base URL |
//! | MENU_API_TOKEN | (none) | Bearer token |
//! | MENU_API_TIMEOUT_SECS | 30 | Request timeout |
//! | MENU_SLUG_STYLE | hyphenated | `hyphenated` or `compact` |

use shared::SlugStyle;

use crate::backend::HttpBackend;
use crate::error::PersistError;

/// Configuration for connecting to the menu backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:8080")
    pub base_url: String,

    /// Bearer token for authentication
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: 30,
        }
    }

    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("MENU_API_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            token: std::env::var("MENU_API_TOKEN").ok().filter(|t| !t.is_empty()),
            timeout: std::env::var("MENU_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Create an HTTP backend from this configuration
    pub fn build_backend(&self) -> Result<HttpBackend, PersistError> {
        HttpBackend::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

/// Behaviour of an editing session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorConfig {
    /// Normalization used for both slug generation and availability checks
    pub slug_style: SlugStyle,
}

impl EditorConfig {
    pub fn from_env() -> Self {
        let slug_style = match std::env::var("MENU_SLUG_STYLE") {
            Ok(raw) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Ignoring MENU_SLUG_STYLE");
                SlugStyle::default()
            }),
            Err(_) => SlugStyle::default(),
        };
        Self { slug_style }
    }

    pub fn with_slug_style(mut self, slug_style: SlugStyle) -> Self {
        self.slug_style = slug_style;
        self
    }
}
