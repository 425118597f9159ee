use crate::error::NegotiationError;
use anyhow::{Context, Result};

/// Toggles for the two fallback mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackSettings {
    /// Repair or strip prefixes that do not name an allowed combination
    pub use_request_fallback: bool,
    /// Walk the language fallback chain when an alias is missing
    pub use_fallback_alias_manager: bool,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            use_request_fallback: true,
            use_fallback_alias_manager: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Fallbacks
    pub fallbacks: FallbackSettings,

    // Data sources
    pub country_terms_file: String,
    pub path_aliases_file: Option<String>,

    // Languages
    pub content_langcode: String,
    pub site_languages: Vec<String>,

    // Paths
    pub admin_path_prefixes: Vec<String>,
    pub front_page: Option<String>,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let site_languages = list_var("SITE_LANGUAGES", &["en"]);

        Ok(Self {
            // Fallbacks
            fallbacks: FallbackSettings {
                use_request_fallback: bool_var("USE_REQUEST_FALLBACK", true)
                    .context("USE_REQUEST_FALLBACK is not a boolean")?,
                use_fallback_alias_manager: bool_var("USE_FALLBACK_ALIAS_MANAGER", true)
                    .context("USE_FALLBACK_ALIAS_MANAGER is not a boolean")?,
            },

            // Data sources
            country_terms_file: std::env::var("COUNTRY_TERMS_FILE")
                .unwrap_or_else(|_| "data/countries.json".to_string()),
            path_aliases_file: std::env::var("PATH_ALIASES_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            // Languages
            content_langcode: std::env::var("CONTENT_LANGCODE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| site_languages.first().cloned())
                .unwrap_or_else(|| "en".to_string()),
            site_languages,

            // Paths
            admin_path_prefixes: list_var("ADMIN_PATH_PREFIXES", &["/admin"]),
            front_page: std::env::var("FRONT_PAGE")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            // Server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }
}

/// Read a boolean flag, accepting the usual spellings.
fn bool_var(key: &'static str, default: bool) -> Result<bool, NegotiationError> {
    match std::env::var(key) {
        Ok(value) => parse_bool(&value).ok_or(NegotiationError::InvalidConfig { key, value }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a comma-separated list, falling back to `default` when unset or empty.
fn list_var(key: &str, default: &[&str]) -> Vec<String> {
    let values: Vec<String> = std::env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if values.is_empty() {
        default.iter().map(|s| s.to_string()).collect()
    } else {
        values
    }
}
