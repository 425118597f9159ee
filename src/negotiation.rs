//! Request-time negotiation of the language-country prefix.
//!
//! Two stages run before route dispatch, in priority order:
//!
//! 1. [`RequestFallback`] (310) repairs or strips prefixes that do not name an
//!    allowed combination and answers with a permanent redirect.
//! 2. [`CountrySetter`] (305) records the allowed country of the prefix in the
//!    request's [`CurrentCountry`].
//!
//! Paths without a prefix are left to other language negotiators.

use crate::current_country::CurrentCountry;
use crate::path;
use crate::registry::CountryManager;
use std::sync::Arc;
use tracing::{debug, info};

/// HTTP status of every negotiation redirect.
pub const REDIRECT_STATUS: u16 = 301;

/// A permanent redirect produced by the fallback stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
}

impl Redirect {
    fn to(location: String) -> Self {
        Self { location }
    }

    pub fn status(&self) -> u16 {
        REDIRECT_STATUS
    }
}

/// Outcome of the fallback stage for one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negotiation {
    /// Request fallback is switched off
    Disabled,
    /// No `xx-yy` prefix, nothing to negotiate here
    NoPrefix,
    /// The prefix names an allowed combination
    Valid,
    /// Unknown country, the prefix is removed
    Strip(Redirect),
    /// Allowed country with a foreign language, the primary language is used
    Repair(Redirect),
    /// Allowed country without any language; routing answers not-found
    Unresolved,
}

impl Negotiation {
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            Negotiation::Strip(redirect) | Negotiation::Repair(redirect) => Some(redirect),
            _ => None,
        }
    }

    /// Redirects depend on negotiation state and must never be page-cached.
    pub fn kills_page_cache(&self) -> bool {
        self.redirect().is_some()
    }
}

/// Pipeline stages contributed by this crate, with their priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RequestFallback,
    CountrySetter,
}

impl Stage {
    /// Higher runs earlier; route dispatch comes after every stage.
    pub const fn priority(self) -> i32 {
        match self {
            Stage::RequestFallback => 310,
            Stage::CountrySetter => 305,
        }
    }

    /// All stages, first to run first.
    pub fn ordered() -> Vec<Stage> {
        let mut stages = vec![Stage::CountrySetter, Stage::RequestFallback];
        stages.sort_by_key(|stage| std::cmp::Reverse(stage.priority()));
        stages
    }
}

/// Decides whether a prefixed request is passed, repaired or stripped.
#[derive(Clone)]
pub struct RequestFallback {
    manager: Arc<dyn CountryManager>,
    enabled: bool,
    front_page: Option<String>,
}

impl RequestFallback {
    pub fn new(manager: Arc<dyn CountryManager>, enabled: bool) -> Self {
        Self {
            manager,
            enabled,
            front_page: None,
        }
    }

    /// System path of the front page; redirects collapse it to the bare prefix.
    pub fn with_front_page(mut self, front_page: Option<String>) -> Self {
        self.front_page = front_page.map(|page| normalize(&page));
        self
    }

    /// Evaluate the rules in order; the first one that applies wins.
    pub fn negotiate(&self, request_path: &str) -> Negotiation {
        if !self.enabled {
            return Negotiation::Disabled;
        }

        if !path::has_valid_prefix(request_path) {
            return Negotiation::NoPrefix;
        }

        let langcode = path::langcode_from_path(request_path);
        let country_code = path::country_code_from_path(request_path);

        if self
            .manager
            .is_language_available(country_code.as_deref(), langcode.as_deref())
        {
            return Negotiation::Valid;
        }

        let rest = self.collapse_front_page(path::remove_valid_prefix(request_path));

        if !self.manager.is_country_allowed(country_code.as_deref()) {
            info!("Unknown country in {}, redirecting to {}", request_path, rest);
            return Negotiation::Strip(Redirect::to(rest));
        }

        if let Some(primary) = self.manager.primary_langcode(country_code.as_deref()) {
            let location = format!(
                "/{}-{}{}",
                primary,
                country_code.unwrap_or_default(),
                rest.trim_end_matches('/')
            );
            info!("Repairing {} to {}", request_path, location);
            return Negotiation::Repair(Redirect::to(location));
        }

        debug!("No language configured for the country of {}", request_path);
        Negotiation::Unresolved
    }

    fn collapse_front_page(&self, rest: String) -> String {
        match &self.front_page {
            Some(front) if *front == normalize(&rest) => "/".to_string(),
            _ => rest,
        }
    }
}

fn normalize(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

/// Records the country of an allowed prefix for the rest of the request.
#[derive(Clone)]
pub struct CountrySetter {
    manager: Arc<dyn CountryManager>,
}

impl CountrySetter {
    pub fn new(manager: Arc<dyn CountryManager>) -> Self {
        Self { manager }
    }

    /// Set the current country from the path; runs regardless of request fallback.
    ///
    /// Paths without an allowed country leave the current country untouched,
    /// i.e. on the international site.
    pub fn apply(&self, request_path: &str, current: &mut CurrentCountry) {
        let country_code = path::country_code_from_path(request_path);
        if self.manager.is_country_allowed(country_code.as_deref()) {
            if let Some(code) = country_code {
                current.set(&code);
            }
        }
    }
}
