/// Cache context value used when no country was resolved.
pub const INTERNATIONAL: &str = "int";

/// The country resolved for the current request.
///
/// One value lives in each request's context; it starts empty and is only
/// written by the country setter stage. Downstream consumers (link building,
/// cache keys, the country switcher) read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentCountry {
    country_code: Option<String>,
}

impl CurrentCountry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved country code, `None` on the international site.
    pub fn get(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    pub fn set(&mut self, country_code: &str) -> &mut Self {
        self.country_code = Some(country_code.to_string());
        self
    }

    pub fn reset(&mut self) -> &mut Self {
        self.country_code = None;
        self
    }

    /// Per-country cache key: the country code, or `int` without a country.
    pub fn cache_context(&self) -> &str {
        self.get().unwrap_or(INTERNATIONAL)
    }
}
