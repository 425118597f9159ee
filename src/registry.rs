//! Allow-list queries over a country catalog snapshot.

use crate::catalog::CountryCatalog;
use std::sync::Arc;

/// Queries the negotiation stages ask about allowed combinations.
pub trait CountryManager: Send + Sync {
    /// Whether the country is part of the allow-list. Codes are case-folded.
    fn is_country_allowed(&self, country_code: Option<&str>) -> bool;

    /// Whether `langcode` is one of the country's languages.
    ///
    /// The country code must match a catalog key as-is and the langcode is
    /// compared exactly; neither is case-folded here.
    fn is_language_available(&self, country_code: Option<&str>, langcode: Option<&str>) -> bool;

    /// First language of the country's editorial list.
    fn primary_langcode(&self, country_code: Option<&str>) -> Option<String>;

    /// Ordered languages of an allowed country.
    fn country_languages(&self, country_code: &str) -> Option<Vec<String>>;
}

/// Stateless registry backed by a shared catalog.
#[derive(Debug, Clone, Default)]
pub struct CountryRegistry {
    catalog: Arc<CountryCatalog>,
}

impl CountryRegistry {
    pub fn new(catalog: Arc<CountryCatalog>) -> Self {
        Self { catalog }
    }
}

impl CountryManager for CountryRegistry {
    fn is_country_allowed(&self, country_code: Option<&str>) -> bool {
        match country_code {
            Some(code) => self.catalog.country(&code.to_lowercase()).is_some(),
            None => false,
        }
    }

    fn is_language_available(&self, country_code: Option<&str>, langcode: Option<&str>) -> bool {
        let (Some(country_code), Some(langcode)) = (country_code, langcode) else {
            return false;
        };
        if country_code.is_empty() || langcode.is_empty() {
            return false;
        }
        self.catalog
            .country(country_code)
            .is_some_and(|country| country.languages.iter().any(|l| l == langcode))
    }

    fn primary_langcode(&self, country_code: Option<&str>) -> Option<String> {
        self.catalog
            .country(country_code?)
            .and_then(|country| country.languages.first().cloned())
    }

    fn country_languages(&self, country_code: &str) -> Option<Vec<String>> {
        self.catalog
            .country(country_code)
            .map(|country| country.languages.clone())
    }
}
