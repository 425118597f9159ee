//! Country catalog: the allow-list of language-country combinations.
//!
//! The catalog is built in a single pass from hierarchical term records.
//! Continents are root records carrying the `und` code; countries are records
//! with a real code. A country is part of the allow-list iff it is published
//! and has a non-empty code, whatever state its continent is in. Only the
//! by-continent view hides countries whose continent is not published.

use crate::error::{NegotiationError, NegotiationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Code marking a term as a continent rather than a country.
pub const CONTINENT_CODE: &str = "und";

/// A raw record from the country vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRecord {
    /// Opaque term ID, referenced by child terms
    pub id: String,

    /// Two-letter country code, or `und` for a continent
    #[serde(default)]
    pub code: Option<String>,

    /// Referenced langcodes in editorial order (first is primary)
    #[serde(default)]
    pub languages: Vec<String>,

    /// ID of the parent term, if any
    #[serde(default)]
    pub parent: Option<String>,

    #[serde(default = "default_published")]
    pub published: bool,

    /// Default label
    pub label: String,

    /// Translated labels keyed by langcode
    #[serde(default)]
    pub translations: HashMap<String, String>,
}

fn default_published() -> bool {
    true
}

impl TermRecord {
    /// Create a published country record.
    pub fn country(id: &str, code: &str, label: &str, languages: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            code: Some(code.to_string()),
            languages: languages.iter().map(|l| l.to_string()).collect(),
            parent: None,
            published: true,
            label: label.to_string(),
            translations: HashMap::new(),
        }
    }

    /// Create a published continent record.
    pub fn continent(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            code: Some(CONTINENT_CODE.to_string()),
            languages: Vec::new(),
            parent: None,
            published: true,
            label: label.to_string(),
            translations: HashMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn with_published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    pub fn with_translation(mut self, langcode: &str, label: &str) -> Self {
        self.translations
            .insert(langcode.to_string(), label.to_string());
        self
    }

    /// Label in the given content language, or the default label.
    pub fn label_for(&self, langcode: &str) -> &str {
        self.translations
            .get(langcode)
            .map(String::as_str)
            .unwrap_or(&self.label)
    }

    fn is_continent(&self) -> bool {
        self.code.as_deref() == Some(CONTINENT_CODE)
    }

    /// Lowercased country code, if this record describes a country.
    fn country_code(&self) -> Option<String> {
        let code = self.code.as_deref()?.trim().to_lowercase();
        if code.is_empty() || code == CONTINENT_CODE {
            None
        } else {
            Some(code)
        }
    }
}

/// Source of country term records.
pub trait TermSource {
    fn load_terms(&self) -> NegotiationResult<Vec<TermRecord>>;
}

impl TermSource for Vec<TermRecord> {
    fn load_terms(&self) -> NegotiationResult<Vec<TermRecord>> {
        Ok(self.clone())
    }
}

/// Term records stored as a JSON array in a file.
#[derive(Debug, Clone)]
pub struct JsonTermSource {
    path: PathBuf,
}

impl JsonTermSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TermSource for JsonTermSource {
    fn load_terms(&self) -> NegotiationResult<Vec<TermRecord>> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| NegotiationError::Read {
                path: self.path.clone(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|source| NegotiationError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

/// An allowed country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Country {
    pub code: String,
    pub label: String,
    pub parent_id: Option<String>,
    pub languages: Vec<String>,
}

/// A published continent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Continent {
    pub id: String,
    pub label: String,
}

/// A continent with the labels of its allowed countries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContinentGroup {
    pub id: String,
    pub label: String,
    pub countries: Vec<(String, String)>,
}

/// The computed `langcode-country` prefixes of one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryPrefixes {
    pub code: String,
    pub label: String,
    pub prefixes: Vec<String>,
}

/// Immutable snapshot of the allowed countries and their languages.
///
/// Countries keep the order of the records they were built from. The
/// snapshot can be shared read-only between requests.
#[derive(Debug, Clone, Default)]
pub struct CountryCatalog {
    countries: Vec<Country>,
    index: HashMap<String, usize>,
    continents: Vec<Continent>,
}

impl CountryCatalog {
    /// A catalog without any country.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the catalog from term records, resolving labels for `content_langcode`.
    pub fn build(records: &[TermRecord], content_langcode: &str) -> Self {
        let mut catalog = Self::empty();

        for record in records.iter().filter(|record| record.published) {
            if record.is_continent() {
                if record.parent.is_none() {
                    catalog.continents.push(Continent {
                        id: record.id.clone(),
                        label: record.label_for(content_langcode).to_string(),
                    });
                }
                continue;
            }

            let Some(code) = record.country_code() else {
                continue;
            };

            let country = Country {
                code: code.clone(),
                label: record.label_for(content_langcode).to_string(),
                parent_id: record.parent.clone(),
                languages: record.languages.clone(),
            };

            match catalog.index.get(&code) {
                Some(&position) => catalog.countries[position] = country,
                None => {
                    catalog.index.insert(code, catalog.countries.len());
                    catalog.countries.push(country);
                }
            }
        }

        debug!(
            "Built country catalog with {} countries and {} continents",
            catalog.countries.len(),
            catalog.continents.len()
        );

        catalog
    }

    /// Load records from `source` and build the catalog.
    ///
    /// An unavailable source is logged and yields an empty catalog, which
    /// means "no countries configured".
    pub fn load(source: &dyn TermSource, content_langcode: &str) -> Self {
        match source.load_terms() {
            Ok(records) => {
                let catalog = Self::build(&records, content_langcode);
                info!(
                    "Loaded {} allowed countries from {} term records",
                    catalog.len(),
                    records.len()
                );
                catalog
            }
            Err(e) => {
                error!(
                    "Country terms unavailable, continuing without countries: {:#}",
                    anyhow::Error::new(e)
                );
                Self::empty()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    /// Look up an allowed country by its exact (lowercase) code.
    pub fn country(&self, code: &str) -> Option<&Country> {
        self.index.get(code).map(|&position| &self.countries[position])
    }

    /// Allowed countries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Country> {
        self.countries.iter()
    }

    /// Country code to label list.
    pub fn countries(&self) -> Vec<(&str, &str)> {
        self.countries
            .iter()
            .map(|country| (country.code.as_str(), country.label.as_str()))
            .collect()
    }

    /// Country code to ordered langcodes list.
    pub fn country_languages(&self) -> Vec<(&str, &[String])> {
        self.countries
            .iter()
            .map(|country| (country.code.as_str(), country.languages.as_slice()))
            .collect()
    }

    /// Published continents with their allowed countries.
    ///
    /// Countries whose parent is not a published continent are left out of
    /// this view only.
    pub fn countries_by_continent(&self) -> Vec<ContinentGroup> {
        let mut groups: Vec<ContinentGroup> = self
            .continents
            .iter()
            .map(|continent| ContinentGroup {
                id: continent.id.clone(),
                label: continent.label.clone(),
                countries: Vec::new(),
            })
            .collect();

        for country in &self.countries {
            let Some(parent_id) = country.parent_id.as_deref() else {
                continue;
            };
            if let Some(group) = groups.iter_mut().find(|group| group.id == parent_id) {
                group
                    .countries
                    .push((country.code.clone(), country.label.clone()));
            }
        }

        groups
    }

    /// Computed path prefixes for every allowed country.
    pub fn prefixes(&self) -> Vec<CountryPrefixes> {
        self.countries
            .iter()
            .map(|country| CountryPrefixes {
                code: country.code.clone(),
                label: country.label.clone(),
                prefixes: country
                    .languages
                    .iter()
                    .map(|langcode| format!("{}-{}", langcode, country.code))
                    .collect(),
            })
            .collect()
    }
}

/// Term data used across the crate's tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::TermRecord;

    /// Countries only, no continents.
    pub fn without_continents() -> Vec<TermRecord> {
        vec![
            TermRecord::country("2", "de", "Germany", &["de"]),
            TermRecord::country("3", "be", "Belgium", &["nl", "fr", "de"]),
            TermRecord::country("5", "us", "United States of America", &["en"]),
            TermRecord::country("7", "kr", "South Korea", &["en"]),
            TermRecord::country("8", "cn", "China", &["zh-hans"]).with_published(false),
            TermRecord::country("10", "eg", "Egypt", &["en"]).with_published(false),
            TermRecord::country("11", "ma", "Morocco", &["fr"]),
        ]
    }

    /// Countries grouped in continents; Africa is unpublished.
    pub fn with_continents() -> Vec<TermRecord> {
        vec![
            TermRecord::continent("1", "Europe"),
            TermRecord::country("2", "de", "Germany", &["de"]).with_parent("1"),
            TermRecord::country("3", "be", "Belgium", &["nl", "fr", "de"]).with_parent("1"),
            TermRecord::continent("4", "North America"),
            TermRecord::country("5", "us", "United States of America", &["en"]).with_parent("4"),
            TermRecord::continent("6", "Asia"),
            TermRecord::country("7", "kr", "South Korea", &["en"]).with_parent("6"),
            TermRecord::country("8", "cn", "China", &["zh-hans"])
                .with_parent("6")
                .with_published(false),
            TermRecord::continent("9", "Africa").with_published(false),
            TermRecord::country("10", "eg", "Egypt", &["en"])
                .with_parent("9")
                .with_published(false),
            TermRecord::country("11", "ma", "Morocco", &["fr"]).with_parent("9"),
        ]
    }
}
