//! Inbound and outbound processing of language-country prefixes.
//!
//! Inbound, a valid prefix is removed before routing and its langcode can be
//! used as the negotiated language. Outbound, links get the
//! `{langcode}-{country}/` prefix when that combination is allowed.

use crate::catalog::CountryCatalog;
use crate::current_country::CurrentCountry;
use crate::path;
use crate::registry::CountryManager;
use serde::Serialize;
use std::sync::Arc;

/// Label shown in the country switcher without a current country.
pub const INTERNATIONAL_LABEL: &str = "International";

/// Options for building an outbound link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOptions {
    /// Target language; the current URL language when absent
    pub langcode: Option<String>,
    /// Target country; the current country when absent
    pub country_code: Option<String>,
}

impl LinkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn langcode(mut self, langcode: &str) -> Self {
        self.langcode = Some(langcode.to_string());
        self
    }

    pub fn country_code(mut self, country_code: &str) -> Self {
        self.country_code = Some(country_code.to_string());
        self
    }
}

/// One entry of the country switcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryLink {
    pub code: String,
    pub name: String,
    pub url: String,
    pub langcode: String,
    pub active: bool,
}

/// Country switcher data: the current country and links to all others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountrySwitcher {
    pub current_code: Option<String>,
    pub current_name: String,
    pub links: Vec<CountryLink>,
}

/// Prefix processing for inbound paths and outbound links.
#[derive(Clone)]
pub struct PrefixProcessor {
    manager: Arc<dyn CountryManager>,
    site_languages: Vec<String>,
    admin_prefixes: Vec<String>,
}

impl PrefixProcessor {
    pub fn new(
        manager: Arc<dyn CountryManager>,
        site_languages: Vec<String>,
        admin_prefixes: Vec<String>,
    ) -> Self {
        Self {
            manager,
            site_languages,
            admin_prefixes,
        }
    }

    fn is_site_language(&self, langcode: &str) -> bool {
        self.site_languages.iter().any(|l| l == langcode)
    }

    /// Admin paths keep the plain language prefix, never a country.
    pub fn is_admin_path(&self, path: &str) -> bool {
        self.admin_prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            path == prefix || path.starts_with(&format!("{}/", prefix))
        })
    }

    /// Langcode of the prefix when it is an enabled site language.
    ///
    /// `None` lets the next negotiator decide.
    pub fn negotiate_langcode(&self, request_path: &str) -> Option<String> {
        path::langcode_from_path(request_path).filter(|langcode| self.is_site_language(langcode))
    }

    /// Remove the prefix when it names an allowed combination.
    pub fn process_inbound(&self, request_path: &str) -> String {
        let langcode = path::langcode_from_path(request_path);
        let country_code = path::country_code_from_path(request_path);
        if self
            .manager
            .is_language_available(country_code.as_deref(), langcode.as_deref())
        {
            path::remove_valid_prefix(request_path)
        } else {
            request_path.to_string()
        }
    }

    /// The `{langcode}-{country}/` prefix for a link, if one applies.
    pub fn outbound_prefix(
        &self,
        link_path: &str,
        options: &LinkOptions,
        current_langcode: &str,
        current: &CurrentCountry,
    ) -> Option<String> {
        if self.is_admin_path(link_path) {
            return None;
        }

        let langcode = options.langcode.as_deref().unwrap_or(current_langcode);
        if !self.is_site_language(langcode) {
            return None;
        }

        let country_code = options.country_code.as_deref().or(current.get())?;
        if country_code.is_empty()
            || !self
                .manager
                .is_language_available(Some(country_code), Some(langcode))
        {
            return None;
        }

        Some(format!("{}-{}/", langcode, country_code))
    }

    /// Build a link path, prefixed when a prefix applies.
    pub fn process_outbound(
        &self,
        link_path: &str,
        options: &LinkOptions,
        current_langcode: &str,
        current: &CurrentCountry,
    ) -> String {
        let Some(prefix) = self.outbound_prefix(link_path, options, current_langcode, current)
        else {
            return link_path.to_string();
        };

        let rest = link_path.trim_start_matches('/');
        if rest.is_empty() {
            format!("/{}", prefix.trim_end_matches('/'))
        } else {
            format!("/{}{}", prefix, rest)
        }
    }

    /// Order language switch links by the current country's languages.
    ///
    /// Without a current country the links are returned as they are. With
    /// one, only the country's languages remain, in its editorial order.
    pub fn sort_switch_links<T>(
        &self,
        links: Vec<(String, T)>,
        current: &CurrentCountry,
    ) -> Vec<(String, T)> {
        let Some(country_code) = current.get() else {
            return links;
        };
        let Some(languages) = self.manager.country_languages(country_code) else {
            return Vec::new();
        };

        let mut remaining = links;
        let mut sorted = Vec::with_capacity(languages.len());
        for langcode in &languages {
            if let Some(position) = remaining.iter().position(|(code, _)| code == langcode) {
                sorted.push(remaining.swap_remove(position));
            }
        }
        sorted
    }

    /// Links to the current page in every allowed country.
    ///
    /// The current language is kept where the target country offers it,
    /// otherwise the target's primary language is used. Countries whose target
    /// language is not a site language are skipped.
    pub fn country_switcher(
        &self,
        catalog: &CountryCatalog,
        link_path: &str,
        current_langcode: &str,
        current: &CurrentCountry,
    ) -> CountrySwitcher {
        let mut links = Vec::new();
        let mut current_name = None;

        for country in catalog.iter() {
            let active = current.get() == Some(country.code.as_str());
            if active {
                current_name = Some(country.label.clone());
            }

            let langcode = if self
                .manager
                .is_language_available(Some(&country.code), Some(current_langcode))
            {
                Some(current_langcode.to_string())
            } else {
                self.manager.primary_langcode(Some(&country.code))
            };
            let Some(langcode) = langcode.filter(|l| self.is_site_language(l)) else {
                continue;
            };

            let options = LinkOptions::new()
                .langcode(&langcode)
                .country_code(&country.code);
            links.push(CountryLink {
                code: country.code.clone(),
                name: country.label.clone(),
                url: self.process_outbound(link_path, &options, current_langcode, current),
                langcode,
                active,
            });
        }

        CountrySwitcher {
            current_code: current.get().map(str::to_string),
            current_name: current_name.unwrap_or_else(|| INTERNATIONAL_LABEL.to_string()),
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::with_continents;
    use crate::registry::CountryRegistry;

    fn catalog() -> Arc<CountryCatalog> {
        Arc::new(CountryCatalog::build(&with_continents(), "en"))
    }

    fn processor() -> PrefixProcessor {
        let languages = ["en", "de", "fr", "nl"].iter().map(|l| l.to_string()).collect();
        PrefixProcessor::new(
            Arc::new(CountryRegistry::new(catalog())),
            languages,
            vec!["/admin".to_string()],
        )
    }

    fn country(code: &str) -> CurrentCountry {
        let mut current = CurrentCountry::new();
        current.set(code);
        current
    }

    // ==================== Inbound Tests ====================

    #[test]
    fn test_process_inbound() {
        let processor = processor();
        assert_eq!(processor.process_inbound("/nl-be/test"), "/test");
        assert_eq!(processor.process_inbound("/de-de"), "/");
        assert_eq!(processor.process_inbound("/en-be/test"), "/en-be/test");
        assert_eq!(processor.process_inbound("/zh-cn/test"), "/zh-cn/test");
        assert_eq!(processor.process_inbound("/test"), "/test");
    }

    #[test]
    fn test_negotiate_langcode() {
        let processor = processor();
        assert_eq!(processor.negotiate_langcode("/nl-be/test").as_deref(), Some("nl"));
        // Langcode only has to be a site language here.
        assert_eq!(processor.negotiate_langcode("/fr-us").as_deref(), Some("fr"));
        assert_eq!(processor.negotiate_langcode("/zh-cn"), None);
        assert_eq!(processor.negotiate_langcode("/de/test"), None);
    }

    // ==================== Outbound Tests ====================

    #[test]
    fn test_outbound_uses_current_country() {
        let processor = processor();
        let options = LinkOptions::new();
        assert_eq!(
            processor.process_outbound("/test", &options, "nl", &country("be")),
            "/nl-be/test"
        );
        assert_eq!(
            processor.process_outbound("/", &options, "fr", &country("be")),
            "/fr-be"
        );
    }

    #[test]
    fn test_outbound_explicit_country_wins() {
        let processor = processor();
        let options = LinkOptions::new().country_code("de");
        assert_eq!(
            processor.process_outbound("/test", &options, "de", &country("be")),
            "/de-de/test"
        );
    }

    #[test]
    fn test_outbound_without_country_is_unprefixed() {
        let processor = processor();
        assert_eq!(
            processor.process_outbound("/test", &LinkOptions::new(), "en", &CurrentCountry::new()),
            "/test"
        );
    }

    #[test]
    fn test_outbound_unavailable_language_is_unprefixed() {
        let processor = processor();
        let options = LinkOptions::new().langcode("en");
        assert_eq!(
            processor.outbound_prefix("/test", &options, "nl", &country("be")),
            None
        );
    }

    #[test]
    fn test_outbound_non_site_language_is_unprefixed() {
        let processor = processor();
        let options = LinkOptions::new().langcode("zh-hans").country_code("cn");
        assert_eq!(processor.outbound_prefix("/test", &options, "en", &CurrentCountry::new()), None);
    }

    #[test]
    fn test_outbound_admin_paths_are_exempt() {
        let processor = processor();
        let options = LinkOptions::new();
        assert_eq!(
            processor.process_outbound("/admin/content", &options, "nl", &country("be")),
            "/admin/content"
        );
        assert_eq!(
            processor.process_outbound("/admin", &options, "nl", &country("be")),
            "/admin"
        );
        assert_eq!(
            processor.process_outbound("/administrator", &options, "nl", &country("be")),
            "/nl-be/administrator"
        );
    }

    // ==================== Switch Link Tests ====================

    #[test]
    fn test_sort_switch_links() {
        let processor = processor();
        let links = vec![
            ("en".to_string(), 1),
            ("de".to_string(), 2),
            ("fr".to_string(), 3),
            ("nl".to_string(), 4),
        ];

        let unsorted = processor.sort_switch_links(links.clone(), &CurrentCountry::new());
        assert_eq!(unsorted, links);

        let sorted = processor.sort_switch_links(links.clone(), &country("be"));
        let codes: Vec<&str> = sorted.iter().map(|(code, _)| code.as_str()).collect();
        assert_eq!(codes, vec!["nl", "fr", "de"]);

        assert!(processor.sort_switch_links(links, &country("xx")).is_empty());
    }

    // ==================== Country Switcher Tests ====================

    #[test]
    fn test_country_switcher() {
        let processor = processor();
        let switcher = processor.country_switcher(&catalog(), "/test", "fr", &country("be"));

        assert_eq!(switcher.current_code.as_deref(), Some("be"));
        assert_eq!(switcher.current_name, "Belgium");

        let urls: Vec<(&str, &str)> = switcher
            .links
            .iter()
            .map(|link| (link.code.as_str(), link.url.as_str()))
            .collect();
        // Countries without French link to their primary language.
        assert_eq!(
            urls,
            vec![
                ("de", "/de-de/test"),
                ("be", "/fr-be/test"),
                ("us", "/en-us/test"),
                ("kr", "/en-kr/test"),
                ("ma", "/fr-ma/test"),
            ]
        );
        assert!(switcher.links[1].active);
        assert!(!switcher.links[0].active);
    }

    #[test]
    fn test_country_switcher_international() {
        let processor = processor();
        let switcher = processor.country_switcher(&catalog(), "/", "en", &CurrentCountry::new());
        assert_eq!(switcher.current_code, None);
        assert_eq!(switcher.current_name, INTERNATIONAL_LABEL);
        assert_eq!(switcher.links[1].url, "/nl-be");
    }

    #[test]
    fn test_country_switcher_skips_non_site_languages() {
        let records = vec![crate::catalog::TermRecord::country("1", "jp", "Japan", &["ja"])];
        let catalog = Arc::new(CountryCatalog::build(&records, "en"));
        let processor = PrefixProcessor::new(
            Arc::new(CountryRegistry::new(catalog.clone())),
            vec!["en".to_string()],
            Vec::new(),
        );
        let switcher = processor.country_switcher(&catalog, "/", "en", &CurrentCountry::new());
        assert!(switcher.links.is_empty());
    }
}
