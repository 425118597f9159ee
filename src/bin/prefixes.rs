//! Print the language-country prefixes every country accepts.
//!
//! Usage:
//!   cargo run --bin prefixes                # Grouped by continent
//!   cargo run --bin prefixes -- --json      # Flat JSON list
//!
//! Optional:
//! - COUNTRY_TERMS_FILE (defaults to data/countries.json)
//! - CONTENT_LANGCODE (defaults to the first of SITE_LANGUAGES)

use anyhow::Result;
use language_country_negotiation::{
    catalog::{CountryCatalog, CountryPrefixes, JsonTermSource},
    config::Config,
};

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("language_country_negotiation=warn".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let catalog = CountryCatalog::load(
        &JsonTermSource::new(&config.country_terms_file),
        &config.content_langcode,
    );

    if std::env::args().any(|arg| arg == "--json") {
        println!("{}", serde_json::to_string_pretty(&catalog.prefixes())?);
        return Ok(());
    }

    if catalog.is_empty() {
        println!("No countries found in {}", config.country_terms_file);
        return Ok(());
    }

    let prefixes = catalog.prefixes();
    let groups = catalog.countries_by_continent();
    for group in &groups {
        println!("{}", group.label);
        for (code, _) in &group.countries {
            if let Some(country) = prefixes.iter().find(|p| &p.code == code) {
                print_country(country);
            }
        }
    }

    // Countries outside any published continent are still allowed.
    let ungrouped: Vec<&CountryPrefixes> = prefixes
        .iter()
        .filter(|p| {
            !groups
                .iter()
                .any(|g| g.countries.iter().any(|(code, _)| code == &p.code))
        })
        .collect();
    if !ungrouped.is_empty() {
        println!("Other");
        for country in ungrouped {
            print_country(country);
        }
    }
    Ok(())
}

fn print_country(country: &CountryPrefixes) {
    println!("  {:<24} {}", country.label, country.prefixes.join(", "));
}
