//! Language-country URL prefixes such as `/nl-be/` or `/fr-ch/`.
//!
//! # Architecture
//!
//! - `path`: Prefix grammar and pure path helpers
//! - `catalog`: Countries, their languages and continents, built from term records
//! - `registry`: Allow-list and language availability queries over the catalog
//! - `current_country`: Per-request country holder and its cache context
//! - `negotiation`: Request fallback redirects and the country setter stage
//! - `outbound`: Inbound prefix removal, outbound prefixes and switcher links
//! - `alias`: Path alias lookup with a language fallback chain
//! - `server`: axum router running the stages before dispatch

pub mod alias;
pub mod catalog;
pub mod config;
pub mod current_country;
pub mod error;
pub mod negotiation;
pub mod outbound;
pub mod path;
pub mod registry;
pub mod server;
