//! HTTP wiring for the negotiation stages.
//!
//! Stages run as middleware in [`Stage::ordered`] order before route
//! dispatch: the request fallback may answer with a redirect, then the
//! country setter stores the request's [`CurrentCountry`] as an extension.

use crate::alias::{AliasLookup, FallbackAliasResolver, FallbackCandidates, SiteLanguageFallbacks};
use crate::catalog::{CountryCatalog, CountryPrefixes};
use crate::config::{Config, FallbackSettings};
use crate::current_country::CurrentCountry;
use crate::negotiation::{CountrySetter, Redirect, RequestFallback, Stage};
use crate::outbound::{CountrySwitcher, PrefixProcessor};
use crate::path;
use crate::registry::{CountryManager, CountryRegistry};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Shared, read-only state of the service.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CountryCatalog>,
    pub fallback: RequestFallback,
    pub setter: CountrySetter,
    pub processor: PrefixProcessor,
    pub aliases: Arc<dyn AliasLookup>,
    pub fallback_candidates: Arc<dyn FallbackCandidates>,
    pub settings: FallbackSettings,
    pub default_langcode: String,
}

impl AppState {
    pub fn new(config: &Config, catalog: CountryCatalog, aliases: Arc<dyn AliasLookup>) -> Self {
        let catalog = Arc::new(catalog);
        let manager: Arc<dyn CountryManager> = Arc::new(CountryRegistry::new(catalog.clone()));

        Self {
            fallback: RequestFallback::new(manager.clone(), config.fallbacks.use_request_fallback)
                .with_front_page(config.front_page.clone()),
            setter: CountrySetter::new(manager.clone()),
            processor: PrefixProcessor::new(
                manager,
                config.site_languages.clone(),
                config.admin_path_prefixes.clone(),
            ),
            aliases,
            fallback_candidates: Arc::new(SiteLanguageFallbacks::new(
                config.site_languages.clone(),
            )),
            settings: config.fallbacks,
            default_langcode: config
                .site_languages
                .first()
                .cloned()
                .unwrap_or_else(|| "en".to_string()),
            catalog,
        }
    }
}

/// What the dispatcher resolved for a request.
#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub country: Option<String>,
    pub cache_context: String,
    pub langcode: String,
    pub path: String,
    pub system_path: String,
    pub countries: CountrySwitcher,
}

/// Build the router with every negotiation stage in place.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/_prefixes", get(prefixes))
        .fallback(dispatch);

    // The last layer added runs first, so add stages lowest priority first.
    for stage in Stage::ordered().into_iter().rev() {
        router = match stage {
            Stage::RequestFallback => {
                router.layer(middleware::from_fn_with_state(state.clone(), request_fallback))
            }
            Stage::CountrySetter => {
                router.layer(middleware::from_fn_with_state(state.clone(), set_country))
            }
        };
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn request_fallback(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let negotiation = state.fallback.negotiate(request.uri().path());
    match negotiation.redirect() {
        Some(redirect) => redirect_response(redirect, negotiation.kills_page_cache()),
        None => next.run(request).await,
    }
}

async fn set_country(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let mut current = CurrentCountry::new();
    state.setter.apply(request.uri().path(), &mut current);
    debug!("Current country: {}", current.cache_context());
    request.extensions_mut().insert(current);
    next.run(request).await
}

fn redirect_response(redirect: &Redirect, kills_page_cache: bool) -> Response {
    let status =
        StatusCode::from_u16(redirect.status()).unwrap_or(StatusCode::MOVED_PERMANENTLY);
    let mut response = (status, [(header::LOCATION, redirect.location.clone())]).into_response();
    if kills_page_cache {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }
    response
}

async fn dispatch(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentCountry>,
    uri: Uri,
) -> (StatusCode, Json<PageInfo>) {
    let request_path = uri.path();
    let langcode = state
        .processor
        .negotiate_langcode(request_path)
        .unwrap_or_else(|| state.default_langcode.clone());
    let path = state.processor.process_inbound(request_path);

    let mut resolver = FallbackAliasResolver::new(
        state.aliases.as_ref(),
        state.fallback_candidates.as_ref(),
        state.settings.use_fallback_alias_manager,
    );
    let system_path = resolver.resolve_path(&path, &langcode);
    let countries = state
        .processor
        .country_switcher(&state.catalog, &path, &langcode, &current);

    // A prefix that survived inbound processing matches no route.
    let status = if path::has_valid_prefix(&path) {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };

    let info = PageInfo {
        country: current.get().map(str::to_string),
        cache_context: current.cache_context().to_string(),
        langcode,
        path,
        system_path,
        countries,
    };
    (status, Json(info))
}

async fn prefixes(State(state): State<AppState>) -> Json<Vec<CountryPrefixes>> {
    Json(state.catalog.prefixes())
}
