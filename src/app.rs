use std::sync::Arc;

use axum::http::Method;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{AuthzMode, FilterRegistry, PathPattern};
use crate::config::Settings;
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::middleware;
use crate::models::PathTable;
use crate::policies;
use crate::routes::{health, resources};

/// Root of the resource API; every path beneath it needs an authorization policy
pub const API_ROOT: &str = "/v1";

#[derive(Clone)]
pub struct AppState {
    pub jwt: Arc<JwtConfig>,
    pub filters: Arc<FilterRegistry>,
    pub authz_mode: AuthzMode,
    pub api_root: PathPattern,
}

impl AppState {
    pub fn new(jwt: JwtConfig, filters: FilterRegistry, authz_mode: AuthzMode) -> Self {
        Self {
            jwt: Arc::new(jwt),
            filters: Arc::new(filters),
            authz_mode,
            api_root: PathPattern::recursive(API_ROOT),
        }
    }
}

/// Builds the default filter registry for `settings`.
pub fn default_filters(settings: &Settings) -> Result<FilterRegistry, AppError> {
    let mut registry = FilterRegistry::new(PathTable::service_manager());
    policies::register_defaults(&mut registry, &settings.tenant)?;
    Ok(registry)
}

pub fn create_app(settings: &Settings, jwt: JwtConfig) -> Result<Router, AppError> {
    let filters = default_filters(settings)?;
    if settings.authz_mode == AuthzMode::Off {
        tracing::warn!("authorization checks are disabled (AUTHZ_MODE=off)");
    }
    let state = AppState::new(jwt, filters, settings.authz_mode);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    // merged rather than nested: filters match against the full request path
    let resource_routes = Router::new()
        .route("/v1/:resource", get(resources::list).post(resources::create))
        .route(
            "/v1/:resource/:id",
            get(resources::get).patch(resources::update).delete(resources::delete),
        )
        // outermost layer runs first: identify, then authorize
        .route_layer(from_fn_with_state(state.clone(), middleware::authorize))
        .route_layer(from_fn_with_state(state.clone(), middleware::identify));

    let router = Router::new()
        .route("/api/health", get(health::health))
        .merge(resource_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
