//! HTTP API Layer
//!
//! REST API for business partners using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: partner listing, group listing, partner creation, health
//! - **Middleware**: request ids, tracing, audit logging
//! - **DTOs**: request/response bodies of the JSON contract
//! - **Error Handling**: domain errors mapped to status codes in one place
//!
//! The router is generic over the partner store so tests can serve it from
//! the in-memory store.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(PartnerService::new(Arc::new(store), metadata), config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderName, Request},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_partner::{PartnerService, PartnerStore};

use crate::config::ApiConfig;
use crate::handlers::{health, partner};
use crate::middleware::{audit_middleware, REQUEST_ID_HEADER};

/// Application state shared across handlers
pub struct AppState<S: PartnerStore> {
    pub service: PartnerService<S>,
    pub config: Arc<ApiConfig>,
}

impl<S: PartnerStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: PartnerStore> AppState<S> {
    pub fn new(service: PartnerService<S>, config: ApiConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }
}

/// Creates the main API router
pub fn create_router<S: PartnerStore>(state: AppState<S>) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    // Public routes
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check::<S>));

    // Partner routes
    let api_routes = Router::new()
        .route(
            "/bpartners",
            get(partner::list_partners::<S>).post(partner::create_partner::<S>),
        )
        .route("/bpartners/groups", get(partner::list_groups::<S>))
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
