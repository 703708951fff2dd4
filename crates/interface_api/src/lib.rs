//! HTTP API Layer
//!
//! This crate provides the REST API for the inter-company payables engine
//! using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Ledger, liability, settlement and balance endpoints
//! - **Middleware**: Request ids and request logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(engine, health, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use axum::http::HeaderName;
use core_kernel::HealthCheckable;
use domain_payables::PayablesEngine;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{balances, health, ledger, liabilities, settlements};
use crate::middleware::{request_logging, REQUEST_ID_HEADER};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PayablesEngine>,
    pub health: Arc<dyn HealthCheckable>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(engine: PayablesEngine, health: Arc<dyn HealthCheckable>, config: ApiConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            health,
            config,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let vendor_routes = Router::new()
        .route("/:id/ledger", get(ledger::get_vendor_ledger));

    let invoice_routes = Router::new().route(
        "/:id/liability",
        get(liabilities::preview_liability).post(liabilities::sync_liability),
    );

    let settlement_routes = Router::new()
        .route("/", post(settlements::create_settlement))
        .route("/preview", post(settlements::preview_settlement));

    let api_routes = Router::new()
        .nest("/vendors", vendor_routes)
        .nest("/invoices", invoice_routes)
        .nest("/settlements", settlement_routes)
        .route("/balances", get(balances::get_balances));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(request_logging))
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
