//! Luxe storefront library.
//!
//! This crate provides the storefront REST API as a library, allowing it to
//! be tested in-process and reused by the CLI.
//!
//! # Architecture
//!
//! - Axum JSON API under `/api`, bearer-token authentication
//! - Services ([`services`]) hold the business rules and work against
//!   repository traits ([`db`])
//! - Repositories are in-memory or `PostgreSQL`, chosen at startup

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    extract::Request,
    http::Response,
    middleware::from_fn,
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Build the full application: routes plus the middleware stack.
///
/// Layer order, outermost first: Sentry hub and transaction, request span,
/// request ID, security headers.
pub fn app(state: AppState) -> Router {
    let auth_rate_limit = state.config().auth_rate_limit;

    routes::routes(auth_rate_limit)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
