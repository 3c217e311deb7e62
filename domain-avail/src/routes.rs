//! HTTP surface: one read-only endpoint.
//!
//! `GET /?domains=a.com;b.org` answers with the JSON result batch. Input
//! errors are answered with `400` and a plain-text reason.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use domain_avail_lib::DomainChecker;
use serde::Deserialize;
use tracing::debug;

/// Query string of the check endpoint.
#[derive(Debug, Deserialize)]
pub struct DomainsQuery {
    /// `;`-separated candidate domains
    pub domains: Option<String>,
}

/// Build the service router around a shared checker.
pub fn router(checker: DomainChecker) -> Router {
    Router::new()
        .route("/", get(check_domains))
        .with_state(checker)
}

async fn check_domains(
    State(checker): State<DomainChecker>,
    Query(query): Query<DomainsQuery>,
) -> Response {
    match checker.check_param(query.domains.as_deref()).await {
        Ok(results) => Json(results).into_response(),
        Err(e) if e.is_input_error() => {
            debug!(error = %e, "Rejected request");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
