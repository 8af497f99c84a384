//! Find Routes
//!
//! - GET|POST /metrics/find - Expand a metric path pattern into tree nodes

use axum::{
    extract::{Form, Query, State},
    http::{header, Method},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::params::FormParams;
use crate::api::state::AppState;
use crate::graphite::write_find_response;

/// GET|POST /metrics/find
///
/// Reads the `query` parameter (empty when absent) and answers with the
/// matching nodes as Graphite's tree JSON.
pub async fn find_metrics(
    State(state): State<Arc<AppState>>,
    method: Method,
    Query(query): Query<Vec<(String, String)>>,
    form: Option<Form<Vec<(String, String)>>>,
) -> ApiResult<Response> {
    let params = FormParams::from_request(&method, query, form.map(|Form(body)| body));
    let pattern = params.get("query").unwrap_or_default().to_string();

    let fetcher = Arc::clone(&state.fetcher);
    let lookup = pattern.clone();
    let nodes = tokio::task::spawn_blocking(move || fetcher.find(&lookup))
        .await
        .map_err(|e| ApiError::Internal(format!("find task failed: {}", e)))?;

    tracing::debug!(query = %pattern, nodes = nodes.len(), "Find complete");

    let mut body = Vec::new();
    write_find_response(&mut body, &nodes)?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
